// RegForge - Register File Generator
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Semantic core of RegForge: everything between a parsed configuration and
//! the emitters.

pub mod bus;
pub mod diagnostics;
pub mod layout;
pub mod model;
pub mod planner;
pub mod validator;

pub use bus::{adapter_for, BusAdapter};
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Location, Severity};
pub use layout::FileLayout;
pub use model::{BusResponse, RegisterFileModel};
pub use planner::{AddressPlanner, PlanError};
pub use validator::{validate, Validator};
