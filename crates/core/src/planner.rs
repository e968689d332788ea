// RegForge - Register File Generator
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Automatic address assignment.

use crate::diagnostics::{DiagnosticKind, Diagnostics, Location};
use regforge_ir::RegisterFileConfig;
use std::collections::HashSet;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PlanError {
    #[error("register '{register}' address {address:#x} is not aligned to {alignment} bytes")]
    Misaligned {
        register: String,
        address: u64,
        alignment: u64,
    },
    #[error("register '{register}' would be placed at {address:#x}, which is already in use")]
    AddressConflict { register: String, address: u64 },
    #[error("no free {alignment}-byte slot left for register '{register}'")]
    Exhausted { register: String, alignment: u64 },
}

impl PlanError {
    pub fn register(&self) -> &str {
        match self {
            PlanError::Misaligned { register, .. }
            | PlanError::AddressConflict { register, .. }
            | PlanError::Exhausted { register, .. } => register,
        }
    }

    /// Records the failure as an error diagnostic.
    pub fn report(&self, diags: &mut Diagnostics) {
        let kind = match self {
            PlanError::Misaligned { .. } => DiagnosticKind::MisalignedAddress,
            PlanError::AddressConflict { .. } => DiagnosticKind::AddressConflict,
            PlanError::Exhausted { .. } => DiagnosticKind::AddressOutOfRange,
        };
        diags.error(kind, Location::register(self.register()), self.to_string());
    }
}

/// Assigns addresses to registers that do not have one.
///
/// Slots are `max(4, data_width / 8)` bytes apart, starting at the configured
/// base address and skipping addresses already taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressPlanner {
    alignment: u64,
    base_address: u64,
}

impl AddressPlanner {
    pub fn new(config: &RegisterFileConfig) -> Self {
        Self {
            alignment: u64::from((config.data_width / 8).max(4)),
            base_address: config.base_address,
        }
    }

    pub fn alignment(&self) -> u64 {
        self.alignment
    }

    /// Returns a copy of `config` where every register has an address.
    ///
    /// Registers that already have an address keep it; calling this on its own
    /// output returns an identical configuration.
    pub fn assign(&self, config: &RegisterFileConfig) -> Result<RegisterFileConfig, PlanError> {
        let mut planned = config.clone();
        let mut used = HashSet::new();
        for reg in &planned.registers {
            if let Some(address) = reg.address {
                if address % self.alignment != 0 {
                    return Err(PlanError::Misaligned {
                        register: reg.name.clone(),
                        address,
                        alignment: self.alignment,
                    });
                }
                used.insert(address);
            }
        }

        let mut cursor = align_up(self.base_address, self.alignment);
        for reg in planned.registers.iter_mut().filter(|r| r.address.is_none()) {
            let exhausted = || PlanError::Exhausted {
                register: reg.name.clone(),
                alignment: self.alignment,
            };
            let mut slot = cursor.ok_or_else(exhausted)?;
            while used.contains(&slot) {
                slot = slot.checked_add(self.alignment).ok_or_else(exhausted)?;
            }
            if !used.insert(slot) {
                return Err(PlanError::AddressConflict {
                    register: reg.name.clone(),
                    address: slot,
                });
            }
            debug!(register = %reg.name, address = slot, "assigned address");
            reg.address = Some(slot);
            cursor = slot.checked_add(self.alignment);
        }
        Ok(planned)
    }
}

fn align_up(value: u64, alignment: u64) -> Option<u64> {
    let rem = value % alignment;
    if rem == 0 {
        Some(value)
    } else {
        value.checked_add(alignment - rem)
    }
}
