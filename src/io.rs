// SPDX-License-Identifier: Apache-2.0

use std::fmt;

use serde::{Deserialize, Serialize};

/// Direction of a port, as seen from inside the module that declares it.
///
/// Exactly two values; bidirectional (`inout`) ports are outside the
/// supported subset and are rejected during extraction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortDir {
    Input,
    Output,
}

impl PortDir {
    /// Returns the direction with input and output swapped.
    pub fn flip(&self) -> PortDir {
        match self {
            PortDir::Input => PortDir::Output,
            PortDir::Output => PortDir::Input,
        }
    }

    pub fn is_input(&self) -> bool {
        matches!(self, PortDir::Input)
    }

    pub fn is_output(&self) -> bool {
        matches!(self, PortDir::Output)
    }
}

impl fmt::Display for PortDir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortDir::Input => write!(f, "input"),
            PortDir::Output => write!(f, "output"),
        }
    }
}

/// Storage class of a port declaration.
///
/// `Wire` is the default. A port becomes `Reg` through the keyword on its
/// declaration or through a standalone `reg` declaration in the module body;
/// once `Reg`, it is never downgraded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageClass {
    #[default]
    Wire,
    Reg,
}

/// A single port on a module: direction, storage class, and bit width.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModulePort {
    pub direction: PortDir,
    #[serde(default)]
    pub storage: StorageClass,
    pub width: usize,
}

impl ModulePort {
    /// Creates a port with the default (`Wire`) storage class. Panics if
    /// `width` is zero.
    pub fn new(direction: PortDir, width: usize) -> ModulePort {
        assert!(width >= 1, "Port width must be at least 1.");
        ModulePort {
            direction,
            storage: StorageClass::default(),
            width,
        }
    }
}
