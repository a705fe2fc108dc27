//! Carrier categories a dispatch can go out through.

use std::{fmt, str::FromStr};

/// The carrier or sales channel handling a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchType {
    MercadoLibre,
    Flex,
    Bluexpress,
}

/// Rejection for a dispatch type outside the fixed set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown dispatch type '{0}' (expected MercadoLibre, Flex or Bluexpress)")]
pub struct UnknownDispatchType(pub String);

impl DispatchType {
    /// Every dispatch type, in menu order.
    pub const ALL: [Self; 3] = [Self::MercadoLibre, Self::Flex, Self::Bluexpress];

    /// The name shown to operators and written to the data file.
    pub fn name(self) -> &'static str {
        match self {
            Self::MercadoLibre => "MercadoLibre",
            Self::Flex => "Flex",
            Self::Bluexpress => "Bluexpress",
        }
    }

    /// The number that selects this type in the interactive menu.
    pub fn menu_choice(self) -> &'static str {
        match self {
            Self::MercadoLibre => "1",
            Self::Flex => "2",
            Self::Bluexpress => "3",
        }
    }
}

impl fmt::Display for DispatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// Accepts a type name (case-insensitive) or its menu number.
impl FromStr for DispatchType {
    type Err = UnknownDispatchType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(s) || t.menu_choice() == s)
            .ok_or_else(|| UnknownDispatchType(s.to_string()))
    }
}
