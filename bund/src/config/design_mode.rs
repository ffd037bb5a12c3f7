use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::BundError;

/// how the target crest elevation of each bund is specified.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DesignMode {
    /// absolute crest elevation read from a per-feature attribute
    ConstantAbsolute,
    /// crest elevation varies linearly from a start to an end height along the line
    Gradient,
    /// crest sits a per-feature height above the terrain under the line
    HagField,
    /// crest sits a fixed height above the terrain under the line
    HagValue,
}

impl DesignMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DesignMode::ConstantAbsolute => "ConstantAbsolute",
            DesignMode::Gradient => "Gradient",
            DesignMode::HagField => "HagField",
            DesignMode::HagValue => "HagValue",
        }
    }
}

impl Display for DesignMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DesignMode {
    type Err = BundError;

    /// accepts the variant names in any case or separator style, as well as the
    /// dialog labels ("Use Field", "Use Start/End", ...).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "constantabsolute" | "usefield" => Ok(DesignMode::ConstantAbsolute),
            "gradient" | "usestartend" => Ok(DesignMode::Gradient),
            "hagfield" | "usehagfield" => Ok(DesignMode::HagField),
            "hagvalue" | "usehagvalue" => Ok(DesignMode::HagValue),
            _ => Err(BundError::UnknownDesignMode(s.to_string())),
        }
    }
}
