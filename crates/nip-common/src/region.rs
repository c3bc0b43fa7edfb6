use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::NipError;

/// Regulatory region a panel is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Region {
    #[default]
    #[serde(rename = "AU")]
    Au,
    #[serde(rename = "US")]
    Us,
}

impl Region {
    pub const ALL: [Region; 2] = [Region::Au, Region::Us];

    /// Upper-case code, as shown to users.
    pub fn code(self) -> &'static str {
        match self {
            Region::Au => "AU",
            Region::Us => "US",
        }
    }

    /// Lower-case directory name under the HTML store.
    pub fn dir_name(self) -> &'static str {
        match self {
            Region::Au => "au",
            Region::Us => "us",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Region {
    type Err = NipError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AU" => Ok(Region::Au),
            "US" => Ok(Region::Us),
            _ => Err(NipError::InvalidRegion(s.to_owned())),
        }
    }
}
