use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// User-facing, type-scoped record reference.
///
/// Either a plain integer (`12`) or an integer with a decimal sub-reference
/// (`12.3`). `12.3` and `12` are distinct refs. Ordering is by the integer
/// part first, with the plain integer sorting before its sub-references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RefRepr", into = "RefRepr")]
pub struct Ref {
    major: u32,
    minor: Option<u32>,
}

impl Ref {
    pub fn new(major: u32) -> Self {
        Self { major, minor: None }
    }

    pub fn with_sub(major: u32, minor: u32) -> Self {
        Self {
            major,
            minor: Some(minor),
        }
    }

    pub fn major(self) -> u32 {
        self.major
    }

    /// True for refs without a decimal part.
    pub fn is_integer(self) -> bool {
        self.minor.is_none()
    }
}

impl From<u32> for Ref {
    fn from(major: u32) -> Self {
        Self::new(major)
    }
}

impl fmt::Display for Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.minor {
            Some(minor) => write!(f, "{}.{}", self.major, minor),
            None => write!(f, "{}", self.major),
        }
    }
}

/// Error returned when a string is not a valid ref.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRefError(String);

impl fmt::Display for ParseRefError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid reference '{}'", self.0)
    }
}

impl std::error::Error for ParseRefError {}

impl FromStr for Ref {
    type Err = ParseRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseRefError(s.to_string());
        let digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
        match s.split_once('.') {
            Some((major, minor)) => {
                if !digits(major) || !digits(minor) {
                    return Err(err());
                }
                Ok(Ref::with_sub(
                    major.parse().map_err(|_| err())?,
                    minor.parse().map_err(|_| err())?,
                ))
            }
            None => {
                if !digits(s) {
                    return Err(err());
                }
                Ok(Ref::new(s.parse().map_err(|_| err())?))
            }
        }
    }
}

/// Serialized form: plain refs stay JSON numbers, sub-refs become strings.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RefRepr {
    Int(u32),
    Text(String),
}

impl TryFrom<RefRepr> for Ref {
    type Error = ParseRefError;

    fn try_from(repr: RefRepr) -> Result<Self, Self::Error> {
        match repr {
            RefRepr::Int(major) => Ok(Ref::new(major)),
            RefRepr::Text(text) => text.parse(),
        }
    }
}

impl From<Ref> for RefRepr {
    fn from(r: Ref) -> Self {
        match r.minor {
            None => RefRepr::Int(r.major),
            Some(_) => RefRepr::Text(r.to_string()),
        }
    }
}
