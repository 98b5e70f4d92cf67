use std::str::FromStr;

use derive_more::{AsRef, Debug, Display, From};
use serde::Serialize;

#[derive(Debug, Display, AsRef, From, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SourceAddr(String);

impl SourceAddr {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<&str> for SourceAddr {
    fn from(value: &str) -> Self {
        Self(value.into())
    }
}

#[derive(Debug, Display, AsRef, From, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RequestPath(String);

impl RequestPath {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<&str> for RequestPath {
    fn from(value: &str) -> Self {
        Self(value.into())
    }
}

/// Response status as logged: three ASCII digits, 100 through 999.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct StatusCode(u16);

impl StatusCode {
    pub fn as_u16(self) -> u16 {
        self.0
    }
}

impl FromStr for StatusCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 3 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(format!("status must be three digits, got {s:?}"));
        }
        let value: u16 = s.parse().map_err(|e| format!("{e}"))?;
        Self::try_from(value)
    }
}

impl TryFrom<u16> for StatusCode {
    type Error = String;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        if (100..=999).contains(&value) {
            Ok(Self(value))
        } else {
            Err(format!("status must be three digits, got {value}"))
        }
    }
}

/// Body size column. `-` means the server recorded no size.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ResponseSize {
    #[display("{_0}")]
    Bytes(u64),
    #[display("-")]
    Unknown,
}

impl ResponseSize {
    pub fn bytes(self) -> Option<u64> {
        match self {
            Self::Bytes(n) => Some(n),
            Self::Unknown => None,
        }
    }
}

impl FromStr for ResponseSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "-" {
            return Ok(Self::Unknown);
        }
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(format!("size must be digits or '-', got {s:?}"));
        }
        s.parse().map(Self::Bytes).map_err(|e| format!("{e}"))
    }
}
