use serde::Serialize;
use std::fmt;

use crate::error::PCenterError;

/// Available p-center formulations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Classical,
    Capacitated,
    Failure,
    Stratified,
}

impl Variant {
    pub const ALL: [Variant; 4] = [
        Variant::Classical,
        Variant::Capacitated,
        Variant::Failure,
        Variant::Stratified,
    ];

    /// Parse variant from string (case-insensitive)
    pub fn parse(s: &str) -> Result<Self, PCenterError> {
        match s.trim().to_lowercase().as_str() {
            "classical" => Ok(Variant::Classical),
            "capacitated" => Ok(Variant::Capacitated),
            "failure" => Ok(Variant::Failure),
            "stratified" => Ok(Variant::Stratified),
            _ => Err(PCenterError::UnknownVariant(s.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Classical => "classical",
            Variant::Capacitated => "capacitated",
            Variant::Failure => "failure",
            Variant::Stratified => "stratified",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
