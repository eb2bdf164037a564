//! Compiles p-center facility-location instances into mixed-integer
//! programs, solves them through a pluggable backend and decodes the result.

pub mod cache;
pub mod config;
pub mod convert;
pub mod domain;
pub mod error;
pub mod models;

pub use error::{PCenterError, Result};
