//! Utilities shared by every Sajiki binary: logging setup and time helpers.

pub mod logger;
pub mod time;
