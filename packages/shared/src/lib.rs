//! Utilities shared by the Converger client library and its binaries.

pub mod logger;
pub mod time;
