//! Concrete transport implementations.

pub mod phoenix;
