//! Adapter implementations for authorization ports.

pub mod memory;
