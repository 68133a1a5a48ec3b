//! Adapter implementations for machinery ports.

pub mod memory;
pub mod postgres;
