//! Watch module - element discovery over time

pub mod scheduler;

pub use scheduler::*;
