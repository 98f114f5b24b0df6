// # Run Stamp Store Implementations
//
// This module provides implementations of the RunStampStore trait for
// different persistence strategies.

pub mod file;
pub mod memory;

pub use file::FileRunStampStore;
pub use memory::MemoryRunStampStore;
