// # Export Store Implementations
//
// This module provides implementations of the ExportStore trait for
// different persistence strategies.

pub mod file;
pub mod memory;

pub use file::{FileExportStore, FileExportStoreFactory};
pub use memory::{MemoryExportStore, MemoryExportStoreFactory};
