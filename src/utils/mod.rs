//! Utility modules.

pub mod file;
pub mod text;

pub use file::{ensure_parent_dir, format_size, size_in_mb};
pub use text::{extract_pattern, preview};
