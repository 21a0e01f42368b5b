//! Shared utility functions for recordforge.
//!
//! This module provides common utilities used across multiple modules,
//! including Markdown fence stripping for completion output.

pub mod code_fence;

pub use code_fence::strip_code_fences;
