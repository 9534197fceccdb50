//! Shared utilities across agentforge modules.

pub mod files;

pub use files::write_file_with_dirs;
