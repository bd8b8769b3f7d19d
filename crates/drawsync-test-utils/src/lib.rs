//! Shared test utilities for the drawsync workspace.
//!
//! This crate provides standardised test fixtures to eliminate duplication
//! across crate test suites. It is a dev-dependency only and never published.
//!
//! # Modules
//!
//! - [`folders`]: [`TestFolders`](folders::TestFolders), a temporary
//!   downloads/sync/backups layout with mtime-controlled file helpers

pub mod folders;

pub use folders::TestFolders;
