//! Medex Core Library
//!
//! Core domain logic for exporting media files referenced by a note
//! collection, with optional exclusion of files already present in a
//! remote folder tree.

pub mod collection;
pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod media;
pub mod note;
pub mod pathlike;
