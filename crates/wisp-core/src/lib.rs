//! wisp-core - Core library for Wisp
//!
//! Mirrors a remote hierarchical wiki into a local store and renders each
//! document's block tree into stable HTML with a derived table of contents.
//! The CLI and worker build on the sync engine and repositories exposed here.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod queue;
pub mod remote;
pub mod render;
pub mod slug;
pub mod sync;

pub use config::Config;
pub use error::{Error, Result};
pub use models::{Page, PageId, Revision, Site, SiteId, SyncJob};
pub use sync::SyncEngine;
