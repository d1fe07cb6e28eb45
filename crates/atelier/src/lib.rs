//! Saved-image folders, favorites and accent-insensitive search for the atelier
//! community platform.
//!
//! HTTP routing, sessions and uploads live elsewhere; handlers call into [`saves`] and
//! [`search`] with the authenticated user's id and render the returned views as JSON.

pub mod config;
pub mod db;
pub mod error;
pub mod saves;
pub mod search;
pub mod text;
pub mod util;

pub use config::Config;
pub use error::{Error, Result};
