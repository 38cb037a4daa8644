//! Local note-management engine
//!
//! This library keeps a collection of notes in memory, persists it to a
//! key-value slot, and provides editing, tagging, trash handling, filtered and
//! sorted views, debounced autosave and whole-collection import/export.

mod autosave;
mod codec;
mod config;
mod errors;
mod helper;
mod id;
mod logging;
mod note;
mod persistence;
mod service;
mod store;
mod tags;
mod types;
mod view;

// Re-export key components
pub use autosave::*;
pub use codec::*;
pub use config::*;
pub use errors::*;
pub use helper::*;
pub use id::*;
pub use logging::*;
pub use note::*;
pub use persistence::*;
pub use service::*;
pub use store::*;
pub use tags::*;
pub use types::*;
pub use view::*;
