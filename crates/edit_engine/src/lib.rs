//! Edit Engine - Page commands, undo/redo and search navigation
//!
//! Every edit is a [`Command`] that returns its own inverse. Commands name
//! pages by [`doc_model::PageId`] and look up the current index when they
//! run, so an undo stays correct after unrelated edits shift pages around.

mod annotation_commands;
mod command;
mod error;
mod executor;
mod search;
mod undo;

pub use annotation_commands::*;
pub use command::*;
pub use error::*;
pub use executor::*;
pub use search::*;
pub use undo::*;
