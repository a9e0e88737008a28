//! Session - the presentation-facing side of the editor
//!
//! A [`DocumentSession`] owns the live document, its undo history, the
//! document generation counter and the search cursor. The presentation
//! layer issues intents and reads back a [`SessionState`].

mod error;
mod session;
mod state;

pub use error::*;
pub use session::*;
pub use state::*;
