//! Backend selection
//!
//! Maps a client identity to one of the configured backends. The mapping is a
//! pure function of the key and the backend list, so a client address keeps
//! landing on the same backend for the lifetime of the process without any
//! state shared between sessions.

mod hash;
mod selector;

pub use hash::fnv1a_32;
pub use selector::{select, HashSelector};
