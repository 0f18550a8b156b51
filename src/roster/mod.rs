//! Guest roster: the read-only list of invited guests and their parties.

mod normalize;
mod parser;
mod source;

pub use normalize::*;
pub use parser::*;
pub use source::*;

use serde::Serialize;

/// One invited guest as written in the roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Guest {
    pub name: String,
    pub party: Option<String>,
}

impl Guest {
    pub fn new(name: impl Into<String>, party: Option<String>) -> Self {
        Self {
            name: name.into(),
            party: party.filter(|p| !p.trim().is_empty()),
        }
    }
}
