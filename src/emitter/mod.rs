//! Output generation for parsed documents
//!
//! [`TextEmitter`] writes a document back as configuration text with every
//! `define` and `include` already resolved; [`JsonEmitter`] writes the same
//! tree as JSON.

mod json;
mod text;

pub use json::JsonEmitter;
pub use text::TextEmitter;

/// Options shared by the emitters
#[derive(Debug, Clone)]
pub struct EmitterOptions {
    /// Mark included rules with the location they were written at
    pub provenance: bool,
    /// Indent string for one nesting level
    pub indent: String,
}

impl Default for EmitterOptions {
    fn default() -> Self {
        Self {
            provenance: true,
            indent: "    ".to_string(),
        }
    }
}
