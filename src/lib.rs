//! scopeconf
//!
//! Parser for nginx-style configuration files: blocks in braces, directives
//! terminated by `;`, `define`/`include` resolved at parse time, and scoped
//! lookup of directives from inner blocks.

pub mod cli;
pub mod diagnostics;
pub mod document;
pub mod emitter;
pub mod parser;
pub mod rules;
pub mod scope;

pub use diagnostics::{ErrorKind, ParseError, Result};
pub use document::{Arena, Key, ObjectId, RuleId};
pub use parser::{ConfigParser, ParseOptions};
pub use rules::{LocationConfig, ServerConfig};
pub use scope::ScopeQuery;

/// Parse one file from disk and bind its `server` blocks
pub fn load(path: &str, options: ParseOptions) -> Result<(ConfigParser, Vec<ServerConfig>)> {
    let mut parser = ConfigParser::with_options(options);
    let root = parser.parse_file(path)?;
    let servers = ServerConfig::from_document(parser.arena(), root)?;
    Ok((parser, servers))
}
