//! Source locations and inclusion tracebacks

use crate::document::{Arena, ConfigFile, ObjectId, RuleId, TokenId};
use serde::Serialize;
use std::fmt;

/// A resolved position in a configuration file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceContext {
    pub file: String,
    /// Full text of the line, without its terminator
    pub line: String,
    /// 1-based
    pub line_number: usize,
    /// 1-based, counted in characters
    pub column: usize,
    /// Number of characters the error spans
    pub width: usize,
}

impl SourceContext {
    /// Resolve a byte offset of `file`
    pub fn at(file: &ConfigFile, offset: usize, width: usize) -> Self {
        let offset = offset.min(file.content.len());
        let (line_number, range) = file.locate(offset);
        let start = range.start.min(offset);
        let line = file.content[range]
            .trim_end_matches(['\n', '\r'])
            .to_string();
        let column = file.content[start..offset].chars().count() + 1;

        Self {
            file: file.path.clone(),
            line,
            line_number,
            column,
            width: width.max(1),
        }
    }

    pub fn of_token(arena: &Arena, token: TokenId) -> Self {
        let token = &arena[token];
        Self::at(&arena[token.file], token.offset, token.width())
    }

    pub fn of_rule(arena: &Arena, rule: RuleId) -> Self {
        Self::of_token(arena, arena[rule].token)
    }
}

impl fmt::Display for SourceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line_number, self.column)
    }
}

/// Locations of every `include` that made `rule` reachable.
///
/// Walks from the rule outward through the blocks enclosing it; at each
/// level the lineage of the current rule is listed oldest first.
pub fn traceback_for_rule(arena: &Arena, rule: RuleId) -> Vec<SourceContext> {
    let mut traceback = Vec::new();
    let mut current = Some(rule);

    while let Some(rule) = current {
        traceback.extend(
            arena
                .lineage_of(rule)
                .into_iter()
                .map(|include| SourceContext::of_rule(arena, include)),
        );
        current = arena[arena[rule].parent].parent_rule;
    }

    traceback
}

/// Traceback of the rule that opened `object`; empty for file-level objects
pub fn traceback_for_object(arena: &Arena, object: ObjectId) -> Vec<SourceContext> {
    arena[object]
        .parent_rule
        .map(|rule| traceback_for_rule(arena, rule))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_columns_are_one_based() {
        let file = ConfigFile::new("site.conf", "server {\n    listen 80;\n}\n");
        let ctx = SourceContext::at(&file, 13, 6);
        assert_eq!(ctx.line_number, 2);
        assert_eq!(ctx.column, 5);
        assert_eq!(ctx.line, "    listen 80;");
        assert_eq!(ctx.to_string(), "site.conf:2:5");
    }

    #[test]
    fn test_context_counts_characters() {
        let file = ConfigFile::new("utf8.conf", "root /wwé/x;\n");
        let ctx = SourceContext::at(&file, "root /wwé/".len(), 1);
        assert_eq!(ctx.column, 11);
    }

    #[test]
    fn test_context_past_end_is_clamped() {
        let file = ConfigFile::new("a.conf", "a;\n");
        let ctx = SourceContext::at(&file, 99, 0);
        assert_eq!(ctx.line_number, 1);
        assert_eq!(ctx.width, 1);
    }
}
