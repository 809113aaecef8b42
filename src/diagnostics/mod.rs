//! Parse errors, source context and inclusion tracebacks
//!
//! Every failure of the lexer, the parser, the include resolver and the
//! scope resolver is a [`ParseError`]. Locations are resolved to text when
//! the error is built, so an error stays printable after the parser that
//! produced it is gone.

mod context;
mod render;

pub use context::{traceback_for_object, traceback_for_rule, SourceContext};

use crate::document::{Arena, ArgumentId, ObjectId, RuleId, TokenId};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ParseError>;

/// Classification of a [`ParseError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    EmptyQuote,
    UnmatchedQuote,
    UnexpectedToken,
    UnknownDirective,
    ArgumentCount,
    ArgumentType,
    DuplicateRule,
    MissingRule,
    FileUnreadable,
    AlreadyLoaded,
    CircularImport,
    IncludeNotFound,
    DuplicateDefine,
    DefineShadowsFile,
}

impl ErrorKind {
    /// Stable kebab-case identifier
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::EmptyQuote => "empty-quote",
            ErrorKind::UnmatchedQuote => "unmatched-quote",
            ErrorKind::UnexpectedToken => "unexpected-token",
            ErrorKind::UnknownDirective => "unknown-directive",
            ErrorKind::ArgumentCount => "argument-count",
            ErrorKind::ArgumentType => "argument-type",
            ErrorKind::DuplicateRule => "duplicate-rule",
            ErrorKind::MissingRule => "missing-rule",
            ErrorKind::FileUnreadable => "file-unreadable",
            ErrorKind::AlreadyLoaded => "already-loaded",
            ErrorKind::CircularImport => "circular-import",
            ErrorKind::IncludeNotFound => "include-not-found",
            ErrorKind::DuplicateDefine => "duplicate-define",
            ErrorKind::DefineShadowsFile => "define-shadows-file",
        }
    }
}

/// Opening and closing brace of a block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectBounds {
    pub open: SourceContext,
    /// `None` for file-level objects, which have no closing brace
    pub close: Option<SourceContext>,
}

/// What an error points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Anchor {
    /// File-level failure with no position
    None,
    Token(SourceContext),
    Rule(SourceContext),
    Argument(SourceContext),
    Duplicate {
        first: SourceContext,
        second: SourceContext,
        /// Inclusion chain of the first occurrence; the error's own
        /// traceback belongs to the second
        first_traceback: Vec<SourceContext>,
    },
    Missing {
        object: Option<ObjectBounds>,
    },
}

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ParseError {
    kind: ErrorKind,
    message: String,
    hint: Option<String>,
    anchor: Anchor,
    traceback: Vec<SourceContext>,
}

impl ParseError {
    fn build(kind: ErrorKind, message: impl Into<String>, anchor: Anchor) -> Self {
        Self {
            kind,
            message: message.into(),
            hint: None,
            anchor,
            traceback: Vec::new(),
        }
    }

    /// Error with no source position, such as an unreadable file
    pub fn file(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::build(kind, message, Anchor::None)
    }

    pub fn at_token(arena: &Arena, kind: ErrorKind, token: TokenId, message: impl Into<String>) -> Self {
        Self::build(kind, message, Anchor::Token(SourceContext::of_token(arena, token)))
    }

    pub fn at_rule(arena: &Arena, kind: ErrorKind, rule: RuleId, message: impl Into<String>) -> Self {
        let mut error = Self::build(kind, message, Anchor::Rule(SourceContext::of_rule(arena, rule)));
        error.traceback = traceback_for_rule(arena, rule);
        error
    }

    pub fn at_argument(
        arena: &Arena,
        kind: ErrorKind,
        argument: ArgumentId,
        message: impl Into<String>,
    ) -> Self {
        let argument = &arena[argument];
        let mut error = Self::build(
            kind,
            message,
            Anchor::Argument(SourceContext::of_token(arena, argument.token)),
        );
        error.traceback = traceback_for_rule(arena, argument.rule);
        error
    }

    /// Two rules where only one is allowed
    pub fn duplicate(arena: &Arena, first: RuleId, second: RuleId, message: impl Into<String>) -> Self {
        let mut error = Self::build(
            ErrorKind::DuplicateRule,
            message,
            Anchor::Duplicate {
                first: SourceContext::of_rule(arena, first),
                second: SourceContext::of_rule(arena, second),
                first_traceback: traceback_for_rule(arena, first),
            },
        );
        error.traceback = traceback_for_rule(arena, second);
        error
    }

    /// A required rule is absent; see [`ParseError::attach_object`]
    pub fn missing(message: impl Into<String>) -> Self {
        Self::build(ErrorKind::MissingRule, message, Anchor::Missing { object: None })
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Point a missing-rule error at the block that was queried.
    ///
    /// Errors of any other shape are returned unchanged.
    pub fn attach_object(mut self, arena: &Arena, object: ObjectId) -> Self {
        if let Anchor::Missing { .. } = self.anchor {
            let node = &arena[object];
            self.anchor = Anchor::Missing {
                object: Some(ObjectBounds {
                    open: SourceContext::of_token(arena, node.open),
                    close: node.close.map(|token| SourceContext::of_token(arena, token)),
                }),
            };
            self.traceback = traceback_for_object(arena, object);
        }
        self
    }

    /// Record that the error surfaced while loading the target of `include`.
    ///
    /// The include's own location is appended to the traceback, followed by
    /// the chain of includes that made the include itself reachable.
    pub fn with_include_frame(mut self, arena: &Arena, include: RuleId) -> Self {
        self.traceback.push(SourceContext::of_rule(arena, include));
        self.traceback.extend(traceback_for_rule(arena, include));
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    pub fn anchor(&self) -> &Anchor {
        &self.anchor
    }

    pub fn traceback(&self) -> &[SourceContext] {
        &self.traceback
    }

    /// Primary location of the error, if it has one
    pub fn location(&self) -> Option<&SourceContext> {
        match &self.anchor {
            Anchor::Token(ctx) | Anchor::Rule(ctx) | Anchor::Argument(ctx) => Some(ctx),
            Anchor::Duplicate { second, .. } => Some(second),
            Anchor::Missing { object } => object.as_ref().map(|bounds| &bounds.open),
            Anchor::None => None,
        }
    }

    /// Full human-readable report; see [`colored::control`] for colour control
    pub fn render(&self) -> String {
        render::render(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{ConfigFile, Key, Object, Rule, Token, TokenKind};

    struct Fixture {
        arena: Arena,
        root: ObjectId,
        include: RuleId,
        copied: RuleId,
    }

    /// `include other;` in main.conf that produced a `root` copy from other.conf
    fn fixture() -> Fixture {
        let mut arena = Arena::new();
        let main = arena.alloc_file(ConfigFile::new("main.conf", "include other;\n"));
        let other = arena.alloc_file(ConfigFile::new("other.conf", "root /www;\n"));

        let open = arena.alloc_token(Token::synthetic(TokenKind::ObjectOpen, main, 0));
        let root = arena.alloc_object(Object::new(main, None, open));

        let include_tok = arena.alloc_token(Token::new(TokenKind::Text, "include", main, 0));
        let include = arena.alloc_rule(Rule::new(Key::Include, root, include_tok));

        let root_tok = arena.alloc_token(Token::new(TokenKind::Text, "root", other, 0));
        let copied = arena.alloc_rule(Rule::new(Key::Root, root, root_tok));
        arena[copied].lineage = Some(arena.extend_lineage(None, include));
        arena[root].push_rule(Key::Root, copied);

        Fixture {
            arena,
            root,
            include,
            copied,
        }
    }

    #[test]
    fn test_rule_error_carries_inclusion_chain() {
        let f = fixture();
        let err = ParseError::at_rule(&f.arena, ErrorKind::ArgumentType, f.copied, "bad root");

        assert_eq!(err.location().unwrap().to_string(), "other.conf:1:1");
        assert_eq!(err.traceback().len(), 1);
        assert_eq!(err.traceback()[0].file, "main.conf");
        assert_eq!(err.traceback()[0].line, "include other;");
    }

    #[test]
    fn test_attach_object_only_changes_missing_errors() {
        let f = fixture();
        let missing = ParseError::missing("no listen").attach_object(&f.arena, f.root);
        match missing.anchor() {
            Anchor::Missing { object: Some(bounds) } => {
                assert_eq!(bounds.open.file, "main.conf");
                assert!(bounds.close.is_none());
            }
            other => panic!("unexpected anchor {other:?}"),
        }

        let other = ParseError::file(ErrorKind::FileUnreadable, "gone").attach_object(&f.arena, f.root);
        assert_eq!(other.anchor(), &Anchor::None);
    }

    #[test]
    fn test_include_frame_is_appended() {
        let f = fixture();
        let err = ParseError::file(ErrorKind::CircularImport, "loop")
            .with_include_frame(&f.arena, f.include)
            .with_include_frame(&f.arena, f.include);

        assert_eq!(err.kind(), ErrorKind::CircularImport);
        assert_eq!(err.traceback().len(), 2);
        assert!(err.traceback().iter().all(|ctx| ctx.file == "main.conf"));
    }

    #[test]
    fn test_display_is_message() {
        let err = ParseError::missing("Missing listen directive").with_hint("add `listen 80;`");
        assert_eq!(err.to_string(), "Missing listen directive");
        assert_eq!(err.hint(), Some("add `listen 80;`"));
        assert_eq!(err.kind().code(), "missing-rule");
    }
}
