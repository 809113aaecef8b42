//! Parsed configuration documents
//!
//! A document is a graph of [`Object`]s (blocks), [`Rule`]s (directives) and
//! [`Argument`]s. Objects know the rule that opened them, rules know the
//! object they live in, and arguments know their rule, so every node is
//! stored in the [`Arena`] and linked through handles.

mod arena;
mod key;

pub use arena::{Arena, ArgumentId, FileId, LineageId, ObjectId, RuleId, TokenId};
pub use key::{Key, Keyword};

use std::cell::Cell;
use std::collections::BTreeMap;

/// Token classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Unquoted text; directive names, keywords and bare arguments
    Text,
    /// Quoted text, never reinterpreted as a keyword
    Str,
    ObjectOpen,
    ObjectClose,
    RuleEnd,
    SingleQuote,
    DoubleQuote,
    Whitespace,
    Comment,
    LineEnd,
    End,
}

impl TokenKind {
    /// Whether tokens of this kind survive lexing and reach the parser
    pub fn is_significant(self) -> bool {
        matches!(
            self,
            TokenKind::Text
                | TokenKind::Str
                | TokenKind::ObjectOpen
                | TokenKind::ObjectClose
                | TokenKind::RuleEnd
                | TokenKind::End
        )
    }

    pub fn is_quote(self) -> bool {
        matches!(self, TokenKind::SingleQuote | TokenKind::DoubleQuote)
    }

    /// Human-readable name used in error messages
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::Text => "word",
            TokenKind::Str => "quoted string",
            TokenKind::ObjectOpen => "'{'",
            TokenKind::ObjectClose => "'}'",
            TokenKind::RuleEnd => "';'",
            TokenKind::SingleQuote => "single quote",
            TokenKind::DoubleQuote => "double quote",
            TokenKind::Whitespace => "whitespace",
            TokenKind::Comment => "comment",
            TokenKind::LineEnd => "line end",
            TokenKind::End => "end of file",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub file: FileId,
    /// Byte offset into the owning file's content
    pub offset: usize,
}

impl Token {
    pub fn new(kind: TokenKind, value: impl Into<String>, file: FileId, offset: usize) -> Self {
        Self {
            kind,
            value: value.into(),
            file,
            offset,
        }
    }

    /// Synthetic token with no source text, used for the implicit file block
    pub fn synthetic(kind: TokenKind, file: FileId, offset: usize) -> Self {
        Self::new(kind, String::new(), file, offset)
    }

    /// Number of characters to highlight when pointing at this token
    pub fn width(&self) -> usize {
        if self.kind.is_quote() {
            return 1;
        }
        self.value.chars().count().max(1)
    }
}

/// One loaded configuration file
#[derive(Debug, Clone)]
pub struct ConfigFile {
    /// Path or name the file was referenced by
    pub path: String,
    /// File content, every line terminated by `\n`
    pub content: String,
    /// Byte offset of the start of every line, ascending
    pub line_starts: Vec<usize>,
    /// Significant tokens, in source order
    pub tokens: Vec<TokenId>,
}

impl ConfigFile {
    pub fn new(path: impl Into<String>, raw: &str) -> Self {
        let mut lines: Vec<&str> = raw.split('\n').collect();
        if raw.is_empty() || raw.ends_with('\n') {
            lines.pop();
        }

        let mut content = String::with_capacity(raw.len() + 1);
        let mut line_starts = Vec::with_capacity(lines.len());
        for line in lines {
            line_starts.push(content.len());
            content.push_str(line);
            content.push('\n');
        }

        Self {
            path: path.into(),
            content,
            line_starts,
            tokens: Vec::new(),
        }
    }

    /// Locate the line containing `offset`.
    ///
    /// Returns the 1-based line number and the byte range of that line
    /// (terminator included).
    pub fn locate(&self, offset: usize) -> (usize, std::ops::Range<usize>) {
        let next = self.line_starts.partition_point(|&start| start <= offset);
        if next == 0 {
            let end = self.line_starts.first().copied().unwrap_or(self.content.len());
            return (1, 0..end);
        }
        let start = self.line_starts[next - 1];
        let end = self
            .line_starts
            .get(next)
            .copied()
            .unwrap_or(self.content.len());
        (next, start..end)
    }
}

/// A block: directives grouped by key
#[derive(Debug, Clone)]
pub struct Object {
    pub rules: BTreeMap<Key, Vec<RuleId>>,
    /// Rule whose last argument this block is; `None` for a file-level object
    pub parent_rule: Option<RuleId>,
    pub file: FileId,
    pub open: TokenId,
    pub close: Option<TokenId>,
}

impl Object {
    pub fn new(file: FileId, parent_rule: Option<RuleId>, open: TokenId) -> Self {
        Self {
            rules: BTreeMap::new(),
            parent_rule,
            file,
            open,
            close: None,
        }
    }

    pub fn rules_for(&self, key: Key) -> &[RuleId] {
        self.rules.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn push_rule(&mut self, key: Key, rule: RuleId) {
        self.rules.entry(key).or_default().push(rule);
    }

    /// Every rule of the block, grouped by key in key order
    pub fn all_rules(&self) -> impl Iterator<Item = RuleId> + '_ {
        self.rules.values().flatten().copied()
    }

    /// Every rule of the block in the order it appeared, included rules at
    /// the position of their `include`
    pub fn ordered_rules(&self) -> Vec<RuleId> {
        let mut rules: Vec<RuleId> = self.all_rules().collect();
        // handles are allocated in parse order
        rules.sort();
        rules
    }
}

/// A directive: key, arguments and provenance
#[derive(Debug, Clone)]
pub struct Rule {
    pub key: Key,
    pub arguments: Vec<ArgumentId>,
    pub parent: ObjectId,
    /// Tail of the chain of `include` rules that put this rule here
    pub lineage: Option<LineageId>,
    pub token: TokenId,
    used: Cell<bool>,
}

impl Rule {
    pub fn new(key: Key, parent: ObjectId, token: TokenId) -> Self {
        Self {
            key,
            arguments: Vec::new(),
            parent,
            lineage: None,
            token,
            used: Cell::new(false),
        }
    }

    pub fn is_used(&self) -> bool {
        self.used.get()
    }

    /// Flag the rule as consumed by a directive binder
    pub fn mark_used(&self) {
        self.used.set(true);
    }

    /// Whether the rule exists here only because of an `include`
    pub fn is_included(&self) -> bool {
        self.lineage.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgumentValue {
    Str(String),
    Object(ObjectId),
    Keyword(Keyword),
}

impl ArgumentValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ArgumentValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<ObjectId> {
        match self {
            ArgumentValue::Object(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_keyword(&self) -> Option<Keyword> {
        match self {
            ArgumentValue::Keyword(k) => Some(*k),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ArgumentValue::Str(_) => "string",
            ArgumentValue::Object(_) => "block",
            ArgumentValue::Keyword(_) => "keyword",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Argument {
    pub value: ArgumentValue,
    pub rule: RuleId,
    pub token: TokenId,
}

/// One step of an inclusion lineage
#[derive(Debug, Clone, Copy)]
pub struct LineageLink {
    /// The `include` rule responsible for this step
    pub include: RuleId,
    pub previous: Option<LineageId>,
}
