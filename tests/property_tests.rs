//! Property tests for the lexer and the scope resolver

use proptest::prelude::*;
use scopeconf::document::{Arena, ConfigFile, Key, ObjectId, TokenKind};
use scopeconf::parser::lexer::tokenize;
use scopeconf::parser::MemorySource;
use scopeconf::{ConfigParser, ScopeQuery};

/// One source element and the token it should produce
#[derive(Debug, Clone)]
enum Piece {
    Word(String),
    Quoted(String),
    Semicolon,
    Open,
    Close,
    Comment(String),
}

impl Piece {
    fn source(&self) -> String {
        match self {
            Piece::Word(word) => word.clone(),
            Piece::Quoted(text) => format!("\"{text}\""),
            Piece::Semicolon => ";".to_string(),
            Piece::Open => "{".to_string(),
            Piece::Close => "}".to_string(),
            Piece::Comment(text) => format!("#{text}\n"),
        }
    }

    fn expected(&self) -> Option<(TokenKind, Option<&str>)> {
        match self {
            Piece::Word(word) => Some((TokenKind::Text, Some(word.as_str()))),
            Piece::Quoted(text) => Some((TokenKind::Str, Some(text.as_str()))),
            Piece::Semicolon => Some((TokenKind::RuleEnd, None)),
            Piece::Open => Some((TokenKind::ObjectOpen, None)),
            Piece::Close => Some((TokenKind::ObjectClose, None)),
            Piece::Comment(_) => None,
        }
    }
}

fn piece() -> impl Strategy<Value = Piece> {
    prop_oneof![
        "[a-z0-9_/.:-]{1,8}".prop_map(Piece::Word),
        "[a-z0-9 {};#']{1,8}".prop_map(Piece::Quoted),
        Just(Piece::Semicolon),
        Just(Piece::Open),
        Just(Piece::Close),
        "[a-z \"'{};]{0,8}".prop_map(Piece::Comment),
    ]
}

fn separator() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just(" "), Just("\t"), Just("\n"), Just("  \r\n")]
}

proptest! {
    #[test]
    fn lexer_keeps_every_meaningful_token(
        pieces in prop::collection::vec((piece(), separator()), 0..24)
    ) {
        let content: String = pieces
            .iter()
            .map(|(piece, sep)| format!("{}{}", piece.source(), sep))
            .collect();

        let mut arena = Arena::new();
        let file = arena.alloc_file(ConfigFile::new("p.conf", &content));
        let tokens = tokenize(&arena[file].content, file).unwrap();

        // synthetic file-scope braces and the end marker wrap the real tokens
        prop_assert_eq!(tokens.first().map(|t| t.kind), Some(TokenKind::ObjectOpen));
        let tail: Vec<TokenKind> = tokens.iter().rev().take(2).map(|t| t.kind).collect();
        prop_assert_eq!(tail, vec![TokenKind::End, TokenKind::ObjectClose]);

        let inner = &tokens[1..tokens.len() - 2];
        let expected: Vec<_> = pieces.iter().filter_map(|(piece, _)| piece.expected()).collect();
        prop_assert_eq!(inner.len(), expected.len());

        for (token, (kind, value)) in inner.iter().zip(&expected) {
            prop_assert_eq!(token.kind, *kind);
            if let Some(value) = value {
                prop_assert_eq!(token.value.as_str(), *value);
            }
        }
    }

    #[test]
    fn global_lookup_is_outermost_first(present in prop::collection::vec(any::<bool>(), 1..8)) {
        let mut content = String::new();
        for (depth, has_index) in present.iter().enumerate() {
            content.push_str(&format!("location /l{depth} {{\n"));
            if *has_index {
                content.push_str(&format!("index v{depth};\n"));
            }
        }
        content.push_str(&"}\n".repeat(present.len()));

        let mut parser =
            ConfigParser::new().with_source(MemorySource::new().with_file("p.conf", content));
        let mut object = parser.parse_file("p.conf").unwrap();
        let arena = parser.arena();
        for _ in 0..present.len() {
            object = innermost_location(arena, object);
        }

        let expected: Vec<String> = present
            .iter()
            .enumerate()
            .filter(|(_, has_index)| **has_index)
            .map(|(depth, _)| format!("v{depth}"))
            .collect();

        let all = ScopeQuery::new(Key::Index).global().multiple().fetch(arena, object).unwrap();
        prop_assert_eq!(values(arena, &all), expected.clone());

        let nearest = ScopeQuery::new(Key::Index).global().one().fetch(arena, object).unwrap();
        prop_assert_eq!(values(arena, &nearest), expected.last().cloned().into_iter().collect::<Vec<_>>());

        let local = ScopeQuery::new(Key::Index).local().multiple().fetch(arena, object).unwrap();
        prop_assert_eq!(local.len(), usize::from(present[present.len() - 1]));
    }
}

fn innermost_location(arena: &Arena, object: ObjectId) -> ObjectId {
    arena
        .block_of(arena[object].rules_for(Key::Location)[0])
        .unwrap()
}

fn values(arena: &Arena, rules: &[scopeconf::RuleId]) -> Vec<String> {
    rules
        .iter()
        .map(|rule| {
            let argument = arena[*rule].arguments[0];
            arena[argument].value.as_str().unwrap_or_default().to_string()
        })
        .collect()
}
