//! Configuration lexer
//!
//! Every character is classified on its own, then runs of text, comments
//! and quoted strings are merged by a small state machine. Only tokens the
//! grammar cares about are returned; the file is wrapped in an implicit
//! block so the parser sees `{ ... } <end>`.

use crate::diagnostics::ErrorKind;
use crate::document::{FileId, Token, TokenKind};

/// Single-character tokens; any other character starts text
const PATTERNS: &[(char, TokenKind)] = &[
    ('{', TokenKind::ObjectOpen),
    ('}', TokenKind::ObjectClose),
    (';', TokenKind::RuleEnd),
    ('#', TokenKind::Comment),
    ('\'', TokenKind::SingleQuote),
    (' ', TokenKind::Whitespace),
    ('"', TokenKind::DoubleQuote),
    ('\n', TokenKind::LineEnd),
    ('\t', TokenKind::Whitespace),
    ('\r', TokenKind::Whitespace),
    ('\x0b', TokenKind::Whitespace),
    ('\x0c', TokenKind::Whitespace),
];

/// A lexing failure, anchored at the opening quote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub kind: ErrorKind,
    pub message: &'static str,
    pub hint: &'static str,
    pub token: Token,
}

impl LexError {
    fn empty_quote(quote: Token) -> Self {
        Self {
            kind: ErrorKind::EmptyQuote,
            message: "quote without content in configuration file",
            hint: "put something between the quotes, or remove them",
            token: quote,
        }
    }

    fn unmatched_quote(quote: Token) -> Self {
        Self {
            kind: ErrorKind::UnmatchedQuote,
            message: "unmatched quote in configuration file",
            hint: "close the string with a matching quote",
            token: quote,
        }
    }
}

/// Tokenize the content of `file`
pub fn tokenize(content: &str, file: FileId) -> Result<Vec<Token>, LexError> {
    Lexer {
        content,
        file,
        pos: 0,
    }
    .run()
}

struct Lexer<'a> {
    content: &'a str,
    file: FileId,
    pos: usize,
}

impl Lexer<'_> {
    /// Classify the character under the cursor
    fn next_token(&mut self) -> Token {
        let Some(c) = self.content[self.pos..].chars().next() else {
            return Token::synthetic(TokenKind::End, self.file, self.content.len());
        };

        let offset = self.pos;
        self.pos += c.len_utf8();
        let kind = PATTERNS
            .iter()
            .find(|(pattern, _)| *pattern == c)
            .map(|(_, kind)| *kind)
            .unwrap_or(TokenKind::Text);

        Token::new(kind, c, self.file, offset)
    }

    /// Grow `span` until a token for which `ends` holds; that token is returned
    fn continue_span(&mut self, span: &mut Token, ends: impl Fn(TokenKind) -> bool) -> Token {
        loop {
            let next = self.next_token();
            if ends(next.kind) {
                return next;
            }
            span.value.push_str(&next.value);
        }
    }

    fn run(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        let mut current = Token::synthetic(TokenKind::ObjectOpen, self.file, 0);

        loop {
            let mut previous = current;

            match previous.kind {
                TokenKind::End => {
                    tokens.push(Token::synthetic(
                        TokenKind::ObjectClose,
                        self.file,
                        self.content.len(),
                    ));
                    tokens.push(previous);
                    return Ok(tokens);
                }
                TokenKind::Text => {
                    current = self.continue_span(&mut previous, |kind| kind != TokenKind::Text);
                }
                TokenKind::Comment => {
                    previous.value.clear();
                    current = self.continue_span(&mut previous, |kind| {
                        matches!(kind, TokenKind::LineEnd | TokenKind::End)
                    });
                }
                quote if quote.is_quote() => {
                    let mut content = self.next_token();
                    if content.kind == quote {
                        return Err(LexError::empty_quote(previous));
                    }
                    let close = self.continue_span(&mut content, |kind| {
                        kind == TokenKind::End || kind == quote
                    });
                    if close.kind != quote {
                        return Err(LexError::unmatched_quote(previous));
                    }
                    content.kind = TokenKind::Str;
                    previous = content;
                    current = self.next_token();
                }
                _ => current = self.next_token(),
            }

            if previous.kind.is_significant() {
                tokens.push(previous);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Arena, ConfigFile};

    fn file() -> FileId {
        Arena::new().alloc_file(ConfigFile::new("test.conf", ""))
    }

    fn lex(content: &str) -> Vec<(TokenKind, String)> {
        tokenize(content, file())
            .unwrap()
            .into_iter()
            .map(|token| (token.kind, token.value))
            .collect()
    }

    fn kinds(content: &str) -> Vec<TokenKind> {
        lex(content).into_iter().map(|(kind, _)| kind).collect()
    }

    #[test]
    fn test_empty_input_is_wrapped() {
        assert_eq!(
            kinds(""),
            vec![TokenKind::ObjectOpen, TokenKind::ObjectClose, TokenKind::End]
        );
    }

    #[test]
    fn test_simple_block() {
        use TokenKind::*;
        assert_eq!(
            kinds("server {\n    listen 80;\n}\n"),
            vec![ObjectOpen, Text, ObjectOpen, Text, Text, RuleEnd, ObjectClose, ObjectClose, End]
        );
        let texts: Vec<String> = lex("server {\n    listen 80;\n}\n")
            .into_iter()
            .filter(|(kind, _)| *kind == Text)
            .map(|(_, value)| value)
            .collect();
        assert_eq!(texts, vec!["server", "listen", "80"]);
    }

    #[test]
    fn test_quoted_string_is_one_token() {
        let tokens = lex("\"abc\"");
        assert_eq!(tokens[1], (TokenKind::Str, "abc".to_string()));
        assert_eq!(tokens.len(), 4);
    }

    #[test]
    fn test_quotes_keep_other_quote_and_newlines() {
        let tokens = lex("'say \"hi\"\n  there'");
        assert_eq!(tokens[1], (TokenKind::Str, "say \"hi\"\n  there".to_string()));
    }

    #[test]
    fn test_quoted_comment_char_is_content() {
        let tokens = lex("root \"/a#b\";");
        assert_eq!(tokens[2], (TokenKind::Str, "/a#b".to_string()));
    }

    #[test]
    fn test_text_ends_at_structural_characters() {
        use TokenKind::*;
        assert_eq!(kinds("a\"b\""), vec![ObjectOpen, Text, Str, ObjectClose, End]);
        assert_eq!(kinds("a;b"), vec![ObjectOpen, Text, RuleEnd, Text, ObjectClose, End]);
        assert_eq!(kinds("a#b"), vec![ObjectOpen, Text, ObjectClose, End]);
    }

    #[test]
    fn test_comment_is_dropped() {
        let with_comment = lex("# comment\nkey value;");
        let without = lex("key value;");
        assert_eq!(with_comment, without);
    }

    #[test]
    fn test_offsets_point_at_source() {
        let tokens = tokenize("root  \"/wé\" x;", file()).unwrap();
        assert_eq!(tokens[1].offset, 0);
        // merged string starts at its first content character
        assert_eq!(tokens[2].offset, 7);
        assert_eq!(tokens[2].value, "/wé");
        assert_eq!(tokens[3].offset, "root  \"/wé\" ".len());
    }

    #[test]
    fn test_empty_quote_error() {
        let err = tokenize("root \"\";", file()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::EmptyQuote);
        assert_eq!(err.token.offset, 5);
    }

    #[test]
    fn test_unmatched_quote_error() {
        let err = tokenize("root 'abc;\nlisten 80;\n", file()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnmatchedQuote);
        assert_eq!(err.token.offset, 5);
        assert_eq!(err.token.kind, TokenKind::SingleQuote);

        let err = tokenize("\"", file()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnmatchedQuote);
    }

    #[test]
    fn test_end_token_sits_at_content_end() {
        let tokens = tokenize("a;\n", file()).unwrap();
        let end = tokens.last().unwrap();
        assert_eq!(end.kind, TokenKind::End);
        assert_eq!(end.offset, 3);
    }
}
