//! Recursive-descent construction of objects, rules and arguments

use super::ConfigParser;
use crate::diagnostics::{ErrorKind, ParseError, Result};
use crate::document::{
    Argument, ArgumentValue, FileId, Key, Keyword, Object, ObjectId, Rule, RuleId, TokenId,
    TokenKind,
};

/// Position in the token list of one file
struct Cursor {
    file: FileId,
    pos: usize,
}

impl Cursor {
    fn peek(&self, parser: &ConfigParser) -> TokenId {
        let tokens = &parser.arena[self.file].tokens;
        // the lexer always ends the list with an end token, which is never consumed
        tokens[self.pos.min(tokens.len() - 1)]
    }

    fn advance(&mut self, parser: &ConfigParser) -> TokenId {
        let token = self.peek(parser);
        self.pos += 1;
        token
    }
}

impl ConfigParser {
    /// Parse the implicit block wrapping a whole file
    pub(super) fn parse_root(&mut self, file: FileId) -> Result<ObjectId> {
        let mut cursor = Cursor { file, pos: 0 };
        let root = self.parse_object(&mut cursor, None)?;

        let next = cursor.peek(self);
        if self.arena[next].kind != TokenKind::End {
            // a `}` closed the file scope early
            let stray = self.arena[root].close.unwrap_or(next);
            return Err(ParseError::at_token(
                &self.arena,
                ErrorKind::UnexpectedToken,
                stray,
                "unexpected '}' with no open block",
            )
            .with_hint("remove the extra closing brace"));
        }

        self.arena[root].close = None;
        Ok(root)
    }

    fn parse_object(&mut self, cursor: &mut Cursor, parent_rule: Option<RuleId>) -> Result<ObjectId> {
        let open = cursor.advance(self);
        let object = self.arena.alloc_object(Object::new(cursor.file, parent_rule, open));

        loop {
            let token = cursor.peek(self);
            match self.arena[token].kind {
                TokenKind::ObjectClose => {
                    cursor.advance(self);
                    self.arena[object].close = Some(token);
                    break;
                }
                TokenKind::End => {
                    return Err(self.unexpected(token, "a directive name or '}'"));
                }
                _ => {
                    let rule = self.parse_rule(cursor, object)?;
                    match self.arena[rule].key {
                        Key::Define => self.handle_define(rule)?,
                        Key::Include => self.handle_include(rule, object)?,
                        key => self.arena[object].push_rule(key, rule),
                    }
                }
            }
        }

        // The synthetic close of the file scope ended a nested block
        let close = self.arena[object].close;
        if parent_rule.is_some() && close.is_some_and(|t| self.arena[t].value.is_empty()) {
            return Err(ParseError::at_token(
                &self.arena,
                ErrorKind::UnexpectedToken,
                open,
                "block is never closed",
            )
            .with_hint("add the missing '}'"));
        }

        Ok(object)
    }

    fn parse_rule(&mut self, cursor: &mut Cursor, object: ObjectId) -> Result<RuleId> {
        let key_token = cursor.peek(self);
        if self.arena[key_token].kind != TokenKind::Text {
            return Err(self.unexpected(key_token, "a directive name"));
        }

        let name = &self.arena[key_token].value;
        let key = Key::from_name(name).ok_or_else(|| {
            ParseError::at_token(
                &self.arena,
                ErrorKind::UnknownDirective,
                key_token,
                format!("unknown directive `{name}`"),
            )
            .with_hint(format!(
                "known directives are: {}",
                Key::names().collect::<Vec<_>>().join(", ")
            ))
        })?;
        cursor.advance(self);

        let rule = self.arena.alloc_rule(Rule::new(key, object, key_token));

        loop {
            let token = cursor.peek(self);
            let value = match self.arena[token].kind {
                TokenKind::RuleEnd => {
                    cursor.advance(self);
                    break;
                }
                TokenKind::ObjectOpen => {
                    let block = self.parse_object(cursor, Some(rule))?;
                    self.push_argument(rule, ArgumentValue::Object(block), token);

                    let next = cursor.peek(self);
                    if self.arena[next].kind == TokenKind::RuleEnd {
                        cursor.advance(self);
                    }
                    break;
                }
                TokenKind::Text => {
                    let word = &self.arena[token].value;
                    match Keyword::from_word(word) {
                        Some(keyword) => ArgumentValue::Keyword(keyword),
                        None => ArgumentValue::Str(word.clone()),
                    }
                }
                TokenKind::Str => ArgumentValue::Str(self.arena[token].value.clone()),
                _ => {
                    let err = self.unexpected(token, "an argument, ';' or '{'");
                    return Err(err.with_hint(format!("terminate the `{key}` directive with ';'")));
                }
            };
            cursor.advance(self);
            self.push_argument(rule, value, token);
        }

        Ok(rule)
    }

    fn push_argument(&mut self, rule: RuleId, value: ArgumentValue, token: TokenId) {
        let argument = self.arena.alloc_argument(Argument { value, rule, token });
        self.arena[rule].arguments.push(argument);
    }

    fn unexpected(&self, token: TokenId, expected: &str) -> ParseError {
        let found = self.arena[token].kind.describe();
        ParseError::at_token(
            &self.arena,
            ErrorKind::UnexpectedToken,
            token,
            format!("expected {expected}, found {found}"),
        )
    }
}
