//! Conversion of single arguments into typed values

use super::types::{parse_duration, DefaultFlag, Methods, PortNumber, Size, StatusCode, UrlPath};
use crate::diagnostics::{ErrorKind, ParseError, Result};
use crate::document::{Arena, ArgumentId, ArgumentValue, Keyword, ObjectId};
use std::time::Duration;

/// A value that can be read from one directive argument
pub trait FromArgument: Sized {
    /// Shape of the accepted argument, for error messages
    const EXPECTED: &'static str;

    fn from_argument(arena: &Arena, argument: ArgumentId) -> Result<Self>;
}

fn mismatch(arena: &Arena, argument: ArgumentId, expected: &str) -> ParseError {
    let found = match &arena[argument].value {
        ArgumentValue::Str(text) => format!("`{text}`"),
        other => other.type_name().to_string(),
    };
    ParseError::at_argument(
        arena,
        ErrorKind::ArgumentType,
        argument,
        format!("expected {expected}, found {found}"),
    )
}

/// Plain string text of an argument; keywords and blocks are rejected
fn text<'a>(arena: &'a Arena, argument: ArgumentId, expected: &str) -> Result<&'a str> {
    arena[argument]
        .value
        .as_str()
        .ok_or_else(|| mismatch(arena, argument, expected))
}

/// Convert the string argument with `parse`, failing with `T::EXPECTED`
fn parse_text<T: FromArgument>(
    arena: &Arena,
    argument: ArgumentId,
    parse: impl FnOnce(&str) -> Option<T>,
) -> Result<T> {
    let raw = text(arena, argument, T::EXPECTED)?;
    parse(raw).ok_or_else(|| mismatch(arena, argument, T::EXPECTED))
}

impl FromArgument for String {
    const EXPECTED: &'static str = "a string";

    fn from_argument(arena: &Arena, argument: ArgumentId) -> Result<Self> {
        text(arena, argument, Self::EXPECTED).map(str::to_string)
    }
}

impl FromArgument for i64 {
    const EXPECTED: &'static str = "an integer";

    fn from_argument(arena: &Arena, argument: ArgumentId) -> Result<Self> {
        parse_text(arena, argument, |raw| raw.parse().ok())
    }
}

impl FromArgument for PortNumber {
    const EXPECTED: &'static str = "a port number between 0 and 65535";

    fn from_argument(arena: &Arena, argument: ArgumentId) -> Result<Self> {
        parse_text(arena, argument, |raw| raw.parse().ok().map(PortNumber))
    }
}

impl FromArgument for StatusCode {
    const EXPECTED: &'static str = "a status code between 100 and 599 or '*'";

    fn from_argument(arena: &Arena, argument: ArgumentId) -> Result<Self> {
        parse_text(arena, argument, StatusCode::parse)
    }
}

impl FromArgument for Size {
    const EXPECTED: &'static str = "a non-zero size such as 512, 8kb, 10mb or 1gb";

    fn from_argument(arena: &Arena, argument: ArgumentId) -> Result<Self> {
        parse_text(arena, argument, Size::parse)
    }
}

impl FromArgument for Duration {
    const EXPECTED: &'static str = "a duration such as 30s, 250ms or 5m";

    fn from_argument(arena: &Arena, argument: ArgumentId) -> Result<Self> {
        parse_text(arena, argument, parse_duration)
    }
}

impl FromArgument for UrlPath {
    const EXPECTED: &'static str = "a path";

    fn from_argument(arena: &Arena, argument: ArgumentId) -> Result<Self> {
        parse_text(arena, argument, |raw| Some(UrlPath::new(raw)))
    }
}

impl FromArgument for Methods {
    const EXPECTED: &'static str = "an HTTP method (GET, POST, DELETE, PUT, HEAD or OPTIONS)";

    fn from_argument(arena: &Arena, argument: ArgumentId) -> Result<Self> {
        parse_text(arena, argument, Methods::parse_name)
    }
}

impl FromArgument for ObjectId {
    const EXPECTED: &'static str = "a block";

    fn from_argument(arena: &Arena, argument: ArgumentId) -> Result<Self> {
        arena[argument]
            .value
            .as_object()
            .ok_or_else(|| mismatch(arena, argument, Self::EXPECTED))
    }
}

impl FromArgument for bool {
    const EXPECTED: &'static str = "on, true, enable, off, false or disable";

    fn from_argument(arena: &Arena, argument: ArgumentId) -> Result<Self> {
        arena[argument]
            .value
            .as_keyword()
            .and_then(Keyword::as_bool)
            .ok_or_else(|| mismatch(arena, argument, Self::EXPECTED))
    }
}

impl FromArgument for DefaultFlag {
    const EXPECTED: &'static str = "`default`";

    fn from_argument(arena: &Arena, argument: ArgumentId) -> Result<Self> {
        match arena[argument].value.as_keyword() {
            Some(Keyword::Default) => Ok(DefaultFlag(true)),
            _ => Err(mismatch(arena, argument, Self::EXPECTED)),
        }
    }
}
