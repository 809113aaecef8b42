//! Value types carried by directive arguments

use bitflags::bitflags;
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::digit1,
    combinator::{all_consuming, map_res, opt, value},
    number::complete::double,
    sequence::pair,
    IResult,
};
use std::fmt;
use std::time::Duration;

/// TCP port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortNumber(pub u16);

impl fmt::Display for PortNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// HTTP status code, or `*` for any code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StatusCode {
    Wildcard,
    Code(u16),
}

impl StatusCode {
    pub fn new(code: u16) -> Option<Self> {
        (100..=599).contains(&code).then_some(StatusCode::Code(code))
    }

    pub fn parse(text: &str) -> Option<Self> {
        if text == "*" {
            return Some(StatusCode::Wildcard);
        }
        text.parse().ok().and_then(StatusCode::new)
    }

    pub fn is_redirect(self) -> bool {
        matches!(self, StatusCode::Code(300..=399))
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusCode::Wildcard => f.write_str("*"),
            StatusCode::Code(code) => write!(f, "{code}"),
        }
    }
}

/// Byte count written as `<n>[kb|mb|gb]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Size(pub u64);

impl Size {
    /// Parse a non-zero size; `Kb`, `Mb` and `Gb` are accepted as well
    pub fn parse(text: &str) -> Option<Self> {
        let (_, (count, multiplier)) = all_consuming(size)(text).ok()?;
        let bytes = count.checked_mul(multiplier.unwrap_or(1))?;
        (bytes != 0).then_some(Size(bytes))
    }

    pub fn bytes(self) -> u64 {
        self.0
    }
}

fn size(input: &str) -> IResult<&str, (u64, Option<u64>)> {
    pair(
        map_res(digit1, str::parse::<u64>),
        opt(alt((
            value(1 << 10, alt((tag("kb"), tag("Kb")))),
            value(1 << 20, alt((tag("mb"), tag("Mb")))),
            value(1 << 30, alt((tag("gb"), tag("Gb")))),
        ))),
    )(input)
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const UNITS: &[(u64, &str)] = &[(1 << 30, "gb"), (1 << 20, "mb"), (1 << 10, "kb")];
        for (unit, suffix) in UNITS {
            if self.0 % unit == 0 {
                return write!(f, "{}{suffix}", self.0 / unit);
            }
        }
        write!(f, "{}", self.0)
    }
}

/// Parse a non-negative duration: a decimal number with an optional unit
/// (`ns`, `us`, `ms`, `s`, `m`, `h`, `d`, `w`, `y`); no unit means seconds
pub fn parse_duration(text: &str) -> Option<Duration> {
    let (_, (amount, unit)) = all_consuming(duration)(text).ok()?;
    if amount < 0.0 {
        return None;
    }
    Duration::try_from_secs_f64(amount * unit.unwrap_or(1.0)).ok()
}

fn duration(input: &str) -> IResult<&str, (f64, Option<f64>)> {
    pair(
        double,
        opt(alt((
            value(1e-9, tag("ns")),
            value(1e-6, tag("us")),
            value(1e-3, tag("ms")),
            value(1.0, tag("s")),
            value(60.0, tag("m")),
            value(3_600.0, tag("h")),
            value(86_400.0, tag("d")),
            value(604_800.0, tag("w")),
            value(31_536_000.0, tag("y")),
        ))),
    )(input)
}

/// Request or file-system path as written in the configuration
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UrlPath(String);

impl UrlPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Map `url` (query string ignored) onto `root`, replacing the matched
    /// location `prefix`
    pub fn rebase(url: &str, prefix: &str, root: &UrlPath) -> UrlPath {
        let url = url.split('?').next().unwrap_or_default();
        let rest = url.strip_prefix(prefix).unwrap_or(url);

        let mut path = root.0.clone();
        if !rest.is_empty() && !rest.starts_with('/') && !path.ends_with('/') {
            path.push('/');
        }
        path.push_str(rest);
        if path.len() > 1 && path.ends_with('/') {
            path.pop();
        }
        UrlPath(path)
    }
}

impl fmt::Display for UrlPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The `default` marker of `listen <port> default`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DefaultFlag(pub bool);

bitflags! {
    /// HTTP methods a location accepts
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Methods: u8 {
        const GET = 1 << 0;
        const POST = 1 << 1;
        const DELETE = 1 << 2;
        const PUT = 1 << 3;
        const HEAD = 1 << 4;
        const OPTIONS = 1 << 5;
    }
}

impl Methods {
    /// Case-insensitive method name
    pub fn parse_name(name: &str) -> Option<Methods> {
        Methods::all()
            .iter_names()
            .find(|(known, _)| known.eq_ignore_ascii_case(name))
            .map(|(_, method)| method)
    }
}

impl fmt::Display for Methods {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let names: Vec<&str> = self.iter_names().map(|(name, _)| name).collect();
        f.write_str(&names.join("|"))
    }
}
