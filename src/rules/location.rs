//! `location` blocks and the directives they accept

use super::types::{Methods, Size, StatusCode, UrlPath};
use super::{Directive, Merge, ObjectBinder, RuleBinder};
use crate::diagnostics::{ErrorKind, ParseError, Result};
use crate::document::{Arena, Key, ObjectId, RuleId};
use std::collections::BTreeMap;
use std::time::Duration;

const DEFAULT_CGI_TIMEOUT: Duration = Duration::from_secs(30);

/// `location <path> { ... }`
#[derive(Debug, Clone)]
pub struct Location {
    pub rule: RuleId,
    pub prefix: UrlPath,
    pub block: ObjectId,
}

impl Directive for Location {
    const KEY: Key = Key::Location;
    const FORMAT: &'static str = "location <path> { ... }";

    fn from_rule(arena: &Arena, rule: RuleId) -> Result<Self> {
        let mut binder = RuleBinder::for_directive::<Self>(arena, rule);
        binder.expect_count(2)?;
        let prefix = binder.next()?;
        let block = binder.next()?;
        Ok(Self {
            rule,
            prefix,
            block,
        })
    }
}

/// `allowed_methods <method>...;`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllowedMethods(pub Methods);

impl Directive for AllowedMethods {
    const KEY: Key = Key::AllowedMethods;
    const FORMAT: &'static str = "allowed_methods <method>...;";

    fn from_rule(arena: &Arena, rule: RuleId) -> Result<Self> {
        let mut binder = RuleBinder::for_directive::<Self>(arena, rule);
        binder.expect_min(1)?;
        let methods: Vec<Methods> = binder.all()?;
        Ok(Self(methods.into_iter().fold(Methods::empty(), |acc, m| acc | m)))
    }
}

impl Merge for AllowedMethods {
    fn merge(&mut self, inner: Self) {
        self.0 |= inner.0;
    }
}

/// Directive taking exactly one path
macro_rules! path_directive {
    ($name:ident, $key:expr, $format:literal) => {
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name(pub UrlPath);

        impl Directive for $name {
            const KEY: Key = $key;
            const FORMAT: &'static str = $format;

            fn from_rule(arena: &Arena, rule: RuleId) -> Result<Self> {
                let mut binder = RuleBinder::for_directive::<Self>(arena, rule);
                binder.expect_count(1)?;
                binder.next().map(Self)
            }
        }
    };
}

path_directive!(Root, Key::Root, "root <path>;");
path_directive!(UploadStore, Key::UploadStore, "upload_store <path>;");

/// Directive taking exactly one `on`/`off` switch
macro_rules! switch_directive {
    ($name:ident, $key:expr, $format:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $name(pub bool);

        impl Directive for $name {
            const KEY: Key = $key;
            const FORMAT: &'static str = $format;

            fn from_rule(arena: &Arena, rule: RuleId) -> Result<Self> {
                let mut binder = RuleBinder::for_directive::<Self>(arena, rule);
                binder.expect_count(1)?;
                binder.next().map(Self)
            }
        }
    };
}

switch_directive!(Autoindex, Key::Autoindex, "autoindex on|off;");
switch_directive!(Cgi, Key::Cgi, "cgi on|off;");

/// Directive listing names; visible instances concatenate
macro_rules! list_directive {
    ($name:ident, $key:expr, $format:literal) => {
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name(pub Vec<String>);

        impl Directive for $name {
            const KEY: Key = $key;
            const FORMAT: &'static str = $format;

            fn from_rule(arena: &Arena, rule: RuleId) -> Result<Self> {
                let mut binder = RuleBinder::for_directive::<Self>(arena, rule);
                binder.expect_min(1)?;
                binder.all().map(Self)
            }
        }

        impl Merge for $name {
            fn merge(&mut self, inner: Self) {
                self.0.extend(inner.0);
            }
        }
    };
}

list_directive!(Index, Key::Index, "index <file>...;");
list_directive!(CgiExtension, Key::CgiExtension, "cgi_extension <extension>...;");

/// `return <code> [target];`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Return {
    pub code: StatusCode,
    pub target: Option<String>,
}

impl Return {
    pub fn is_redirect(&self) -> bool {
        self.code.is_redirect()
    }
}

impl Directive for Return {
    const KEY: Key = Key::Return;
    const FORMAT: &'static str = "return <code> [target];";

    fn from_rule(arena: &Arena, rule: RuleId) -> Result<Self> {
        let mut binder = RuleBinder::for_directive::<Self>(arena, rule);
        binder.expect_range(1, 2)?;
        let code: StatusCode = binder.next()?;
        if code == StatusCode::Wildcard {
            let argument = arena[rule].arguments[0];
            return Err(ParseError::at_argument(
                arena,
                ErrorKind::ArgumentType,
                argument,
                "`return` needs a concrete status code",
            )
            .with_hint("use a code between 100 and 599"));
        }
        let target = binder.next_optional()?;
        Ok(Self { code, target })
    }
}

/// `error_page <code>... <path>;`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ErrorPages(pub BTreeMap<StatusCode, UrlPath>);

impl Directive for ErrorPages {
    const KEY: Key = Key::ErrorPage;
    const FORMAT: &'static str = "error_page <code>... <path>;";

    fn from_rule(arena: &Arena, rule: RuleId) -> Result<Self> {
        let mut binder = RuleBinder::for_directive::<Self>(arena, rule);
        binder.expect_min(2)?;
        let codes: Vec<StatusCode> = binder.all_but(1)?;
        let page: UrlPath = binder.next()?;
        Ok(Self(codes.into_iter().map(|code| (code, page.clone())).collect()))
    }
}

impl Merge for ErrorPages {
    fn merge(&mut self, inner: Self) {
        self.0.extend(inner.0);
    }
}

/// `client_max_body_size <size>;`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientMaxBodySize(pub Size);

impl Directive for ClientMaxBodySize {
    const KEY: Key = Key::ClientMaxBodySize;
    const FORMAT: &'static str = "client_max_body_size <size>;";

    fn from_rule(arena: &Arena, rule: RuleId) -> Result<Self> {
        let mut binder = RuleBinder::for_directive::<Self>(arena, rule);
        binder.expect_count(1)?;
        binder.next().map(Self)
    }
}

/// `cgi_timeout <duration>;`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CgiTimeout(pub Duration);

impl Directive for CgiTimeout {
    const KEY: Key = Key::CgiTimeout;
    const FORMAT: &'static str = "cgi_timeout <duration>;";

    fn from_rule(arena: &Arena, rule: RuleId) -> Result<Self> {
        let mut binder = RuleBinder::for_directive::<Self>(arena, rule);
        binder.expect_count(1)?;
        binder.next().map(Self)
    }
}

/// Settings in effect for requests under one path prefix
#[derive(Debug, Clone, PartialEq)]
pub struct LocationConfig {
    pub prefix: UrlPath,
    pub methods: Methods,
    pub root: Option<UrlPath>,
    pub upload_store: Option<UrlPath>,
    pub autoindex: bool,
    pub index: Vec<String>,
    pub redirect: Option<Return>,
    pub error_pages: BTreeMap<StatusCode, UrlPath>,
    pub max_body_size: Option<Size>,
    pub cgi: bool,
    pub cgi_timeout: Duration,
    pub cgi_extensions: Vec<String>,
    /// Nested `location` blocks
    pub locations: Vec<LocationConfig>,
}

impl LocationConfig {
    /// Bind a `location` rule
    pub fn from_rule(arena: &Arena, rule: RuleId) -> Result<Self> {
        let location = Location::from_rule(arena, rule)?;
        Self::from_object(arena, location.block, location.prefix)
    }

    /// Bind the directives visible from `object`, up to the enclosing
    /// `server` block
    pub fn from_object(arena: &Arena, object: ObjectId, prefix: UrlPath) -> Result<Self> {
        let binder = ObjectBinder::new(arena, object).bound(Key::Server).optional();

        let locations = ObjectBinder::new(arena, object)
            .local()
            .each::<Location>()?
            .into_iter()
            .map(|location| LocationConfig::from_object(arena, location.block, location.prefix))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            prefix,
            methods: binder
                .merged::<AllowedMethods>()?
                .map_or(Methods::GET, |m| m.0),
            root: binder.one::<Root>()?.map(|r| r.0),
            upload_store: binder.one::<UploadStore>()?.map(|u| u.0),
            autoindex: binder.one::<Autoindex>()?.is_some_and(|a| a.0),
            index: binder.merged::<Index>()?.map(|i| i.0).unwrap_or_default(),
            redirect: binder.one::<Return>()?,
            error_pages: binder.merged::<ErrorPages>()?.unwrap_or_default().0,
            max_body_size: binder.one::<ClientMaxBodySize>()?.map(|s| s.0),
            cgi: binder.one::<Cgi>()?.is_some_and(|c| c.0),
            cgi_timeout: binder
                .one::<CgiTimeout>()?
                .map_or(DEFAULT_CGI_TIMEOUT, |t| t.0),
            cgi_extensions: binder
                .merged::<CgiExtension>()?
                .map(|e| e.0)
                .unwrap_or_default(),
            locations,
        })
    }

    pub fn allows(&self, method: Methods) -> bool {
        self.methods.contains(method)
    }

    /// Error page for `code`, falling back to the `*` entry
    pub fn error_page(&self, code: StatusCode) -> Option<&UrlPath> {
        self.error_pages
            .get(&code)
            .or_else(|| self.error_pages.get(&StatusCode::Wildcard))
    }

    /// Whether `path` should be handed to a CGI program
    pub fn is_cgi(&self, path: &str) -> bool {
        if !self.cgi {
            return false;
        }
        let name = path.rsplit('/').next().unwrap_or_default();
        self.cgi_extensions
            .iter()
            .any(|ext| name.len() > ext.len() && name.ends_with(ext.as_str()))
    }

    /// Map a request URL onto this location's root
    pub fn resolve_path(&self, url: &str) -> Option<UrlPath> {
        let root = self.root.as_ref()?;
        Some(UrlPath::rebase(url, self.prefix.as_str(), root))
    }

    /// Whether `url` falls under this location's prefix
    pub fn matches(&self, url: &str) -> bool {
        let prefix = self.prefix.as_str();
        match url.strip_prefix(prefix) {
            Some(rest) => {
                prefix.ends_with('/')
                    || rest.is_empty()
                    || rest.starts_with(|c| c == '/' || c == '?')
            }
            None => false,
        }
    }

    /// Deepest nested location whose prefix matches `url`, preferring the
    /// longest prefix at each level
    pub fn most_specific(&self, url: &str) -> &LocationConfig {
        self.locations
            .iter()
            .filter(|location| location.matches(url))
            .max_by_key(|location| location.prefix.as_str().len())
            .map_or(self, |location| location.most_specific(url))
    }
}
