//! Typed directives bound from the document graph
//!
//! A [`Directive`] reads one rule through a [`RuleBinder`]; an
//! [`ObjectBinder`] finds the rules a block can see under a scope policy
//! and turns them into directives.

pub mod convert;
pub mod location;
pub mod server;
pub mod types;

pub use convert::FromArgument;
pub use location::LocationConfig;
pub use server::ServerConfig;
pub use types::{DefaultFlag, Methods, PortNumber, Size, StatusCode, UrlPath};

use crate::diagnostics::{ErrorKind, ParseError, Result};
use crate::document::{Arena, Key, ObjectId, RuleId};
use crate::scope::{ScopeMode, ScopeQuery};

/// A directive with a fixed key and argument layout
pub trait Directive: Sized {
    const KEY: Key;
    /// Usage line shown when the arguments don't fit
    const FORMAT: &'static str;

    fn from_rule(arena: &Arena, rule: RuleId) -> Result<Self>;
}

/// A directive whose visible rules combine into one value
pub trait Merge {
    /// Fold `inner` into `self`; `inner` was found closer to the queried block
    fn merge(&mut self, inner: Self);
}

/// Sequential reader over the arguments of one rule
pub struct RuleBinder<'a> {
    arena: &'a Arena,
    rule: RuleId,
    format: &'static str,
    next: usize,
}

impl<'a> RuleBinder<'a> {
    /// Start reading `rule`, marking it used
    pub fn new(arena: &'a Arena, rule: RuleId, format: &'static str) -> Self {
        arena[rule].mark_used();
        Self {
            arena,
            rule,
            format,
            next: 0,
        }
    }

    pub fn for_directive<D: Directive>(arena: &'a Arena, rule: RuleId) -> Self {
        Self::new(arena, rule, D::FORMAT)
    }

    pub fn rule(&self) -> RuleId {
        self.rule
    }

    fn len(&self) -> usize {
        self.arena[self.rule].arguments.len()
    }

    fn remaining(&self) -> usize {
        self.len().saturating_sub(self.next)
    }

    fn count_error(&self, expected: String) -> ParseError {
        let key = self.arena[self.rule].key;
        ParseError::at_rule(
            self.arena,
            ErrorKind::ArgumentCount,
            self.rule,
            format!("`{key}` takes {expected}, found {}", self.len()),
        )
        .with_hint(format!("expected format: {}", self.format))
    }

    pub fn expect_count(&self, count: usize) -> Result<()> {
        self.expect_range(count, count)
    }

    pub fn expect_min(&self, min: usize) -> Result<()> {
        if self.len() < min {
            return Err(self.count_error(format!("at least {}", plural(min))));
        }
        Ok(())
    }

    pub fn expect_range(&self, min: usize, max: usize) -> Result<()> {
        let len = self.len();
        if (min..=max).contains(&len) {
            return Ok(());
        }
        let expected = if min == max {
            plural(min)
        } else {
            format!("{min} to {max} arguments")
        };
        Err(self.count_error(expected))
    }

    /// Convert the next argument
    pub fn next<T: FromArgument>(&mut self) -> Result<T> {
        match self.next_optional()? {
            Some(value) => Ok(value),
            None => Err(self.count_error(format!("at least {}", plural(self.next + 1)))),
        }
    }

    /// Convert the next argument if there is one
    pub fn next_optional<T: FromArgument>(&mut self) -> Result<Option<T>> {
        let Some(argument) = self.arena[self.rule].arguments.get(self.next).copied() else {
            return Ok(None);
        };
        self.next += 1;
        T::from_argument(self.arena, argument).map(Some)
    }

    /// Convert every remaining argument except the last `keep`
    pub fn all_but<T: FromArgument>(&mut self, keep: usize) -> Result<Vec<T>> {
        let remaining = self.remaining();
        if keep >= remaining {
            return Err(self.count_error(format!("at least {}", plural(self.next + keep + 1))));
        }
        (0..remaining - keep).map(|_| self.next()).collect()
    }

    /// Convert every remaining argument
    pub fn all<T: FromArgument>(&mut self) -> Result<Vec<T>> {
        (0..self.remaining()).map(|_| self.next()).collect()
    }
}

fn plural(count: usize) -> String {
    match count {
        1 => "1 argument".to_string(),
        n => format!("{n} arguments"),
    }
}

/// Scope-aware directive lookup from one block
#[derive(Debug, Clone, Copy)]
pub struct ObjectBinder<'a> {
    arena: &'a Arena,
    object: ObjectId,
    mode: ScopeMode,
    required: bool,
}

impl<'a> ObjectBinder<'a> {
    /// Local and optional
    pub fn new(arena: &'a Arena, object: ObjectId) -> Self {
        Self {
            arena,
            object,
            mode: ScopeMode::Local,
            required: false,
        }
    }

    pub fn local(mut self) -> Self {
        self.mode = ScopeMode::Local;
        self
    }

    pub fn bound(mut self, key: Key) -> Self {
        self.mode = ScopeMode::Bound(key);
        self
    }

    pub fn global(mut self) -> Self {
        self.mode = ScopeMode::Global;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn object(&self) -> ObjectId {
        self.object
    }

    fn query<D: Directive>(&self) -> ScopeQuery {
        let mut query = ScopeQuery::new(D::KEY);
        query.mode = self.mode;
        query.required = self.required;
        query
    }

    /// The single visible instance
    pub fn one<D: Directive>(&self) -> Result<Option<D>> {
        let rules = self.query::<D>().one().fetch(self.arena, self.object)?;
        rules
            .first()
            .map(|rule| D::from_rule(self.arena, *rule))
            .transpose()
    }

    /// The single visible instance, which must exist
    pub fn expect<D: Directive>(&self) -> Result<D> {
        let rules = self
            .query::<D>()
            .one()
            .required()
            .fetch(self.arena, self.object)?;
        let rule = rules.first().copied().ok_or_else(|| {
            ParseError::missing(format!("missing `{}` directive", D::KEY))
                .attach_object(self.arena, self.object)
        })?;
        D::from_rule(self.arena, rule)
    }

    /// Every visible instance, outermost first
    pub fn each<D: Directive>(&self) -> Result<Vec<D>> {
        let rules = self.query::<D>().multiple().fetch(self.arena, self.object)?;
        rules
            .into_iter()
            .map(|rule| D::from_rule(self.arena, rule))
            .collect()
    }

    /// Every visible instance folded into one, inner rules last
    pub fn merged<D: Directive + Merge>(&self) -> Result<Option<D>> {
        let mut merged: Option<D> = None;
        for value in self.each::<D>()? {
            match merged.as_mut() {
                Some(current) => current.merge(value),
                None => merged = Some(value),
            }
        }
        Ok(merged)
    }
}
