//! Scoped directive lookup
//!
//! Inner blocks see directives of the blocks around them. A [`ScopeQuery`]
//! decides how far up that visibility reaches, how many matches are
//! acceptable, and whether finding none is an error.

use crate::diagnostics::{ParseError, Result};
use crate::document::{Arena, Key, ObjectId, RuleId};

/// How far up the block chain a lookup may climb
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeMode {
    /// Only the queried block
    Local,
    /// Up to and including the block opened by the nearest directive with
    /// this key
    Bound(Key),
    /// All the way to the file scope
    Global,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Multiplicity {
    /// At most one rule; the search stops at the first level with a match
    One,
    Multiple,
}

/// Lookup policy for one directive key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeQuery {
    pub key: Key,
    pub mode: ScopeMode,
    pub multiplicity: Multiplicity,
    pub required: bool,
}

impl ScopeQuery {
    /// Local, single and optional
    pub fn new(key: Key) -> Self {
        Self {
            key,
            mode: ScopeMode::Local,
            multiplicity: Multiplicity::One,
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

    pub fn one(mut self) -> Self {
        self.multiplicity = Multiplicity::One;
        self
    }

    pub fn multiple(mut self) -> Self {
        self.multiplicity = Multiplicity::Multiple;
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

    /// Rules visible from `object`, outermost first.
    ///
    /// Missing-rule errors point at `object`.
    pub fn fetch(&self, arena: &Arena, object: ObjectId) -> Result<Vec<RuleId>> {
        self.collect(arena, object)
            .map_err(|e| e.attach_object(arena, object))
    }

    fn collect(&self, arena: &Arena, object: ObjectId) -> Result<Vec<RuleId>> {
        let mut rules = Vec::new();
        let mut current = object;

        loop {
            let level = arena[current].rules_for(self.key);
            rules.splice(0..0, level.iter().copied());

            let Some(opener) = arena[current].parent_rule else {
                break;
            };
            let stop = match self.mode {
                ScopeMode::Local => true,
                ScopeMode::Bound(key) => arena[opener].key == key,
                ScopeMode::Global => false,
            };
            if stop || (self.multiplicity == Multiplicity::One && !rules.is_empty()) {
                break;
            }
            current = arena[opener].parent;
        }

        if rules.is_empty() && self.required {
            return Err(ParseError::missing(format!("missing `{}` directive", self.key))
                .with_hint(format!("add a `{}` directive to this block", self.key)));
        }
        if self.multiplicity == Multiplicity::One && rules.len() > 1 {
            return Err(ParseError::duplicate(
                arena,
                rules[0],
                rules[1],
                format!("duplicate `{}` directive", self.key),
            )
            .with_hint(format!("only one `{}` is allowed in this scope", self.key)));
        }

        Ok(rules)
    }
}
