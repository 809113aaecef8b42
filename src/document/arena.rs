//! Arena storage for every node produced while parsing
//!
//! Nodes point at their parents as well as their children, so nothing here
//! owns anything else: the arena owns every node of a parse session and hands
//! out small copyable handles. All nodes are released together when the
//! arena is dropped.

use super::{Argument, ConfigFile, LineageLink, Object, Rule, Token};
use std::ops::{Index, IndexMut};

macro_rules! node_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(usize);
    };
}

node_id!(
    /// Handle to a [`Token`]
    TokenId
);
node_id!(
    /// Handle to a [`ConfigFile`]
    FileId
);
node_id!(
    /// Handle to an [`Object`]
    ObjectId
);
node_id!(
    /// Handle to a [`Rule`]
    RuleId
);
node_id!(
    /// Handle to an [`Argument`]
    ArgumentId
);
node_id!(
    /// Handle to one link of an inclusion lineage
    LineageId
);

/// Exclusive owner of all parse-tree nodes of one session
#[derive(Debug, Default)]
pub struct Arena {
    tokens: Vec<Token>,
    files: Vec<ConfigFile>,
    objects: Vec<Object>,
    rules: Vec<Rule>,
    arguments: Vec<Argument>,
    lineage: Vec<LineageLink>,
}

macro_rules! arena_store {
    ($field:ident, $id:ident, $node:ty, $alloc:ident) => {
        impl Index<$id> for Arena {
            type Output = $node;

            fn index(&self, id: $id) -> &$node {
                &self.$field[id.0]
            }
        }

        impl IndexMut<$id> for Arena {
            fn index_mut(&mut self, id: $id) -> &mut $node {
                &mut self.$field[id.0]
            }
        }

        impl Arena {
            pub fn $alloc(&mut self, node: $node) -> $id {
                self.$field.push(node);
                $id(self.$field.len() - 1)
            }
        }
    };
}

arena_store!(tokens, TokenId, Token, alloc_token);
arena_store!(files, FileId, ConfigFile, alloc_file);
arena_store!(objects, ObjectId, Object, alloc_object);
arena_store!(rules, RuleId, Rule, alloc_rule);
arena_store!(arguments, ArgumentId, Argument, alloc_argument);
arena_store!(lineage, LineageId, LineageLink, alloc_lineage);

impl Arena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `include` to a lineage, producing a new tail.
    ///
    /// The existing chain is shared, never copied.
    pub fn extend_lineage(&mut self, tail: Option<LineageId>, include: RuleId) -> LineageId {
        self.alloc_lineage(LineageLink {
            include,
            previous: tail,
        })
    }

    /// Include rules responsible for `rule`, oldest first
    pub fn lineage_of(&self, rule: RuleId) -> Vec<RuleId> {
        let mut chain = Vec::new();
        let mut link = self[rule].lineage;
        while let Some(id) = link {
            chain.push(self[id].include);
            link = self[id].previous;
        }
        chain.reverse();
        chain
    }

    /// Nested block carried by `rule`, if its last argument is one
    pub fn block_of(&self, rule: RuleId) -> Option<ObjectId> {
        self[rule]
            .arguments
            .last()
            .and_then(|arg| self[*arg].value.as_object())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Key, TokenKind};

    fn scaffold() -> (Arena, ObjectId, TokenId) {
        let mut arena = Arena::new();
        let file = arena.alloc_file(ConfigFile::new("test.conf", "a;\n"));
        let token = arena.alloc_token(Token::new(TokenKind::Text, "a", file, 0));
        let object = arena.alloc_object(Object::new(file, None, token));
        (arena, object, token)
    }

    #[test]
    fn test_handles_index_their_store() {
        let (mut arena, object, token) = scaffold();
        let rule = arena.alloc_rule(Rule::new(Key::Root, object, token));
        arena[object].push_rule(Key::Root, rule);

        assert_eq!(arena[rule].key, Key::Root);
        assert_eq!(arena[object].rules_for(Key::Root), &[rule]);
        assert_eq!(arena[arena[rule].token].value, "a");
    }

    #[test]
    fn test_lineage_is_shared_and_ordered() {
        let (mut arena, object, token) = scaffold();
        let first = arena.alloc_rule(Rule::new(Key::Include, object, token));
        let second = arena.alloc_rule(Rule::new(Key::Include, object, token));
        let copy = arena.alloc_rule(Rule::new(Key::Root, object, token));
        let other = arena.alloc_rule(Rule::new(Key::Root, object, token));

        let tail = arena.extend_lineage(None, first);
        arena[copy].lineage = Some(arena.extend_lineage(Some(tail), second));
        arena[other].lineage = Some(tail);

        assert_eq!(arena.lineage_of(copy), vec![first, second]);
        assert_eq!(arena.lineage_of(other), vec![first]);
        assert!(arena.lineage_of(first).is_empty());
    }
}
