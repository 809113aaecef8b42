//! `define` and `include`
//!
//! `define <name> { ... }` registers a block under a name. `include <target>`
//! resolves a name or a file path (loading the file on first use) and
//! deep-copies every rule of the target into the including block. Copies
//! remember the `include` that produced them so diagnostics can show how a
//! rule got where it is.

use super::source::is_glob;
use super::ConfigParser;
use crate::diagnostics::{ErrorKind, ParseError, Result};
use crate::document::{Argument, ArgumentId, ArgumentValue, Object, ObjectId, Rule, RuleId};
use tracing::debug;

const DEFINE_FORMAT: &str = "define <name> { ... }";
const INCLUDE_FORMAT: &str = "include <path-or-name>";

impl ConfigParser {
    pub(super) fn handle_define(&mut self, rule: RuleId) -> Result<()> {
        let arguments = self.arena[rule].arguments.clone();
        if arguments.len() != 2 {
            return Err(self.count_error(rule, 2, DEFINE_FORMAT));
        }

        let name = self.string_argument(arguments[0], DEFINE_FORMAT)?;
        let Some(block) = self.arena[arguments[1]].value.as_object() else {
            return Err(self.type_error(arguments[1], "a block", DEFINE_FORMAT));
        };

        if self.objects.contains_key(&name) {
            return Err(ParseError::at_argument(
                &self.arena,
                ErrorKind::DuplicateDefine,
                arguments[0],
                format!("an object named `{name}` already exists"),
            )
            .with_hint("give the object a different, unique name"));
        }

        let file = self.arena[self.arena[rule].token].file;
        if self.arena[file].path == name {
            return Err(ParseError::at_argument(
                &self.arena,
                ErrorKind::DefineShadowsFile,
                arguments[0],
                "an object cannot be named after the file it is defined in",
            )
            .with_hint("choose a name that is not a configuration file path"));
        }

        debug!(name = name.as_str(), "registered define");
        self.objects.insert(name, block);
        Ok(())
    }

    pub(super) fn handle_include(&mut self, rule: RuleId, object: ObjectId) -> Result<()> {
        let arguments = self.arena[rule].arguments.clone();
        if arguments.len() != 1 {
            return Err(self.count_error(rule, 1, INCLUDE_FORMAT));
        }
        let target = self.string_argument(arguments[0], INCLUDE_FORMAT)?;

        if let Some(source) = self.objects.get(&target).copied() {
            self.merge(object, source, rule);
            return Ok(());
        }

        if self.options.expand_globs && is_glob(&target) {
            let paths = self.source.expand(&target).map_err(|e| {
                ParseError::at_argument(
                    &self.arena,
                    ErrorKind::IncludeNotFound,
                    arguments[0],
                    format!("invalid include pattern `{target}`: {e}"),
                )
            })?;
            debug!(pattern = target.as_str(), matches = paths.len(), "expanded include glob");
            for path in paths {
                if self.files.contains_key(&path) && !self.objects.contains_key(&path) {
                    return Err(ParseError::at_argument(
                        &self.arena,
                        ErrorKind::CircularImport,
                        arguments[0],
                        format!(
                            "include pattern `{target}` matches `{path}`, which is still being loaded"
                        ),
                    )
                    .with_hint("narrow the pattern so it does not match the including file"));
                }
                let source = self.resolve_file(&path, rule)?;
                self.merge(object, source, rule);
            }
            return Ok(());
        }

        if !self.source.exists(&target) {
            return Err(ParseError::at_argument(
                &self.arena,
                ErrorKind::IncludeNotFound,
                arguments[0],
                format!("included object or file `{target}` not found"),
            )
            .with_hint(format!(
                "define it first with `define {target} {{ ... }}`, or check the file path"
            )));
        }

        let source = self.resolve_file(&target, rule)?;
        self.merge(object, source, rule);
        Ok(())
    }

    /// Root object of `path`, loading the file if it has not been yet
    fn resolve_file(&mut self, path: &str, include: RuleId) -> Result<ObjectId> {
        if let Some(object) = self.objects.get(path).copied() {
            return Ok(object);
        }
        self.load_file(path)
            .map_err(|e| e.with_include_frame(&self.arena, include))
    }

    /// Deep-copy every rule of `source` into `destination`
    fn merge(&mut self, destination: ObjectId, source: ObjectId, include: RuleId) {
        let rules = self.arena[source].ordered_rules();
        for original in &rules {
            let copy = self.copy_rule(*original, destination);
            let lineage = self.arena[copy].lineage;
            self.arena[copy].lineage = Some(self.arena.extend_lineage(lineage, include));
            let key = self.arena[copy].key;
            self.arena[destination].push_rule(key, copy);
        }
        debug!(rules = rules.len(), "merged include");
    }

    fn copy_rule(&mut self, original: RuleId, parent: ObjectId) -> RuleId {
        let source = &self.arena[original];
        let mut rule = Rule::new(source.key, parent, source.token);
        rule.lineage = source.lineage;
        let arguments = source.arguments.clone();

        let copy = self.arena.alloc_rule(rule);
        for argument in arguments {
            let argument = self.copy_argument(argument, copy);
            self.arena[copy].arguments.push(argument);
        }
        copy
    }

    fn copy_argument(&mut self, original: ArgumentId, rule: RuleId) -> ArgumentId {
        let Argument { value, token, .. } = self.arena[original].clone();
        let value = match value {
            ArgumentValue::Object(object) => ArgumentValue::Object(self.copy_object(object, rule)),
            other => other,
        };
        self.arena.alloc_argument(Argument { value, rule, token })
    }

    fn copy_object(&mut self, original: ObjectId, parent_rule: RuleId) -> ObjectId {
        let source = self.arena[original].clone();
        let mut object = Object::new(source.file, Some(parent_rule), source.open);
        object.close = source.close;

        let copy = self.arena.alloc_object(object);
        for rule in source.ordered_rules() {
            let rule = self.copy_rule(rule, copy);
            let key = self.arena[rule].key;
            self.arena[copy].push_rule(key, rule);
        }
        copy
    }

    fn string_argument(&self, argument: ArgumentId, format: &str) -> Result<String> {
        match &self.arena[argument].value {
            ArgumentValue::Str(value) => Ok(value.clone()),
            _ => Err(self.type_error(argument, "a string", format)),
        }
    }

    fn count_error(&self, rule: RuleId, expected: usize, format: &str) -> ParseError {
        let key = self.arena[rule].key;
        let found = self.arena[rule].arguments.len();
        ParseError::at_rule(
            &self.arena,
            ErrorKind::ArgumentCount,
            rule,
            format!("`{key}` expects {expected} argument(s), found {found}"),
        )
        .with_hint(format!("expected format: {format}"))
    }

    fn type_error(&self, argument: ArgumentId, expected: &str, format: &str) -> ParseError {
        let found = self.arena[argument].value.type_name();
        ParseError::at_argument(
            &self.arena,
            ErrorKind::ArgumentType,
            argument,
            format!("expected {expected}, found a {found}"),
        )
        .with_hint(format!("expected format: {format}"))
    }
}
