//! Configuration text output

use super::EmitterOptions;
use crate::diagnostics::SourceContext;
use crate::document::{Arena, ArgumentValue, Keyword, ObjectId, RuleId};
use std::fmt::{self, Write};

/// Writes a resolved document as configuration text
pub struct TextEmitter {
    options: EmitterOptions,
}

impl TextEmitter {
    pub fn new(options: EmitterOptions) -> Self {
        Self { options }
    }

    /// Render every rule of `object`, nested blocks indented
    pub fn emit(&self, arena: &Arena, object: ObjectId) -> String {
        Dump {
            emitter: self,
            arena,
            object,
        }
        .to_string()
    }

    fn emit_object<W: Write>(&self, out: &mut W, arena: &Arena, object: ObjectId, depth: usize) -> fmt::Result {
        for rule in arena[object].ordered_rules() {
            self.emit_rule(out, arena, rule, depth)?;
        }
        Ok(())
    }

    fn emit_rule<W: Write>(&self, out: &mut W, arena: &Arena, rule: RuleId, depth: usize) -> fmt::Result {
        let indent = self.options.indent.repeat(depth);
        let node = &arena[rule];

        if self.options.provenance && node.is_included() {
            let origin = SourceContext::of_rule(arena, rule);
            writeln!(out, "{indent}# via {}:{}", origin.file, origin.line_number)?;
        }

        write!(out, "{indent}{}", node.key)?;
        let mut block = None;
        for argument in &node.arguments {
            match &arena[*argument].value {
                ArgumentValue::Str(text) => write!(out, " {}", quote(text))?,
                ArgumentValue::Keyword(keyword) => write!(out, " {keyword}")?,
                ArgumentValue::Object(object) => block = Some(*object),
            }
        }

        match block {
            Some(object) => {
                writeln!(out, " {{")?;
                self.emit_object(out, arena, object, depth + 1)?;
                writeln!(out, "{indent}}}")
            }
            None => writeln!(out, ";"),
        }
    }
}

struct Dump<'a> {
    emitter: &'a TextEmitter,
    arena: &'a Arena,
    object: ObjectId,
}

impl fmt::Display for Dump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.emitter.emit_object(f, self.arena, self.object, 0)
    }
}

/// Quote `text` when it would not read back as the same plain string
fn quote(text: &str) -> String {
    let plain = !text.is_empty()
        && Keyword::from_word(text).is_none()
        && !text
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '{' | '}' | ';' | '#' | '\'' | '"'));
    if plain {
        return text.to_string();
    }
    let mark = if text.contains('"') { '\'' } else { '"' };
    format!("{mark}{text}{mark}")
}
