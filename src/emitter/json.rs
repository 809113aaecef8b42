//! JSON output

use super::EmitterOptions;
use crate::diagnostics::SourceContext;
use crate::document::{Arena, ArgumentValue, Key, Keyword, ObjectId, RuleId};
use serde::Serialize;

/// Writes a resolved document as JSON
pub struct JsonEmitter {
    options: EmitterOptions,
}

#[derive(Serialize)]
struct JsonDocument<'a> {
    file: &'a str,
    rules: Vec<JsonRule<'a>>,
}

#[derive(Serialize)]
struct JsonRule<'a> {
    key: Key,
    /// `file:line:column` of the directive name
    location: String,
    /// Locations of the includes that brought the rule here, oldest first
    #[serde(skip_serializing_if = "Vec::is_empty")]
    included_via: Vec<String>,
    arguments: Vec<JsonValue<'a>>,
}

#[derive(Serialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
enum JsonValue<'a> {
    String(&'a str),
    Keyword(Keyword),
    Block(Vec<JsonRule<'a>>),
}

impl JsonEmitter {
    pub fn new(options: EmitterOptions) -> Self {
        Self { options }
    }

    /// Pretty-printed JSON for `object` and everything below it
    pub fn emit(&self, arena: &Arena, object: ObjectId) -> serde_json::Result<String> {
        let document = JsonDocument {
            file: &arena[arena[object].file].path,
            rules: self.rules(arena, object),
        };
        serde_json::to_string_pretty(&document)
    }

    fn rules<'a>(&self, arena: &'a Arena, object: ObjectId) -> Vec<JsonRule<'a>> {
        arena[object]
            .ordered_rules()
            .into_iter()
            .map(|rule| self.rule(arena, rule))
            .collect()
    }

    fn rule<'a>(&self, arena: &'a Arena, rule: RuleId) -> JsonRule<'a> {
        let node = &arena[rule];
        let included_via = if self.options.provenance {
            arena
                .lineage_of(rule)
                .into_iter()
                .map(|include| SourceContext::of_rule(arena, include).to_string())
                .collect()
        } else {
            Vec::new()
        };

        let arguments = node
            .arguments
            .iter()
            .map(|argument| match &arena[*argument].value {
                ArgumentValue::Str(text) => JsonValue::String(text.as_str()),
                ArgumentValue::Keyword(keyword) => JsonValue::Keyword(*keyword),
                ArgumentValue::Object(object) => JsonValue::Block(self.rules(arena, *object)),
            })
            .collect();

        JsonRule {
            key: node.key,
            location: SourceContext::of_rule(arena, rule).to_string(),
            included_via,
            arguments,
        }
    }
}
