//! Response shaping for multilingual entities.
//!
//! Public responses replace every multilingual field with the string for the
//! requested language. Admin responses (`includeRaw`) keep the normalized
//! `{ru, en}` objects and add a `_localized` sibling with the resolved
//! strings. Shaping works on plain JSON so any serialized entity, including
//! nested references and join rows, goes through the same rules.

use serde_json::{Map, Value};

use crate::models::language::Lang;
use crate::models::multilingual::parse_field;

/// Field names that hold multilingual text wherever they appear.
pub const MULTILINGUAL_FIELDS: [&str; 5] =
    ["title", "description", "shortDescription", "name", "address"];

/// Key of the resolved-strings sibling in raw mode.
pub const LOCALIZED_KEY: &str = "_localized";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShapeOptions {
    pub lang: Lang,
    pub include_raw: bool,
}

impl ShapeOptions {
    pub fn public(lang: Lang) -> Self {
        Self {
            lang,
            include_raw: false,
        }
    }

    pub fn raw(lang: Lang) -> Self {
        Self {
            lang,
            include_raw: true,
        }
    }
}

fn is_multilingual_key(key: &str) -> bool {
    MULTILINGUAL_FIELDS.contains(&key)
}

/// An object under a multilingual key is only treated as text when it is
/// keyed by language; anything else is a nested entity.
fn holds_text(value: &Value) -> bool {
    match value {
        Value::String(_) => true,
        Value::Object(map) => map.is_empty() || map.contains_key("ru") || map.contains_key("en"),
        _ => false,
    }
}

/// Shapes `value` for a response. Shaping an already shaped value with the
/// same options returns it unchanged.
pub fn shape_entity(value: Value, options: ShapeOptions) -> Value {
    match value {
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| shape_entity(item, options))
                .collect(),
        ),
        Value::Object(map) => Value::Object(shape_object(map, options)),
        other => other,
    }
}

fn shape_object(map: Map<String, Value>, options: ShapeOptions) -> Map<String, Value> {
    let mut shaped = Map::with_capacity(map.len() + 1);
    let mut localized = Map::new();

    for (key, value) in map {
        if key == LOCALIZED_KEY {
            // Recomputed below in raw mode, dropped in public mode.
            continue;
        }

        if is_multilingual_key(&key) && holds_text(&value) {
            let text = parse_field(&value);
            let resolved = text.localize(options.lang);
            if options.include_raw {
                localized.insert(key.clone(), Value::String(resolved));
                shaped.insert(key, text.to_value());
            } else {
                shaped.insert(key, Value::String(resolved));
            }
            continue;
        }

        shaped.insert(key, shape_entity(value, options));
    }

    if options.include_raw && !localized.is_empty() {
        shaped.insert(LOCALIZED_KEY.to_string(), Value::Object(localized));
    }

    shaped
}

/// Shapes every element of a list response.
pub fn shape_list<I>(items: I, options: ShapeOptions) -> Vec<Value>
where
    I: IntoIterator<Item = Value>,
{
    items
        .into_iter()
        .map(|item| shape_entity(item, options))
        .collect()
}
