//! Multilingual text fields.
//!
//! Translatable attributes are stored as one JSON object keyed by language
//! code (`{"ru": "...", "en": "..."}`). Rows written before that format was
//! introduced may still hold a JSON-encoded string or a bare string, so every
//! read goes through [`StoredText::from_value`], which absorbs all three shapes
//! and never fails.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::language::Lang;

/// A text value with one optional variant per supported language.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct MultilingualText {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ru: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub en: Option<String>,
}

impl MultilingualText {
    pub fn new(ru: impl Into<String>, en: impl Into<String>) -> Self {
        Self {
            ru: Some(ru.into()),
            en: Some(en.into()),
        }
    }

    /// Same string for every language; used for legacy single-language data.
    pub fn mirrored(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            ru: Some(value.clone()),
            en: Some(value),
        }
    }

    /// Returns the variant for `lang` if it holds non-blank text.
    pub fn get(&self, lang: Lang) -> Option<&str> {
        let slot = match lang {
            Lang::Ru => &self.ru,
            Lang::En => &self.en,
        };
        slot.as_deref().filter(|s| !s.trim().is_empty())
    }

    /// Resolves to a single display string: requested language, then
    /// Russian, then English, then empty.
    pub fn localize(&self, lang: Lang) -> String {
        self.get(lang)
            .or_else(|| self.get(Lang::Ru))
            .or_else(|| self.get(Lang::En))
            .unwrap_or_default()
            .to_string()
    }

    /// True when no language has non-blank text.
    pub fn is_blank(&self) -> bool {
        Lang::ALL.iter().all(|lang| self.get(*lang).is_none())
    }

    /// Languages without non-blank text.
    pub fn missing_languages(&self) -> Vec<Lang> {
        Lang::ALL
            .iter()
            .copied()
            .filter(|lang| self.get(*lang).is_none())
            .collect()
    }

    /// Appends `suffix` to every present variant.
    pub fn with_suffix(&self, suffix: &str) -> Self {
        Self {
            ru: self.ru.as_ref().map(|s| format!("{}{}", s, suffix)),
            en: self.en.as_ref().map(|s| format!("{}{}", s, suffix)),
        }
    }

    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        if let Some(ru) = &self.ru {
            map.insert("ru".into(), Value::String(ru.clone()));
        }
        if let Some(en) = &self.en {
            map.insert("en".into(), Value::String(en.clone()));
        }
        Value::Object(map)
    }

    fn from_object(map: &Map<String, Value>) -> Self {
        Self {
            ru: map.get("ru").and_then(scalar_to_string),
            en: map.get("en").and_then(scalar_to_string),
        }
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

impl From<Value> for MultilingualText {
    fn from(value: Value) -> Self {
        parse_field(&value)
    }
}

impl From<&str> for MultilingualText {
    fn from(value: &str) -> Self {
        parse_field(&Value::String(value.to_string()))
    }
}

/// A stored multilingual value, tagged by the shape it was found in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredText {
    /// Already a JSON object.
    Parsed(MultilingualText),
    /// A JSON-encoded object inside a string.
    Raw(MultilingualText),
    /// Plain text from before multilingual storage; treated as Russian.
    Legacy(String),
}

impl StoredText {
    /// Classifies any JSON value. Never fails: anything that is not an object
    /// or an encoded object becomes legacy text.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Object(map) => StoredText::Parsed(MultilingualText::from_object(map)),
            Value::Null => StoredText::Parsed(MultilingualText::default()),
            Value::String(s) => match serde_json::from_str::<Value>(s) {
                Ok(Value::Object(map)) => StoredText::Raw(MultilingualText::from_object(&map)),
                _ => StoredText::Legacy(s.clone()),
            },
            other => StoredText::Legacy(other.to_string()),
        }
    }

    pub fn into_text(self) -> MultilingualText {
        match self {
            StoredText::Parsed(text) | StoredText::Raw(text) => text,
            StoredText::Legacy(s) => MultilingualText::mirrored(s),
        }
    }
}

/// Normalizes a stored value (object, encoded string or plain string).
pub fn parse_field(value: &Value) -> MultilingualText {
    StoredText::from_value(value).into_text()
}

/// Parses and resolves a stored value to one display string.
pub fn localize_field(value: &Value, lang: Lang) -> String {
    parse_field(value).localize(lang)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_object() {
        let text = parse_field(&json!({"ru": "Памир", "en": "Pamir"}));
        assert_eq!(text, MultilingualText::new("Памир", "Pamir"));
    }

    #[test]
    fn test_parse_encoded_string() {
        let stored = json!(r#"{"ru":"Фанские горы","en":"Fann Mountains"}"#);
        assert!(matches!(StoredText::from_value(&stored), StoredText::Raw(_)));
        let text = parse_field(&stored);
        assert_eq!(text.en.as_deref(), Some("Fann Mountains"));
        assert_eq!(text.ru.as_deref(), Some("Фанские горы"));
    }

    #[test]
    fn test_parse_legacy_string_mirrors_into_english() {
        let stored = json!("Искандеркуль");
        assert!(matches!(
            StoredText::from_value(&stored),
            StoredText::Legacy(_)
        ));
        let text = parse_field(&stored);
        assert_eq!(text.ru.as_deref(), Some("Искандеркуль"));
        assert_eq!(text.en.as_deref(), Some("Искандеркуль"));
    }

    #[test]
    fn test_parse_never_panics_on_odd_input() {
        for value in [
            json!("{not json"),
            json!("[1,2,3]"),
            json!("\"quoted\""),
            json!(42),
            json!(true),
            json!([1, "a"]),
            json!(null),
            json!({"ru": 5, "en": null, "tj": "x"}),
            json!(""),
        ] {
            let _ = parse_field(&value);
        }
        assert_eq!(
            parse_field(&json!("\"quoted\"")).ru.as_deref(),
            Some("\"quoted\"")
        );
        assert_eq!(parse_field(&json!({"ru": 5})).ru.as_deref(), Some("5"));
    }

    #[test]
    fn test_localize_priority() {
        let both = json!({"ru": "Душанбе", "en": "Dushanbe"});
        assert_eq!(localize_field(&both, Lang::En), "Dushanbe");
        assert_eq!(localize_field(&both, Lang::Ru), "Душанбе");

        let ru_only = json!({"ru": "Худжанд"});
        assert_eq!(localize_field(&ru_only, Lang::En), "Худжанд");

        let en_only = json!({"en": "Khorog"});
        assert_eq!(localize_field(&en_only, Lang::Ru), "Khorog");
    }

    #[test]
    fn test_localize_skips_blank_variants() {
        let value = json!({"ru": "Тур", "en": ""});
        assert_eq!(localize_field(&value, Lang::En), "Тур");

        let value = json!({"ru": "  ", "en": "Tour"});
        assert_eq!(localize_field(&value, Lang::Ru), "Tour");
    }

    #[test]
    fn test_localize_empty_object_is_empty_string() {
        assert_eq!(localize_field(&json!({}), Lang::En), "");
        assert_eq!(localize_field(&json!(null), Lang::Ru), "");
    }

    #[test]
    fn test_localize_non_empty_when_any_variant_present() {
        let samples = [
            json!({"ru": "a"}),
            json!({"en": "b"}),
            json!({"ru": "", "en": "c"}),
            json!("legacy"),
            json!(r#"{"en":"encoded"}"#),
        ];
        for sample in samples {
            for lang in Lang::ALL {
                assert!(!localize_field(&sample, lang).is_empty(), "{sample} / {lang}");
            }
        }
    }

    #[test]
    fn test_missing_languages() {
        let text = MultilingualText {
            ru: Some("Тур".into()),
            en: Some(" ".into()),
        };
        assert_eq!(text.missing_languages(), vec![Lang::En]);
        assert!(!text.is_blank());
        assert!(MultilingualText::default().is_blank());
    }

    #[test]
    fn test_with_suffix_only_touches_present_variants() {
        let text = MultilingualText {
            ru: Some("Памир".into()),
            en: None,
        };
        let copy = text.with_suffix(" (Copy)");
        assert_eq!(copy.ru.as_deref(), Some("Памир (Copy)"));
        assert!(copy.en.is_none());
    }

    #[test]
    fn test_deserialize_accepts_every_shape() {
        let object: MultilingualText = serde_json::from_value(json!({"ru": "а", "en": "a"})).unwrap();
        let encoded: MultilingualText =
            serde_json::from_value(json!(r#"{"ru":"а","en":"a"}"#)).unwrap();
        let legacy: MultilingualText = serde_json::from_value(json!("а")).unwrap();

        assert_eq!(object, encoded);
        assert_eq!(legacy, MultilingualText::mirrored("а"));
    }

    #[test]
    fn test_serialize_skips_missing_languages() {
        let text = MultilingualText {
            ru: Some("Тур".into()),
            en: None,
        };
        assert_eq!(serde_json::to_value(&text).unwrap(), json!({"ru": "Тур"}));
        assert_eq!(text.to_value(), json!({"ru": "Тур"}));
    }
}
