//! Display languages supported by the catalog.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Language a response is localized into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    #[default]
    Ru,
    En,
}

impl Lang {
    pub const ALL: [Lang; 2] = [Lang::Ru, Lang::En];

    pub fn as_str(&self) -> &'static str {
        match self {
            Lang::Ru => "ru",
            Lang::En => "en",
        }
    }

    /// Resolves the `lang` query parameter. Missing or unknown codes fall
    /// back to Russian.
    pub fn resolve(requested: Option<&str>) -> Lang {
        requested
            .and_then(|code| code.parse().ok())
            .unwrap_or_default()
    }
}

impl FromStr for Lang {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ru" => Ok(Lang::Ru),
            "en" => Ok(Lang::En),
            _ => Err(format!("Unsupported language: {}", s)),
        }
    }
}

impl fmt::Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_explicit() {
        assert_eq!(Lang::resolve(Some("en")), Lang::En);
        assert_eq!(Lang::resolve(Some("ru")), Lang::Ru);
        assert_eq!(Lang::resolve(Some("EN")), Lang::En);
    }

    #[test]
    fn test_resolve_defaults_to_russian() {
        assert_eq!(Lang::resolve(None), Lang::Ru);
        assert_eq!(Lang::resolve(Some("")), Lang::Ru);
        assert_eq!(Lang::resolve(Some("tj")), Lang::Ru);
        assert_eq!(Lang::resolve(Some("english")), Lang::Ru);
    }

    #[test]
    fn test_display() {
        assert_eq!(Lang::En.to_string(), "en");
        assert_eq!(Lang::default().to_string(), "ru");
    }
}
