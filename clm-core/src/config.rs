//! Runtime configuration, loaded from TOML.
//!
//! Every field has a default so an empty file (or no file at all) is valid.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::Currency;

/// Training level. Decides storage key suffixes, default question types and
/// whether the holiday-pay calculation is offered.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(try_from = "u8", into = "u8")]
pub enum Level {
    #[default]
    Two,
    Three,
}

impl Level {
    /// Route path written to the session store on entry.
    pub fn path(&self) -> &'static str {
        match self {
            Level::Two => "/Level-Two-Part-Two",
            Level::Three => "/Level-Three-Quiz",
        }
    }

    /// Suffix of the per-level session keys (`questionOrder_2`, ...).
    pub fn suffix(&self) -> u8 {
        match self {
            Level::Two => 2,
            Level::Three => 3,
        }
    }

    /// Level three keeps the classifier's suggested input type; level two
    /// starts every question as plain text.
    pub fn suggests_types(&self) -> bool {
        matches!(self, Level::Three)
    }

    pub fn has_calculations(&self) -> bool {
        matches!(self, Level::Three)
    }
}

impl TryFrom<u8> for Level {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            2 => Ok(Level::Two),
            3 => Ok(Level::Three),
            other => Err(format!("unsupported level {other}, expected 2 or 3")),
        }
    }
}

impl From<Level> for u8 {
    fn from(level: Level) -> Self {
        level.suffix()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

/// CSS classes wrapped around substituted answers in the rendered document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HighlightStyle {
    pub light: String,
    pub dark: String,
}

impl Default for HighlightStyle {
    fn default() -> Self {
        Self {
            light: "bg-teal-200/70 text-teal-900 px-1 rounded".to_string(),
            dark: "bg-teal-600/70 text-teal-100 px-1 rounded".to_string(),
        }
    }
}

impl HighlightStyle {
    pub fn class_for(&self, theme: Theme) -> &str {
        match theme {
            Theme::Light => &self.light,
            Theme::Dark => &self.dark,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub level: Level,
    pub theme: Theme,
    pub default_currency: Currency,
    /// Delay before connector lines are recomputed after a resize or scroll.
    pub line_debounce_ms: u64,
    pub highlight: HighlightStyle,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            level: Level::default(),
            theme: Theme::default(),
            default_currency: Currency::Usd,
            line_debounce_ms: 100,
            highlight: HighlightStyle::default(),
        }
    }
}

impl Config {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.line_debounce_ms, 100);
    }

    #[test]
    fn test_partial_config() {
        let config = Config::from_toml_str(
            r#"
            level = 3
            theme = "dark"
            default_currency = "GBP"

            [highlight]
            dark = "hl-dark"
            "#,
        )
        .unwrap();

        assert_eq!(config.level, Level::Three);
        assert_eq!(config.theme, Theme::Dark);
        assert_eq!(config.default_currency, Currency::Gbp);
        assert_eq!(config.highlight.class_for(Theme::Dark), "hl-dark");
        assert_eq!(
            config.highlight.class_for(Theme::Light),
            HighlightStyle::default().light
        );
    }

    #[test]
    fn test_unknown_level_rejected() {
        assert!(Config::from_toml_str("level = 7").is_err());
    }
}
