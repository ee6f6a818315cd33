//! Persisted UI preferences. Currently just the theme.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::storage::{load_json_or_default, save_json_logged, KeyValueStore, THEME_KEY};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(&self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Theme::Light => write!(f, "light"),
            Theme::Dark => write!(f, "dark"),
        }
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(format!("unknown theme: {}", other)),
        }
    }
}

pub struct Preferences {
    store: Arc<dyn KeyValueStore>,
    theme: Theme,
}

impl Preferences {
    /// Load the saved theme, falling back to `Theme::Light`.
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let theme = load_json_or_default(store.as_ref(), THEME_KEY);
        Self { store, theme }
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
        save_json_logged(self.store.as_ref(), THEME_KEY, &theme);
        info!(%theme, "Theme changed");
    }

    pub fn toggle_theme(&mut self) -> Theme {
        let theme = self.theme.toggled();
        self.set_theme(theme);
        theme
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn test_default_is_light() {
        let prefs = Preferences::load(Arc::new(MemoryStore::new()));
        assert_eq!(prefs.theme(), Theme::Light);
    }

    #[test]
    fn test_toggle_persists() {
        let store = Arc::new(MemoryStore::new());
        let mut prefs = Preferences::load(store.clone());
        assert_eq!(prefs.toggle_theme(), Theme::Dark);

        let reloaded = Preferences::load(store);
        assert_eq!(reloaded.theme(), Theme::Dark);
    }

    #[test]
    fn test_theme_from_str() {
        assert_eq!("Dark".parse::<Theme>(), Ok(Theme::Dark));
        assert_eq!("light".parse::<Theme>(), Ok(Theme::Light));
        assert!("sepia".parse::<Theme>().is_err());
    }
}
