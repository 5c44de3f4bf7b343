//! Dark-mode preference persistence.
//!
//! The preference lives under its own key, next to (not inside) the notes
//! map. Stored values are `enabled` / `disabled`; anything else counts as
//! unset and defers to the system preference.

use crate::store::{KvBackend, KvStore, StoreResult, DARK_MODE_KEY};
use log::info;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeMode {
    Light,
    Dark,
}

impl ThemeMode {
    pub fn from_stored(value: &str) -> Option<Self> {
        match value {
            "enabled" => Some(Self::Dark),
            "disabled" => Some(Self::Light),
            _ => None,
        }
    }

    pub fn as_stored(self) -> &'static str {
        match self {
            Self::Dark => "enabled",
            Self::Light => "disabled",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }

    /// Saved preference wins; otherwise follow the system setting.
    pub fn resolve(saved: Option<Self>, system_prefers_dark: bool) -> Self {
        saved.unwrap_or(if system_prefers_dark {
            Self::Dark
        } else {
            Self::Light
        })
    }
}

impl Display for ThemeMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Light => f.write_str("light"),
            Self::Dark => f.write_str("dark"),
        }
    }
}

pub fn saved_theme<B: KvBackend>(store: &KvStore<B>) -> Option<ThemeMode> {
    store
        .get_text(DARK_MODE_KEY)
        .and_then(|value| ThemeMode::from_stored(value.trim()))
}

pub fn current_theme<B: KvBackend>(store: &KvStore<B>, system_prefers_dark: bool) -> ThemeMode {
    ThemeMode::resolve(saved_theme(store), system_prefers_dark)
}

/// Flips the effective theme and persists the result.
pub fn toggle_theme<B: KvBackend>(
    store: &mut KvStore<B>,
    system_prefers_dark: bool,
) -> StoreResult<ThemeMode> {
    let next = current_theme(store, system_prefers_dark).toggled();
    store.set_text(DARK_MODE_KEY, next.as_stored())?;
    info!(
        "event=theme_toggle module=theme status=ok mode={}",
        next.as_stored()
    );
    Ok(next)
}
