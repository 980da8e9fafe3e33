use eframe::egui::{Context, Theme};
use tracing::info;

use crate::storage::{PreferenceStore, StoreError};

pub const THEME_STORAGE_KEY: &str = "theme-preference";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ThemePreference {
    #[default]
    Dark,
    Light,
}

impl ThemePreference {
    pub fn storage_id(self) -> &'static str {
        match self {
            ThemePreference::Dark => "dark-theme",
            ThemePreference::Light => "light-theme",
        }
    }

    /// Unrecognised stored values fall back to the default variant.
    pub fn from_storage_id(raw: &str) -> Self {
        match raw {
            "light-theme" => ThemePreference::Light,
            _ => ThemePreference::Dark,
        }
    }

    pub fn from_toggle(checked: bool) -> Self {
        if checked {
            ThemePreference::Dark
        } else {
            ThemePreference::Light
        }
    }

    pub fn is_dark(self) -> bool {
        self == ThemePreference::Dark
    }
}

/// Whatever the chosen variant gets painted onto.
pub trait ThemeTarget {
    fn apply_theme(&self, theme: ThemePreference);
}

impl ThemeTarget for Context {
    fn apply_theme(&self, theme: ThemePreference) {
        self.set_theme(if theme.is_dark() {
            Theme::Dark
        } else {
            Theme::Light
        });
    }
}

pub struct ThemeManager {
    store: Box<dyn PreferenceStore>,
    toggle_checked: bool,
}

impl ThemeManager {
    pub fn new(store: Box<dyn PreferenceStore>) -> Self {
        Self {
            store,
            toggle_checked: ThemePreference::default().is_dark(),
        }
    }

    pub fn toggle_checked(&self) -> bool {
        self.toggle_checked
    }

    /// Applies the saved preference, or the dark variant when none is stored.
    /// A failing store still leaves the default applied.
    pub fn initialize(&mut self, target: &impl ThemeTarget) -> Result<(), StoreError> {
        let stored = self.store.get(THEME_STORAGE_KEY);
        let theme = match &stored {
            Ok(Some(raw)) => ThemePreference::from_storage_id(raw),
            _ => ThemePreference::default(),
        };
        self.apply(theme, target);
        stored.map(|_| ())
    }

    pub fn on_toggle(
        &mut self,
        checked: bool,
        target: &impl ThemeTarget,
    ) -> Result<(), StoreError> {
        let theme = ThemePreference::from_toggle(checked);
        self.apply(theme, target);
        info!(theme = theme.storage_id(), "theme changed");
        self.store.set(THEME_STORAGE_KEY, theme.storage_id())
    }

    fn apply(&mut self, theme: ThemePreference, target: &impl ThemeTarget) {
        target.apply_theme(theme);
        self.toggle_checked = theme.is_dark();
    }
}
