//! Display-mode preference.
//!
//! The preference is session-only and starts at `System`. Resolving it
//! consults the environment's dark-mode signal only when following the system.

use strum::{Display, EnumString};

/// User's display-mode choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum DisplayPreference {
    /// Always light
    Light,
    /// Always dark
    Dark,
    /// Follow the environment
    #[default]
    System,
}

impl DisplayPreference {
    /// Next preference in the `system -> light -> dark -> system` cycle
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::System => Self::Light,
            Self::Light => Self::Dark,
            Self::Dark => Self::System,
        }
    }

    /// Effective dark mode given the environment's current signal
    #[must_use]
    pub const fn resolve(self, environment_dark: bool) -> bool {
        match self {
            Self::Light => false,
            Self::Dark => true,
            Self::System => environment_dark,
        }
    }
}

/// Source of the environment's "is dark" signal
pub trait EnvironmentSignal: Send + Sync {
    /// Whether the environment currently prefers dark mode
    fn is_dark(&self) -> bool;
}

/// Reads the operating system's theme
///
/// Detection failures and unspecified modes count as light.
pub struct SystemThemeSignal;

impl EnvironmentSignal for SystemThemeSignal {
    fn is_dark(&self) -> bool {
        matches!(dark_light::detect(), Ok(dark_light::Mode::Dark))
    }
}

/// A signal that never changes
pub struct FixedSignal(pub bool);

impl EnvironmentSignal for FixedSignal {
    fn is_dark(&self) -> bool {
        self.0
    }
}

/// Session display preference with its environment signal
pub struct PreferenceState {
    preference: DisplayPreference,
    signal: Box<dyn EnvironmentSignal>,
}

impl PreferenceState {
    /// Preference starting at `System`, resolved against `signal`
    #[must_use]
    pub fn new(signal: Box<dyn EnvironmentSignal>) -> Self {
        Self {
            preference: DisplayPreference::default(),
            signal,
        }
    }

    /// Replaces the starting preference
    #[must_use]
    pub fn with_preference(mut self, preference: DisplayPreference) -> Self {
        self.preference = preference;
        self
    }

    /// Current preference
    #[must_use]
    pub const fn preference(&self) -> DisplayPreference {
        self.preference
    }

    /// Advances to the next preference and returns it
    pub fn toggle(&mut self) -> DisplayPreference {
        self.preference = self.preference.next();
        self.preference
    }

    /// Selects a preference explicitly
    pub fn set(&mut self, preference: DisplayPreference) {
        self.preference = preference;
    }

    /// Resolves the current preference against a given environment signal
    #[must_use]
    pub const fn resolve(&self, environment_dark: bool) -> bool {
        self.preference.resolve(environment_dark)
    }

    /// Resolves the current preference, querying the environment signal
    #[must_use]
    pub fn resolved_dark(&self) -> bool {
        match self.preference {
            DisplayPreference::System => self.signal.is_dark(),
            explicit => explicit.resolve(false),
        }
    }
}
