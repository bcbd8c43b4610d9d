//! Physical emission components with a closed-form frequency response.
//!
//! The theoretical model knows three components. Empirical builds accept any
//! component name that has a file template, so they work with plain strings.

use std::fmt;

/// Default column order of the mixing matrix.
pub const DEFAULT_COMPONENTS_ORDER: [&str; 3] = ["cmb", "tsz", "sync"];

/// A fresh copy of [`DEFAULT_COMPONENTS_ORDER`] as owned names.
pub fn default_components_order() -> Vec<String> {
    DEFAULT_COMPONENTS_ORDER
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Lowercase a requested component order.
pub(crate) fn normalize_order<S: AsRef<str>>(order: &[S]) -> Vec<String> {
    order.iter().map(|c| c.as_ref().to_lowercase()).collect()
}

/// Components supported by the theoretical response model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    /// CMB anisotropies: unit response in thermodynamic units.
    Cmb,
    /// Thermal Sunyaev-Zel'dovich effect.
    Tsz,
    /// Galactic synchrotron: a power law in antenna temperature.
    Sync,
}

impl Component {
    pub const ALL: [Component; 3] = [Component::Cmb, Component::Tsz, Component::Sync];

    pub fn name(&self) -> &'static str {
        match self {
            Component::Cmb => "cmb",
            Component::Tsz => "tsz",
            Component::Sync => "sync",
        }
    }

    /// Case-insensitive lookup; `None` for names outside the model.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_roundtrip() {
        for c in Component::ALL {
            assert_eq!(Component::from_name(c.name()), Some(c));
        }
        assert_eq!(Component::from_name("TSZ"), Some(Component::Tsz));
        assert_eq!(Component::from_name("dust"), None);
        assert_eq!(default_components_order(), vec!["cmb", "tsz", "sync"]);
    }
}
