//! Common vocabulary types for toygen

use serde::{Deserialize, Serialize};

/// Variation tag of the central-value templates.
pub const NOMINAL: &str = "nominal";

/// Classification of a process in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProcessKind {
    /// Observed data.
    Data,
    /// Simulated background.
    #[serde(alias = "BKG")]
    Background,
    /// Simulated signal.
    #[serde(alias = "SIG")]
    Signal,
}

impl std::fmt::Display for ProcessKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ProcessKind::Data => "DATA",
            ProcessKind::Background => "BACKGROUND",
            ProcessKind::Signal => "SIGNAL",
        };
        f.write_str(s)
    }
}

/// Which postfit transfer functions are injected into the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitKind {
    /// Background-only fit (`b_` prefixed functions).
    #[default]
    #[serde(alias = "b")]
    BackgroundOnly,
    /// Signal-plus-background fit (`s_` prefixed functions).
    #[serde(alias = "s")]
    SignalPlusBackground,
}

impl FitKind {
    /// Name prefix of transfer functions from this fit.
    pub fn prefix(self) -> &'static str {
        match self {
            FitKind::BackgroundOnly => "b",
            FitKind::SignalPlusBackground => "s",
        }
    }

    /// Qualified transfer-function name, e.g. `b_2x1`.
    ///
    /// Names already carrying the prefix are returned unchanged.
    pub fn qualify(self, name: &str) -> String {
        let prefix = format!("{}_", self.prefix());
        if name.starts_with(&prefix) { name.to_string() } else { format!("{prefix}{name}") }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn process_kind_accepts_short_aliases() {
        let k: ProcessKind = serde_json::from_str("\"BKG\"").unwrap();
        assert_eq!(k, ProcessKind::Background);
        let k: ProcessKind = serde_json::from_str("\"DATA\"").unwrap();
        assert_eq!(k, ProcessKind::Data);
        assert_eq!(serde_json::to_string(&ProcessKind::Signal).unwrap(), "\"SIGNAL\"");
    }

    #[test]
    fn fit_kind_qualifies_names_once() {
        assert_eq!(FitKind::BackgroundOnly.qualify("2x1"), "b_2x1");
        assert_eq!(FitKind::BackgroundOnly.qualify("b_2x1"), "b_2x1");
        assert_eq!(FitKind::SignalPlusBackground.qualify("2x1"), "s_2x1");
        let k: FitKind = serde_json::from_str("\"s\"").unwrap();
        assert_eq!(k, FitKind::SignalPlusBackground);
    }
}
