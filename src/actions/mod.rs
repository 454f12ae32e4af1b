//! What happens to each duplicate.
//!
//! This module provides:
//! - The closed [`Action`] set, resolved once before scanning
//! - The [`ResultConsumer`](consumer::ResultConsumer) that drains the duplicate channel
//! - Safe deletion via the trash crate (see [`delete`])
//!
//! ```
//! use dupfind::actions::Action;
//!
//! let action: Action = "dontask".parse().unwrap();
//! assert_eq!(action, Action::DontAsk);
//!
//! let err = "delet".parse::<Action>().unwrap_err();
//! assert_eq!(err.suggestion(), Some("delete"));
//! ```

pub mod consumer;
pub mod delete;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use consumer::{ConsumerStats, ResultConsumer};
pub use delete::{delete_duplicate, DeleteConfig, DeleteError, DeleteResult};

/// Action applied to every duplicate pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Print `SIZE<TAB>PATH` of the duplicate.
    #[default]
    Print,
    /// Delete the duplicate, asking first unless told not to.
    Delete,
    /// Print the duplicate's path.
    Verbose,
    /// Print the duplicate's path.
    DontAsk,
}

impl Action {
    /// Every action, in help-text order.
    pub const ALL: [Self; 4] = [Self::Print, Self::Delete, Self::Verbose, Self::DontAsk];

    /// Name accepted on the command line.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Print => "print",
            Self::Delete => "delete",
            Self::Verbose => "verbose",
            Self::DontAsk => "dontask",
        }
    }

    /// Whether the action removes files.
    #[must_use]
    pub fn is_destructive(self) -> bool {
        self == Self::Delete
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An action name that is not in [`Action::ALL`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown action '{name}'{}", .suggestion.map(|s| format!(" (did you mean '{s}'?)")).unwrap_or_default())]
pub struct UnknownAction {
    name: String,
    suggestion: Option<&'static str>,
}

impl UnknownAction {
    /// The name that failed to parse.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Closest valid action name, if any is close enough.
    #[must_use]
    pub fn suggestion(&self) -> Option<&'static str> {
        self.suggestion
    }
}

impl FromStr for Action {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|action| action.name() == s)
            .ok_or_else(|| UnknownAction {
                name: s.to_string(),
                suggestion: closest_name(&s.trim().to_ascii_lowercase()),
            })
    }
}

/// Closest action name by Jaro-Winkler similarity, above a fixed cutoff.
fn closest_name(input: &str) -> Option<&'static str> {
    Action::ALL
        .into_iter()
        .map(|action| (action.name(), strsim::jaro_winkler(input, action.name())))
        .filter(|(_, score)| *score >= 0.8)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(name, _)| name)
}
