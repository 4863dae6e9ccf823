//! Navigation states.

use std::fmt;

use serde::Serialize;

/// Router-level navigation state.
///
/// ```text
/// Idle → Matching → Guarding → Loading → Transitioning → Committing → Idle
///           ↑          │          │
///           └──────────┴──────────┘  redirect / suspension
/// Matching | Guarding | Loading | Transitioning → Failed | Cancelled
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NavigationState {
    #[default]
    Idle,
    Matching,
    Guarding,
    Loading,
    Transitioning,
    Committing,
    Cancelled,
    Failed,
}

impl NavigationState {
    pub fn as_str(self) -> &'static str {
        match self {
            NavigationState::Idle => "idle",
            NavigationState::Matching => "matching",
            NavigationState::Guarding => "guarding",
            NavigationState::Loading => "loading",
            NavigationState::Transitioning => "transitioning",
            NavigationState::Committing => "committing",
            NavigationState::Cancelled => "cancelled",
            NavigationState::Failed => "failed",
        }
    }

    /// Whether no navigation is in progress.
    pub fn is_settled(self) -> bool {
        matches!(
            self,
            NavigationState::Idle | NavigationState::Cancelled | NavigationState::Failed
        )
    }

    pub fn can_transition_to(self, next: NavigationState) -> bool {
        use NavigationState::*;
        match (self, next) {
            // A new navigation may start from any state; it supersedes the old one.
            (_, Matching) => true,
            (Matching, Guarding) => true,
            (Guarding, Loading) => true,
            (Loading, Transitioning | Committing) => true,
            (Transitioning, Committing) => true,
            (Committing, Idle) => true,
            (Matching | Guarding | Loading | Transitioning, Failed | Cancelled) => true,
            _ => false,
        }
    }
}

impl fmt::Display for NavigationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
