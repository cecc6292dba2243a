//! Enforcement State Machine
//!
//! ```text
//! Idle
//!   ↓ page evaluated as blocked
//! Blocked ──── close ───→ Idle
//!   ↓ request access
//! AccessRequested ── countdown elapsed / close ──→ Idle
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnforcementState {
    /// No modal on screen
    Idle,
    /// Blocking modal shown
    Blocked,
    /// Request recorded, modal counting down to dismissal
    AccessRequested,
}

impl EnforcementState {
    /// Check if transition to another state is valid
    pub fn can_transition_to(&self, target: EnforcementState) -> bool {
        matches!(
            (self, target),
            (EnforcementState::Idle, EnforcementState::Blocked)
                | (EnforcementState::Blocked, EnforcementState::Idle)
                | (EnforcementState::Blocked, EnforcementState::AccessRequested)
                | (EnforcementState::AccessRequested, EnforcementState::Idle)
        )
    }

    pub fn is_modal_visible(&self) -> bool {
        !matches!(self, EnforcementState::Idle)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EnforcementState::Idle => "idle",
            EnforcementState::Blocked => "blocked",
            EnforcementState::AccessRequested => "access_requested",
        }
    }
}

impl std::fmt::Display for EnforcementState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
