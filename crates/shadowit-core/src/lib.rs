//! Shadowit Core
//!
//! Wires storage, policy and enforcement into a [`Guard`] that hands out one
//! [`EnforcementController`] per page view, plus the popup's active-tab
//! [`UrlInspector`].

mod config;
mod error;
mod guard;
mod inspector;

pub use config::Config;
pub use error::CoreError;
pub use guard::Guard;
pub use inspector::{TabQuery, UrlInspector, NO_ACTIVE_TAB};

// Re-export core components
pub use shadowit_enforcement::{
    EnforcementController, EnforcementError, EnforcementSettings, EnforcementState, ModalView,
    PresentationSurface, RecordingSurface, SurfaceEvent,
};
pub use shadowit_policy::{MatchResult, Matcher, RequestLedger, RequestedSites, Rule, RuleStore};
pub use shadowit_storage::{Database, KeyValueStore, MemoryStore, StorageError};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt().with_env_filter(filter).with_target(true).init();
}
