//! Shadowit Enforcement
//!
//! Drives the blocking overlay for one page view:
//! evaluate the page once, show the modal on a block, record access requests
//! and dismiss the modal after a short countdown. Rendering is left to a
//! [`PresentationSurface`]; the controller only emits callbacks and a
//! declarative [`ModalView`].

mod controller;
mod error;
mod state;
mod surface;

pub use controller::{EnforcementController, EnforcementSettings};
pub use error::EnforcementError;
pub use state::EnforcementState;
pub use surface::{ModalView, PresentationSurface, RecordingSurface, SurfaceEvent};

pub type Result<T> = std::result::Result<T, EnforcementError>;
