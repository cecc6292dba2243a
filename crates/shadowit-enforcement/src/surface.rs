//! Presentation surface contract and modal view-model

use parking_lot::Mutex;
use serde::Serialize;

/// Renders what the controller decides.
///
/// Callbacks run while the controller is locked. An implementation must not
/// call back into the controller from inside a callback; forward user input
/// through the event loop instead.
pub trait PresentationSurface: Send + Sync {
    fn on_show_blocked_modal(&self, fragment: &str);
    fn on_show_granted_state(&self, fragment: &str);
    fn on_update_countdown(&self, remaining_seconds: u32);
    fn on_hide_modal(&self);
}

/// What the overlay should display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModalView {
    Blocked {
        site: String,
        title: String,
        message: String,
        action_label: String,
    },
    Granted {
        site: String,
        title: String,
        message: String,
        countdown: u32,
        countdown_label: String,
    },
}

const MODAL_TITLE: &str = "Access Restricted";

impl ModalView {
    pub fn blocked(site: &str) -> Self {
        ModalView::Blocked {
            site: site.to_string(),
            title: MODAL_TITLE.to_string(),
            message: format!("This site {} is currently blocked.", site),
            action_label: "Request Temporary Access".to_string(),
        }
    }

    pub fn granted(site: &str, countdown: u32) -> Self {
        ModalView::Granted {
            site: site.to_string(),
            title: MODAL_TITLE.to_string(),
            message: "Access Granted".to_string(),
            countdown,
            countdown_label: countdown_label(countdown),
        }
    }

    pub fn site(&self) -> &str {
        match self {
            ModalView::Blocked { site, .. } | ModalView::Granted { site, .. } => site,
        }
    }

    pub(crate) fn set_countdown(&mut self, remaining: u32) {
        if let ModalView::Granted {
            countdown,
            countdown_label: label,
            ..
        } = self
        {
            *countdown = remaining;
            *label = countdown_label(remaining);
        }
    }
}

fn countdown_label(remaining: u32) -> String {
    format!("Closing in {}s", remaining)
}

/// One callback received by a [`RecordingSurface`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceEvent {
    ShowBlockedModal(String),
    ShowGrantedState(String),
    UpdateCountdown(u32),
    HideModal,
}

/// Headless surface that keeps every callback in order
#[derive(Default)]
pub struct RecordingSurface {
    events: Mutex<Vec<SurfaceEvent>>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SurfaceEvent> {
        self.events.lock().clone()
    }

    pub fn count(&self, event: &SurfaceEvent) -> usize {
        self.events.lock().iter().filter(|e| *e == event).count()
    }

    fn record(&self, event: SurfaceEvent) {
        self.events.lock().push(event);
    }
}

impl PresentationSurface for RecordingSurface {
    fn on_show_blocked_modal(&self, fragment: &str) {
        self.record(SurfaceEvent::ShowBlockedModal(fragment.to_string()));
    }

    fn on_show_granted_state(&self, fragment: &str) {
        self.record(SurfaceEvent::ShowGrantedState(fragment.to_string()));
    }

    fn on_update_countdown(&self, remaining_seconds: u32) {
        self.record(SurfaceEvent::UpdateCountdown(remaining_seconds));
    }

    fn on_hide_modal(&self) {
        self.record(SurfaceEvent::HideModal);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocked_view_text() {
        let view = ModalView::blocked("canva.com");
        match &view {
            ModalView::Blocked {
                title,
                message,
                action_label,
                ..
            } => {
                assert_eq!(title, "Access Restricted");
                assert_eq!(message, "This site canva.com is currently blocked.");
                assert_eq!(action_label, "Request Temporary Access");
            }
            other => panic!("unexpected view: {:?}", other),
        }
        assert_eq!(view.site(), "canva.com");
    }

    #[test]
    fn test_granted_countdown_updates() {
        let mut view = ModalView::granted("canva.com", 3);
        view.set_countdown(1);
        assert_eq!(view, ModalView::granted("canva.com", 1));

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["kind"], "granted");
        assert_eq!(json["countdown_label"], "Closing in 1s");
    }

    #[test]
    fn test_set_countdown_ignored_on_blocked_view() {
        let mut view = ModalView::blocked("canva.com");
        view.set_countdown(2);
        assert_eq!(view, ModalView::blocked("canva.com"));
    }
}
