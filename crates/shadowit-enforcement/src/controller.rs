//! Enforcement controller
//!
//! One controller per page view. Rules, ledger, page URL and surface are
//! injected so the whole workflow runs headless.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use uuid::Uuid;

use shadowit_policy::{MatchResult, Matcher, RequestLedger, RuleStore};

use crate::error::EnforcementError;
use crate::state::EnforcementState;
use crate::surface::{ModalView, PresentationSurface};
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnforcementSettings {
    /// Seconds shown after a request before the modal closes itself
    pub countdown_seconds: u32,
    /// Length of one countdown step
    pub tick: Duration,
}

impl Default for EnforcementSettings {
    fn default() -> Self {
        Self {
            countdown_seconds: 3,
            tick: Duration::from_secs(1),
        }
    }
}

struct Inner {
    state: EnforcementState,
    decision: Option<MatchResult>,
    fragment: Option<String>,
    view: Option<ModalView>,
    countdown: Option<JoinHandle<()>>,
    /// Bumped on every cancellation; a countdown step from an older
    /// generation must not touch the modal
    generation: u64,
}

pub struct EnforcementController {
    page_view: Uuid,
    page_url: String,
    rules: RuleStore,
    ledger: RequestLedger,
    surface: Arc<dyn PresentationSurface>,
    settings: EnforcementSettings,
    inner: Arc<Mutex<Inner>>,
}

impl EnforcementController {
    pub fn new(
        page_url: impl Into<String>,
        rules: RuleStore,
        ledger: RequestLedger,
        surface: Arc<dyn PresentationSurface>,
        settings: EnforcementSettings,
    ) -> Self {
        Self {
            page_view: Uuid::new_v4(),
            page_url: page_url.into(),
            rules,
            ledger,
            surface,
            settings,
            inner: Arc::new(Mutex::new(Inner {
                state: EnforcementState::Idle,
                decision: None,
                fragment: None,
                view: None,
                countdown: None,
                generation: 0,
            })),
        }
    }

    pub fn page_view_id(&self) -> Uuid {
        self.page_view
    }

    pub fn page_url(&self) -> &str {
        &self.page_url
    }

    pub fn state(&self) -> EnforcementState {
        self.inner.lock().state
    }

    /// Decision for this page view, once evaluated
    pub fn decision(&self) -> Option<MatchResult> {
        self.inner.lock().decision.clone()
    }

    /// What the overlay should currently show, `None` when hidden
    pub fn view(&self) -> Option<ModalView> {
        self.inner.lock().view.clone()
    }

    /// Evaluate the page against the stored rules.
    ///
    /// Runs once per page view; later calls return the first decision and
    /// emit nothing.
    pub fn evaluate_page(&self) -> MatchResult {
        let mut inner = self.inner.lock();

        if let Some(decision) = &inner.decision {
            tracing::debug!(page_view = %self.page_view, "Page already evaluated");
            return decision.clone();
        }

        let rules = self.rules.load();
        let decision = Matcher::evaluate(&self.page_url, &rules);
        inner.decision = Some(decision.clone());

        tracing::info!(
            page_view = %self.page_view,
            url = %self.page_url,
            decision = ?decision,
            "Evaluated page"
        );

        if let MatchResult::Blocked(fragment) = &decision {
            self.show_blocked_modal(&mut inner, fragment);
        }

        decision
    }

    /// The user dismissed the modal
    pub fn user_closed_modal(&self) {
        let mut inner = self.inner.lock();

        if !inner.state.can_transition_to(EnforcementState::Idle) {
            tracing::debug!(page_view = %self.page_view, state = %inner.state, "Close ignored");
            return;
        }

        Self::cancel_countdown(&mut inner);
        self.hide_modal(&mut inner);
    }

    /// The user asked for temporary access to the blocked site.
    ///
    /// The request is recorded before anything else. Scheduling the countdown
    /// needs a Tokio runtime; without one the modal stays in the blocked state.
    pub fn user_requested_access(&self) -> Result<()> {
        let mut inner = self.inner.lock();

        if !inner
            .state
            .can_transition_to(EnforcementState::AccessRequested)
        {
            tracing::debug!(page_view = %self.page_view, state = %inner.state, "Access request ignored");
            return Ok(());
        }

        let Some(fragment) = inner.fragment.clone() else {
            return Ok(());
        };

        self.ledger.add(&fragment);

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| EnforcementError::RuntimeUnavailable)?;

        let seconds = self.settings.countdown_seconds;
        self.transition(&mut inner, EnforcementState::AccessRequested);
        inner.view = Some(ModalView::granted(&fragment, seconds));
        self.surface.on_show_granted_state(&fragment);
        self.surface.on_update_countdown(seconds);

        if seconds == 0 {
            self.hide_modal(&mut inner);
            return Ok(());
        }

        let generation = inner.generation;
        let shared = Arc::clone(&self.inner);
        let surface = Arc::clone(&self.surface);
        let tick = self.settings.tick;
        let page_view = self.page_view;

        inner.countdown = Some(runtime.spawn(async move {
            let mut remaining = seconds;

            loop {
                tokio::time::sleep(tick).await;

                let mut inner = shared.lock();
                if inner.generation != generation
                    || inner.state != EnforcementState::AccessRequested
                {
                    return;
                }

                remaining -= 1;
                if let Some(view) = inner.view.as_mut() {
                    view.set_countdown(remaining);
                }
                surface.on_update_countdown(remaining);

                if remaining == 0 {
                    inner.countdown = None;
                    apply_transition(page_view, &mut inner, EnforcementState::Idle);
                    inner.view = None;
                    surface.on_hide_modal();
                    tracing::info!(page_view = %page_view, "Countdown elapsed, modal dismissed");
                    return;
                }
            }
        }));

        Ok(())
    }

    fn show_blocked_modal(&self, inner: &mut Inner, fragment: &str) {
        if inner.view.is_some() || !inner.state.can_transition_to(EnforcementState::Blocked) {
            tracing::debug!(page_view = %self.page_view, "Modal already shown");
            return;
        }

        self.transition(inner, EnforcementState::Blocked);
        inner.fragment = Some(fragment.to_string());
        inner.view = Some(ModalView::blocked(fragment));
        self.surface.on_show_blocked_modal(fragment);
    }

    fn hide_modal(&self, inner: &mut Inner) {
        self.transition(inner, EnforcementState::Idle);
        inner.view = None;
        self.surface.on_hide_modal();
    }

    fn transition(&self, inner: &mut Inner, to: EnforcementState) {
        apply_transition(self.page_view, inner, to);
    }

    fn cancel_countdown(inner: &mut Inner) {
        inner.generation += 1;
        if let Some(handle) = inner.countdown.take() {
            handle.abort();
        }
    }
}

fn apply_transition(page_view: Uuid, inner: &mut Inner, to: EnforcementState) {
    tracing::info!(
        page_view = %page_view,
        from = %inner.state,
        to = %to,
        "Enforcement state changed"
    );
    inner.state = to;
}

impl Drop for EnforcementController {
    fn drop(&mut self) {
        Self::cancel_countdown(&mut self.inner.lock());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{RecordingSurface, SurfaceEvent};
    use shadowit_policy::Rule;
    use shadowit_storage::{KeyValueStore, MemoryStore};

    fn controller_for(
        url: &str,
        rules: Vec<Rule>,
        store: &MemoryStore,
    ) -> (EnforcementController, Arc<RecordingSurface>) {
        let shared: Arc<dyn KeyValueStore> = Arc::new(store.clone());
        let surface = Arc::new(RecordingSurface::new());
        let controller = EnforcementController::new(
            url,
            RuleStore::new(Arc::clone(&shared)).with_defaults(rules),
            RequestLedger::new(shared),
            surface.clone(),
            EnforcementSettings::default(),
        );
        (controller, surface)
    }

    #[test]
    fn test_allowed_page_stays_idle() {
        let store = MemoryStore::new();
        let (controller, surface) =
            controller_for("https://figma.com/file/1", vec![Rule::allow("figma.com")], &store);

        assert_eq!(
            controller.evaluate_page(),
            MatchResult::Allowed("figma.com".to_string())
        );
        assert_eq!(controller.state(), EnforcementState::Idle);
        assert!(controller.view().is_none());
        assert!(surface.events().is_empty());
    }

    #[test]
    fn test_unmatched_page_stays_idle() {
        let store = MemoryStore::new();
        let (controller, surface) =
            controller_for("https://example.com", vec![Rule::block("x.com")], &store);

        assert_eq!(controller.evaluate_page(), MatchResult::NoMatch);
        assert_eq!(controller.state(), EnforcementState::Idle);
        assert!(surface.events().is_empty());
    }

    #[test]
    fn test_blocked_page_shows_modal_once() {
        let store = MemoryStore::new();
        let (controller, surface) =
            controller_for("https://canva.com/design", vec![Rule::block("canva.com")], &store);

        assert!(controller.evaluate_page().is_blocked());
        assert!(controller.evaluate_page().is_blocked());

        assert_eq!(controller.state(), EnforcementState::Blocked);
        assert_eq!(controller.view(), Some(ModalView::blocked("canva.com")));
        assert_eq!(
            surface.events(),
            vec![SurfaceEvent::ShowBlockedModal("canva.com".to_string())]
        );
    }

    #[test]
    fn test_evaluation_uses_rules_at_first_call_only() {
        let store = MemoryStore::new()
            .with_value("siteRules", r#"[{"url":"canva.com","blocked":false}]"#);
        let (controller, surface) = controller_for("https://canva.com", vec![], &store);

        assert!(!controller.evaluate_page().is_blocked());

        store
            .set("siteRules", r#"[{"url":"canva.com","blocked":true}]"#)
            .unwrap();
        assert!(!controller.evaluate_page().is_blocked());
        assert!(surface.events().is_empty());
    }

    #[test]
    fn test_close_hides_blocked_modal() {
        let store = MemoryStore::new();
        let (controller, surface) =
            controller_for("https://canva.com", vec![Rule::block("canva.com")], &store);

        controller.evaluate_page();
        controller.user_closed_modal();
        controller.user_closed_modal();

        assert_eq!(controller.state(), EnforcementState::Idle);
        assert!(controller.view().is_none());
        assert_eq!(surface.count(&SurfaceEvent::HideModal), 1);
    }

    #[test]
    fn test_request_ignored_when_idle() {
        let store = MemoryStore::new();
        let (controller, surface) =
            controller_for("https://example.com", vec![Rule::block("canva.com")], &store);

        controller.evaluate_page();
        controller.user_requested_access().unwrap();

        assert!(surface.events().is_empty());
        assert!(store.get("requestedAccess").unwrap().is_none());
    }

    #[test]
    fn test_request_without_runtime_keeps_modal() {
        let store = MemoryStore::new();
        let (controller, surface) =
            controller_for("https://canva.com", vec![Rule::block("canva.com")], &store);

        controller.evaluate_page();
        let result = controller.user_requested_access();

        assert!(matches!(result, Err(EnforcementError::RuntimeUnavailable)));
        assert_eq!(controller.state(), EnforcementState::Blocked);
        assert_eq!(
            store.get("requestedAccess").unwrap().as_deref(),
            Some(r#"["canva.com"]"#)
        );
        assert_eq!(surface.events().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_access_counts_down_and_hides() {
        let store = MemoryStore::new();
        let (controller, surface) =
            controller_for("https://canva.com/design", vec![Rule::block("canva.com")], &store);

        controller.evaluate_page();
        controller.user_requested_access().unwrap();

        assert_eq!(controller.state(), EnforcementState::AccessRequested);
        assert_eq!(controller.view(), Some(ModalView::granted("canva.com", 3)));
        assert_eq!(
            store.get("requestedAccess").unwrap().as_deref(),
            Some(r#"["canva.com"]"#)
        );

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(controller.view(), Some(ModalView::granted("canva.com", 2)));

        tokio::time::sleep(Duration::from_secs(2)).await;

        assert_eq!(controller.state(), EnforcementState::Idle);
        assert!(controller.view().is_none());
        assert_eq!(
            surface.events(),
            vec![
                SurfaceEvent::ShowBlockedModal("canva.com".to_string()),
                SurfaceEvent::ShowGrantedState("canva.com".to_string()),
                SurfaceEvent::UpdateCountdown(3),
                SurfaceEvent::UpdateCountdown(2),
                SurfaceEvent::UpdateCountdown(1),
                SurfaceEvent::UpdateCountdown(0),
                SurfaceEvent::HideModal,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_cancels_countdown() {
        let store = MemoryStore::new();
        let (controller, surface) =
            controller_for("https://canva.com", vec![Rule::block("canva.com")], &store);

        controller.evaluate_page();
        controller.user_requested_access().unwrap();

        tokio::time::sleep(Duration::from_millis(1500)).await;
        controller.user_closed_modal();
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert_eq!(controller.state(), EnforcementState::Idle);
        assert_eq!(surface.count(&SurfaceEvent::HideModal), 1);
        assert_eq!(
            surface.events().last(),
            Some(&SurfaceEvent::HideModal)
        );
        assert_eq!(surface.count(&SurfaceEvent::UpdateCountdown(1)), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_request_is_ignored() {
        let store = MemoryStore::new();
        let (controller, surface) =
            controller_for("https://canva.com", vec![Rule::block("canva.com")], &store);

        controller.evaluate_page();
        controller.user_requested_access().unwrap();
        controller.user_requested_access().unwrap();

        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(
            surface.count(&SurfaceEvent::ShowGrantedState("canva.com".to_string())),
            1
        );
        assert_eq!(surface.count(&SurfaceEvent::HideModal), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_countdown() {
        let store = MemoryStore::new();
        let (controller, surface) =
            controller_for("https://canva.com", vec![Rule::block("canva.com")], &store);

        controller.evaluate_page();
        controller.user_requested_access().unwrap();
        drop(controller);

        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(surface.count(&SurfaceEvent::HideModal), 0);
        assert_eq!(
            surface.events().last(),
            Some(&SurfaceEvent::UpdateCountdown(3))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_second_countdown_hides_immediately() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let surface = Arc::new(RecordingSurface::new());
        let controller = EnforcementController::new(
            "https://canva.com",
            RuleStore::new(Arc::clone(&store)),
            RequestLedger::new(store),
            surface.clone(),
            EnforcementSettings {
                countdown_seconds: 0,
                tick: Duration::from_secs(1),
            },
        );

        controller.evaluate_page();
        controller.user_requested_access().unwrap();

        assert_eq!(controller.state(), EnforcementState::Idle);
        assert_eq!(surface.events().last(), Some(&SurfaceEvent::HideModal));
    }
}
