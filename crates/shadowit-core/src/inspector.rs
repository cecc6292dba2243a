//! Active tab URL inspector
//!
//! Backs the toolbar popup: shows the active tab's URL and, on request, logs
//! it and raises a short-lived popper carrying the URL.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

pub const NO_ACTIVE_TAB: &str = "No active tab found";

/// Source of the active tab, usually the browser's tab API
pub trait TabQuery: Send + Sync {
    fn active_tab_url(&self) -> Option<String>;
}

impl<F> TabQuery for F
where
    F: Fn() -> Option<String> + Send + Sync,
{
    fn active_tab_url(&self) -> Option<String> {
        self()
    }
}

#[derive(Default)]
struct Popper {
    text: Option<String>,
    dismiss: Option<JoinHandle<()>>,
    generation: u64,
}

impl Popper {
    fn clear(&mut self) {
        self.generation += 1;
        self.text = None;
        if let Some(handle) = self.dismiss.take() {
            handle.abort();
        }
    }
}

pub struct UrlInspector {
    tabs: Arc<dyn TabQuery>,
    timeout: Duration,
    popper: Arc<Mutex<Popper>>,
}

impl UrlInspector {
    pub fn new(tabs: Arc<dyn TabQuery>, timeout: Duration) -> Self {
        Self {
            tabs,
            timeout,
            popper: Arc::new(Mutex::new(Popper::default())),
        }
    }

    pub fn display_text(&self) -> String {
        self.tabs
            .active_tab_url()
            .unwrap_or_else(|| NO_ACTIVE_TAB.to_string())
    }

    /// Log the active URL and show it in the popper, replacing any popper
    /// already up. Returns the URL, or `None` when no tab is active.
    pub fn log_active_url(&self) -> Option<String> {
        let url = self.tabs.active_tab_url()?;
        tracing::info!(url = %url, "Current URL");

        let mut popper = self.popper.lock();
        popper.clear();
        popper.text = Some(url.clone());

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let generation = popper.generation;
                let shared = Arc::clone(&self.popper);
                let timeout = self.timeout;

                popper.dismiss = Some(runtime.spawn(async move {
                    tokio::time::sleep(timeout).await;

                    let mut popper = shared.lock();
                    if popper.generation == generation {
                        popper.dismiss = None;
                        popper.clear();
                    }
                }));
            }
            Err(_) => {
                tracing::debug!("No runtime, popper stays until dismissed");
            }
        }

        Some(url)
    }

    pub fn popper(&self) -> Option<String> {
        self.popper.lock().text.clone()
    }

    pub fn dismiss_popper(&self) {
        self.popper.lock().clear();
    }
}

impl Drop for UrlInspector {
    fn drop(&mut self) {
        self.popper.lock().clear();
    }
}
