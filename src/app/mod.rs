//! The application object.
//!
//! [`App`] owns everything the dashboard mutates: persisted state, the API
//! client, the router, control states, backend health and the fetched
//! history. All of it is touched from one thread, one request at a time.
pub mod events;

use std::time::{Duration, Instant};

use crate::actions::{CheckHealth, Command, Controls, FetchHistory};
use crate::activity::ActivityLog;
use crate::api::{ApiClient, ApiError};
use crate::config::ClientConfig;
use crate::health::{HealthMonitor, HealthStatus};
use crate::history::HistoryView;
use crate::store::{self, AppState, StateStore};
use crate::ui::templates;
use crate::ui::{Page, Rendered, Router, View};

pub use events::{ControlUpdate, Fragment, Reply, Submission};

pub struct App {
    store: StateStore,
    client: ApiClient,
    router: Router,
    controls: Controls,
    health: HealthMonitor,
    history: HistoryView,
    activity: ActivityLog,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("page", &self.router.active())
            .field("backend", &self.client.base_url())
            .field("health", &self.health.status())
            .finish_non_exhaustive()
    }
}

impl App {
    /// App over `store`, talking to the backend through `client`. Health is
    /// checked every 10 seconds and activity is not logged.
    pub fn new(store: StateStore, client: ApiClient) -> Self {
        Self {
            store,
            client,
            router: Router::new(),
            controls: Controls::new(),
            health: HealthMonitor::new(Duration::from_secs(
                crate::config::schema::DEFAULT_HEALTH_INTERVAL_SECS,
            )),
            history: HistoryView::default(),
            activity: ActivityLog::disabled(),
        }
    }

    /// Load persisted state and connect to the saved backend URL.
    pub fn from_config(config: &ClientConfig) -> Self {
        let store = StateStore::load(store::open_default(config), &config.backend);
        let interval = Duration::from_secs(config.health.interval_secs.max(1));
        let client =
            ApiClient::connect_with_health_timeout(&store.settings().backend_url, interval);
        Self::new(store, client)
            .with_health_interval(interval)
            .with_activity_log(ActivityLog::from_config(config.logging.activity_log))
    }

    pub fn with_health_interval(mut self, interval: Duration) -> Self {
        self.health = HealthMonitor::new(interval);
        self
    }

    pub fn with_activity_log(mut self, activity: ActivityLog) -> Self {
        self.activity = activity;
        self
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn state(&self) -> &AppState {
        self.store.state()
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn controls(&self) -> &Controls {
        &self.controls
    }

    pub fn controls_mut(&mut self) -> &mut Controls {
        &mut self.controls
    }

    pub fn history(&self) -> &HistoryView {
        &self.history
    }

    pub fn health(&self) -> &HealthMonitor {
        &self.health
    }

    pub fn activity(&self) -> &ActivityLog {
        &self.activity
    }

    pub fn active_page(&self) -> Page {
        self.router.active()
    }

    pub fn view(&self) -> View<'_> {
        View {
            state: self.store.state(),
            health: self.health.status(),
            controls: &self.controls,
            history: &self.history,
        }
    }

    // -----------------------------------------------------------------------
    // Navigation
    // -----------------------------------------------------------------------

    /// Render the active page without re-binding it.
    pub fn render(&self) -> Rendered {
        self.router.render(&self.view())
    }

    /// Switch to `page`, bind it, and render it.
    pub fn navigate(&mut self, page: Page) -> Rendered {
        self.router.navigate(page);
        self.bind_page(page);
        self.render()
    }

    /// Navigate by page id; unknown ids render the home page.
    pub fn navigate_id(&mut self, id: &str) -> Rendered {
        let page = self.router.navigate_id(id);
        self.bind_page(page);
        self.render()
    }

    /// Page bindings: every render starts with idle controls, and the
    /// history page loads the list from the backend.
    fn bind_page(&mut self, page: Page) {
        self.controls.reset();
        if page == Page::History {
            let _ = self.refresh_history();
        }
    }

    fn refresh_history(&mut self) -> Result<(), ApiError> {
        match FetchHistory::new(&self.client).execute(()) {
            Ok(entries) => {
                self.history.loaded(entries);
                Ok(())
            }
            Err(err) => {
                self.history.failed(err.to_string());
                Err(err)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Health
    // -----------------------------------------------------------------------

    /// Probe the backend now and record the outcome.
    pub fn check_health(&mut self, now: Instant) -> HealthStatus {
        let online = CheckHealth::new(&self.client).execute(()).is_ok();
        self.health.record(now, online);
        self.health.status()
    }

    /// Probe the backend if a check is due.
    pub fn tick_health(&mut self, now: Instant) -> Option<HealthStatus> {
        self.health.is_due(now).then(|| self.check_health(now))
    }

    /// Indicator markup for the header and dashboard.
    pub fn status_markup(&self) -> String {
        templates::status_indicator(self.health.status()).into_string()
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::api::{Method, StubTransport};

    fn app() -> (Rc<StubTransport>, App) {
        let stub = Rc::new(StubTransport::new());
        let client = ApiClient::new("http://backend", Rc::clone(&stub));
        (stub, App::new(StateStore::in_memory(), client))
    }

    #[test]
    fn starts_on_home_with_unknown_health() {
        let (_, app) = app();
        assert_eq!(app.active_page(), Page::Home);
        assert_eq!(app.health().status(), HealthStatus::Unknown);
    }

    #[test]
    fn navigating_to_history_fetches_the_list() {
        let (stub, mut app) = app();
        stub.respond(
            Method::Get,
            "/history",
            200,
            r#"[{"id":"1","type":"audio","query":"standup","data":{}}]"#,
        );

        let rendered = app.navigate(Page::History);
        assert_eq!(stub.call_count("/history"), 1);
        assert!(rendered.html.contains("standup"));

        app.navigate(Page::Settings);
        assert_eq!(stub.call_count("/history"), 1);
    }

    #[test]
    fn history_fetch_failure_renders_inline_error() {
        let (stub, mut app) = app();
        stub.respond(Method::Get, "/history", 500, "oops");

        let rendered = app.navigate(Page::History);
        assert!(rendered.html.contains("Failed to load history: HTTP Error 500"));
    }

    #[test]
    fn health_ticks_follow_the_interval() {
        let (stub, app) = app();
        let mut app = app.with_health_interval(Duration::from_secs(10));
        stub.respond(Method::Get, "/health", 200, r#"{"status":"healthy"}"#);

        let start = Instant::now();
        assert_eq!(app.tick_health(start), Some(HealthStatus::Online));
        assert_eq!(app.tick_health(start + Duration::from_secs(5)), None);

        stub.fail(Method::Get, "/health", "connection refused");
        assert_eq!(
            app.tick_health(start + Duration::from_secs(10)),
            Some(HealthStatus::Offline)
        );
        assert_eq!(stub.call_count("/health"), 2);
        assert!(app.status_markup().contains("Offline"));
    }
}
