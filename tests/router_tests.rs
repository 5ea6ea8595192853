//! Router and page rendering tests.
//!
//! Every page renders against default state, exactly one navigation item
//! is active, and rendering the same state twice gives the same markup.
use std::rc::Rc;

use codeagent::api::{ApiClient, Method, StubTransport};
use codeagent::app::App;
use codeagent::store::StateStore;
use codeagent::ui::Page;
use codeagent::ui::router::nav_markup;

fn app() -> (Rc<StubTransport>, App) {
    let stub = Rc::new(StubTransport::new());
    stub.respond(Method::Get, "/history", 200, "[]");
    let client = ApiClient::new("http://backend", Rc::clone(&stub));
    (stub, App::new(StateStore::in_memory(), client))
}

#[test]
fn every_page_renders_with_one_active_nav_item() {
    let (_, mut app) = app();
    for page in Page::ALL {
        let rendered = app.navigate(page);
        assert_eq!(rendered.page, page);
        assert!(rendered.scroll_top);
        assert!(
            rendered
                .html
                .starts_with(&format!(r#"<div class="page" data-page="{}">"#, page.id())),
            "{page} should be wrapped in its page container"
        );
        assert!(rendered.html.len() > 100, "{page} rendered almost nothing");
        assert_eq!(rendered.nav.matches("nav-item active").count(), 1);
        assert!(
            rendered
                .nav
                .contains(&format!(r#"class="nav-item active" data-page="{}""#, page.id()))
        );
    }
}

#[test]
fn unknown_page_id_lands_on_home() {
    let (_, mut app) = app();
    app.navigate(Page::Settings);

    let rendered = app.navigate_id("no-such-page");
    assert_eq!(rendered.page, Page::Home);
    assert_eq!(app.active_page(), Page::Home);
}

#[test]
fn rendering_is_idempotent() {
    let (_, mut app) = app();
    app.navigate(Page::CodeAnalysis);
    assert_eq!(app.render(), app.render());
    assert_eq!(nav_markup(Page::Home), nav_markup(Page::Home));
}

#[test]
fn dashboard_and_header_share_the_status_indicator() {
    let (stub, mut app) = app();
    stub.fail(Method::Get, "/health", "connection refused");
    app.check_health(std::time::Instant::now());

    let rendered = app.navigate(Page::Analysis);
    let indicator = app.status_markup();
    assert!(indicator.contains("Offline"));
    assert!(rendered.html.contains(&indicator));
}

#[test]
fn settings_page_shows_saved_values_escaped() {
    let stub = Rc::new(StubTransport::new());
    let client = ApiClient::new("http://backend", Rc::clone(&stub));
    let mut store = StateStore::in_memory();
    store
        .update_settings("http://host/?a=1&b=\"2\"", "<team>")
        .unwrap();
    let mut app = App::new(store, client);

    let html = app.navigate(Page::Settings).html;
    assert!(html.contains("http://host/?a=1&amp;b=&quot;2&quot;"));
    assert!(html.contains("&lt;team&gt;"));
    assert!(!html.contains("<team>"));
}
