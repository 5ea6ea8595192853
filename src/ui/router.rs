//! Active-page tracking.
//!
//! Exactly one [`Page`] is active at a time, starting at [`Page::Home`].
//! There is no back-stack and nothing is mirrored into the URL.
use maud::html;
use serde::{Deserialize, Serialize};

use super::View;
use super::templates;

/// Every page of the dashboard. Serialized as the kebab-case page id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Page {
    #[default]
    Home,
    Analysis,
    CodeAnalysis,
    ScreenshotAnalysis,
    AudioTranscription,
    ActionsFixes,
    History,
    Settings,
}

impl Page {
    /// Navigation order.
    pub const ALL: [Page; 8] = [
        Self::Home,
        Self::Analysis,
        Self::CodeAnalysis,
        Self::ScreenshotAnalysis,
        Self::AudioTranscription,
        Self::ActionsFixes,
        Self::History,
        Self::Settings,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Analysis => "analysis",
            Self::CodeAnalysis => "code-analysis",
            Self::ScreenshotAnalysis => "screenshot-analysis",
            Self::AudioTranscription => "audio-transcription",
            Self::ActionsFixes => "actions-fixes",
            Self::History => "history",
            Self::Settings => "settings",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.id() == id.trim())
    }

    /// Label in the navigation bar.
    pub fn title(self) -> &'static str {
        match self {
            Self::Home => "Home",
            Self::Analysis => "Dashboard",
            Self::CodeAnalysis => "Code Analysis",
            Self::ScreenshotAnalysis => "Screenshot",
            Self::AudioTranscription => "Audio",
            Self::ActionsFixes => "Actions & Fixes",
            Self::History => "History",
            Self::Settings => "Settings",
        }
    }
}

impl std::fmt::Display for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// A rendered page plus the navigation bar that goes with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rendered {
    pub page: Page,
    pub html: String,
    pub nav: String,
    /// Always set: every render starts at the top of the page.
    pub scroll_top: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Router {
    active: Page,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Page {
        self.active
    }

    pub fn navigate(&mut self, page: Page) {
        self.active = page;
    }

    /// Navigate by page id. Unknown ids land on the home page.
    pub fn navigate_id(&mut self, id: &str) -> Page {
        let page = Page::from_id(id).unwrap_or_default();
        self.navigate(page);
        page
    }

    /// Render the active page.
    pub fn render(&self, view: &View<'_>) -> Rendered {
        Rendered {
            page: self.active,
            html: html! {
                div class="page" data-page=(self.active.id()) {
                    (templates::page(self.active, view))
                }
            }
            .into_string(),
            nav: nav_markup(self.active),
            scroll_top: true,
        }
    }
}

/// Navigation bar with exactly one item marked active.
pub fn nav_markup(active: Page) -> String {
    html! {
        @for page in Page::ALL {
            a href="#" class={(if page == active { "nav-item active" } else { "nav-item" })}
                data-page=(page.id()) { (page.title()) }
        }
    }
    .into_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_ids_round_trip() {
        for page in Page::ALL {
            assert_eq!(Page::from_id(page.id()), Some(page));
            assert_eq!(
                serde_json::to_value(page).unwrap(),
                serde_json::Value::String(page.id().to_string())
            );
        }
        assert_eq!(Page::from_id("nope"), None);
    }

    #[test]
    fn unknown_id_falls_back_to_home() {
        let mut router = Router::new();
        router.navigate(Page::Settings);
        assert_eq!(router.navigate_id("does-not-exist"), Page::Home);
        assert_eq!(router.active(), Page::Home);
    }

    #[test]
    fn nav_marks_only_active_page() {
        let nav = nav_markup(Page::History);
        assert_eq!(nav.matches(r#"class="nav-item active""#).count(), 1);
        assert!(nav.contains(r#"class="nav-item active" data-page="history""#));
        assert_eq!(nav.matches("nav-item").count(), Page::ALL.len());
    }
}
