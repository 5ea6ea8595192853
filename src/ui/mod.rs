//! Page rendering: the router and the templates it dispatches to.
pub mod router;
pub mod templates;

use crate::actions::Controls;
use crate::health::HealthStatus;
use crate::history::HistoryView;
use crate::store::AppState;

pub use router::{Page, Rendered, Router};

/// Read-only snapshot every template renders from.
#[derive(Debug, Clone, Copy)]
pub struct View<'a> {
    pub state: &'a AppState,
    pub health: HealthStatus,
    pub controls: &'a Controls,
    pub history: &'a HistoryView,
}
