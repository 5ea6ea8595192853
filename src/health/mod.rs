//! Backend liveness tracking.
//!
//! The dashboard checks `/health` once at start and then on a fixed
//! interval. Overlapping checks cannot happen because the server loop runs
//! them inline between requests.
use std::time::{Duration, Instant};

/// Last known backend status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HealthStatus {
    /// No check has completed yet.
    #[default]
    Unknown,
    Online,
    Offline,
}

impl HealthStatus {
    pub fn is_online(self) -> bool {
        matches!(self, Self::Online)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Unknown => "Checking",
            Self::Online => "Online",
            Self::Offline => "Offline",
        }
    }
}

/// Schedules periodic checks and remembers the latest outcome.
#[derive(Debug, Clone)]
pub struct HealthMonitor {
    interval: Duration,
    last_check: Option<Instant>,
    status: HealthStatus,
}

impl HealthMonitor {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_check: None,
            status: HealthStatus::Unknown,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn status(&self) -> HealthStatus {
        self.status
    }

    /// A check is due immediately at start and then once per interval.
    pub fn is_due(&self, now: Instant) -> bool {
        match self.last_check {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.interval,
        }
    }

    /// Time left until the next check is due.
    pub fn time_until_due(&self, now: Instant) -> Duration {
        match self.last_check {
            None => Duration::ZERO,
            Some(last) => self
                .interval
                .saturating_sub(now.saturating_duration_since(last)),
        }
    }

    pub fn record(&mut self, now: Instant, online: bool) {
        self.last_check = Some(now);
        self.status = if online {
            HealthStatus::Online
        } else {
            HealthStatus::Offline
        };
    }
}
