//! Periodic resume while the host is in the background.
//!
//! Some platform engines stop producing audio once their page or window is
//! hidden even though they still report speaking. A resume on a fixed
//! interval keeps them going. The timer only runs while hidden.

use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct KeepAlive {
    interval: Duration,
    next_due: Option<Instant>,
}

impl KeepAlive {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
            next_due: None,
        }
    }

    pub fn from_secs(secs: u64) -> Self {
        Self::new(Duration::from_secs(secs))
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_armed(&self) -> bool {
        self.next_due.is_some()
    }

    /// Hiding (re)starts the timer; showing clears it.
    pub fn set_hidden(&mut self, hidden: bool, now: Instant) {
        if hidden {
            debug!(interval_ms = self.interval.as_millis() as u64, "Keep-alive armed");
            self.next_due = Some(now + self.interval);
        } else if self.next_due.take().is_some() {
            debug!("Keep-alive disarmed");
        }
    }

    /// Whether a tick is due at `now`. A due tick schedules the next one.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.next_due {
            Some(due) if now >= due => {
                self.next_due = Some(now + self.interval);
                true
            }
            _ => false,
        }
    }

    /// Time until the next tick, for sizing a wait.
    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        self.next_due
            .map(|due| due.saturating_duration_since(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_fires_while_visible() {
        let mut keep_alive = KeepAlive::from_secs(10);
        let start = Instant::now();
        assert!(!keep_alive.poll(start + Duration::from_secs(60)));
        assert_eq!(keep_alive.time_until_due(start), None);
    }

    #[test]
    fn fires_every_interval_while_hidden() {
        let mut keep_alive = KeepAlive::from_secs(10);
        let start = Instant::now();
        keep_alive.set_hidden(true, start);
        assert!(!keep_alive.poll(start + Duration::from_secs(9)));
        assert!(keep_alive.poll(start + Duration::from_secs(10)));
        assert!(!keep_alive.poll(start + Duration::from_secs(15)));
        assert!(keep_alive.poll(start + Duration::from_secs(20)));
    }

    #[test]
    fn showing_stops_the_timer() {
        let mut keep_alive = KeepAlive::from_secs(10);
        let start = Instant::now();
        keep_alive.set_hidden(true, start);
        keep_alive.set_hidden(false, start + Duration::from_secs(5));
        assert!(!keep_alive.is_armed());
        assert!(!keep_alive.poll(start + Duration::from_secs(30)));
    }
}
