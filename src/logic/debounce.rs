use std::time::Duration;

use tokio::time::Instant;

use crate::state::Query;

/// Debounce plus suppress-if-unchanged for the raw search text stream.
///
/// Every pushed value restarts the quiet-period timer. Once the timer expires
/// the latest value is released, unless it equals the last released value.
#[derive(Debug)]
pub struct Debouncer {
    interval: Duration,
    pending: Option<(String, Instant)>,
    last_released: Option<String>,
}

impl Debouncer {
    /// What: Create a debouncer with the given quiet period.
    #[must_use]
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            pending: None,
            last_released: None,
        }
    }

    /// What: Record a new raw value and restart the timer.
    ///
    /// Inputs:
    /// - `text`: Raw search text as typed
    /// - `now`: Arrival instant
    pub fn push(&mut self, text: String, now: Instant) {
        self.pending = Some((text, now + self.interval));
    }

    /// Instant at which the pending value becomes releasable, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, at)| *at)
    }

    /// What: Release the pending value once the quiet period has elapsed.
    ///
    /// Inputs:
    /// - `now`: Current instant
    ///
    /// Output:
    /// - `Some(Query)` for a value that differs from the previously released one
    /// - `None` when nothing is due yet or the due value is unchanged
    ///
    /// Details:
    /// - An unchanged value is still consumed, so it will not fire again.
    pub fn poll(&mut self, now: Instant) -> Option<Query> {
        let due = matches!(self.pending, Some((_, at)) if at <= now);
        if !due {
            return None;
        }
        let (text, _) = self.pending.take()?;
        if self.last_released.as_deref() == Some(text.as_str()) {
            tracing::debug!(text = %text, "[Debounce] unchanged text suppressed");
            return None;
        }
        self.last_released = Some(text.clone());
        Some(Query::new(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    /// What: A value is released only after the quiet period.
    ///
    /// Inputs:
    /// - "ab" pushed at t0 with a 500ms interval.
    ///
    /// Output:
    /// - Nothing at t0+499ms, `Query("ab")` at t0+500ms.
    fn releases_after_quiet_period() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(Duration::from_millis(500));
        d.push("ab".into(), t0);
        assert_eq!(d.deadline(), Some(t0 + Duration::from_millis(500)));
        assert_eq!(d.poll(t0 + Duration::from_millis(499)), None);
        assert_eq!(d.poll(t0 + Duration::from_millis(500)), Some(Query::new("ab")));
        assert_eq!(d.deadline(), None);
    }

    #[test]
    /// What: A new value before quiescence restarts the timer and replaces the old one.
    fn new_value_restarts_timer() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(Duration::from_millis(500));
        d.push("a".into(), t0);
        d.push("ab".into(), t0 + Duration::from_millis(300));
        assert_eq!(d.poll(t0 + Duration::from_millis(600)), None);
        assert_eq!(
            d.poll(t0 + Duration::from_millis(800)),
            Some(Query::new("ab"))
        );
    }

    #[test]
    /// What: Re-typing the released value is suppressed.
    ///
    /// Details:
    /// - "abc" → "ab" → "abc" within one quiet period releases nothing new.
    fn unchanged_value_is_suppressed() {
        let t0 = Instant::now();
        let step = Duration::from_millis(10);
        let mut d = Debouncer::new(step);
        d.push("abc".into(), t0);
        assert_eq!(d.poll(t0 + step), Some(Query::new("abc")));
        d.push("ab".into(), t0 + step * 2);
        d.push("abc".into(), t0 + step * 2);
        assert_eq!(d.poll(t0 + step * 3), None);
        assert_eq!(d.deadline(), None);
    }

    #[test]
    /// What: The empty string is a regular value and is released the first time.
    fn empty_text_is_released_once() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(Duration::ZERO);
        d.push(String::new(), t0);
        assert_eq!(d.poll(t0), Some(Query::default()));
        d.push(String::new(), t0);
        assert_eq!(d.poll(t0), None);
    }
}
