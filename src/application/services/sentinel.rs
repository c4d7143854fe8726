//! Scroll sentinel: detects the end-of-content marker coming into view.
//!
//! The marker is the row block laid out after the last card. Each frame the
//! presentation layer reports where the marker sits relative to the
//! viewport; the sentinel turns that into at most one trigger per
//! subscription. Subscriptions are owned values: one is acquired when a load
//! settles and released when the next load starts, so a stale subscription
//! can never fire twice for the same layout.

use tracing::{debug, trace};

/// Sentinel settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SentinelConfig {
    /// Extra distance around the viewport that still counts as visible.
    pub margin_px: u16,
    /// Fraction of the marker that must be visible, in `0.0..=1.0`.
    pub threshold: f32,
}

impl Default for SentinelConfig {
    fn default() -> Self {
        Self {
            margin_px: 20,
            threshold: 1.0,
        }
    }
}

impl SentinelConfig {
    /// Margin converted to terminal rows for the given cell height.
    #[must_use]
    pub fn margin_rows(&self, cell_height_px: u16) -> u32 {
        if cell_height_px == 0 {
            return 0;
        }
        u32::from(self.margin_px.div_ceil(cell_height_px))
    }
}

/// Fraction of the marker rows `[marker_top, marker_top + marker_height)`
/// inside the viewport rows `[view_top, view_top + view_height)` grown by
/// `margin` on both ends.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn visibility_ratio(
    marker_top: u32,
    marker_height: u32,
    view_top: u32,
    view_height: u32,
    margin: u32,
) -> f32 {
    if marker_height == 0 {
        return 0.0;
    }

    let root_top = view_top.saturating_sub(margin);
    let root_bottom = view_top.saturating_add(view_height).saturating_add(margin);
    let marker_bottom = marker_top.saturating_add(marker_height);

    let top = marker_top.max(root_top);
    let bottom = marker_bottom.min(root_bottom);
    let visible = bottom.saturating_sub(top);

    visible as f32 / marker_height as f32
}

/// An armed observation of the marker.
#[derive(Debug)]
pub struct SentinelSubscription {
    generation: u64,
    was_visible: Option<bool>,
}

impl SentinelSubscription {
    fn new(generation: u64) -> Self {
        trace!(generation, "Sentinel subscription acquired");
        Self {
            generation,
            was_visible: None,
        }
    }

    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Treats the marker as already in view, so it has to leave first.
    fn hold(&mut self) {
        self.was_visible = Some(true);
    }

    /// Records a visibility sample; true when it is an entry into view.
    fn record(&mut self, visible: bool) -> bool {
        let entered = visible && self.was_visible != Some(true);
        self.was_visible = Some(visible);
        entered
    }
}

impl Drop for SentinelSubscription {
    fn drop(&mut self) {
        trace!(generation = self.generation, "Sentinel subscription released");
    }
}

#[derive(Debug)]
pub struct Sentinel {
    config: SentinelConfig,
    subscription: Option<SentinelSubscription>,
    generation: u64,
    was_loading: bool,
    hold_next: bool,
}

impl Sentinel {
    /// Creates a sentinel that arms on the first settled load.
    #[must_use]
    pub const fn new(config: SentinelConfig) -> Self {
        Self {
            config,
            subscription: None,
            generation: 0,
            was_loading: true,
            hold_next: false,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &SentinelConfig {
        &self.config
    }

    #[must_use]
    pub const fn is_armed(&self) -> bool {
        self.subscription.is_some()
    }

    #[must_use]
    pub fn generation(&self) -> Option<u64> {
        self.subscription.as_ref().map(SentinelSubscription::generation)
    }

    /// Follows the gallery's loading flag: a starting load releases the
    /// subscription, a settling load acquires a fresh one.
    pub fn sync(&mut self, loading: bool) {
        if loading {
            self.release();
        } else if self.was_loading {
            self.rearm();
        }
        self.was_loading = loading;
    }

    /// Drops the current subscription and acquires a new one.
    pub fn rearm(&mut self) {
        self.release();
        self.generation += 1;
        let mut subscription = SentinelSubscription::new(self.generation);
        if std::mem::take(&mut self.hold_next) {
            subscription.hold();
        }
        self.subscription = Some(subscription);
        debug!(generation = self.generation, "Sentinel armed");
    }

    /// Keeps the marker from firing until it leaves the viewport and comes
    /// back, or until [`Sentinel::reenter`]. Applies to the current
    /// subscription, or to the next one if none is held.
    pub fn wait_for_exit(&mut self) {
        match self.subscription.as_mut() {
            Some(subscription) => subscription.hold(),
            None => self.hold_next = true,
        }
        debug!("Sentinel waiting for the marker to leave view");
    }

    /// Counts the next visible sample as a fresh entry. Used when the user
    /// scrolls toward a marker that is already in view.
    pub fn reenter(&mut self) {
        self.hold_next = false;
        if let Some(subscription) = self.subscription.as_mut() {
            subscription.was_visible = None;
        }
    }

    /// Drops the current subscription, if any.
    pub fn release(&mut self) {
        self.subscription.take();
    }

    /// Reports the marker's visibility ratio. Returns true when the marker
    /// has just become visible enough and more pages may exist; the caller
    /// should then advance the page cursor.
    pub fn observe(&mut self, ratio: f32, has_more: bool) -> bool {
        let threshold = self.config.threshold;
        let Some(subscription) = self.subscription.as_mut() else {
            return false;
        };

        let entered = subscription.record(ratio >= threshold);
        if entered && has_more {
            debug!(
                generation = subscription.generation,
                ratio, "Sentinel triggered"
            );
            return true;
        }
        false
    }
}

impl Default for Sentinel {
    fn default() -> Self {
        Self::new(SentinelConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn armed() -> Sentinel {
        let mut sentinel = Sentinel::default();
        sentinel.sync(false);
        sentinel
    }

    #[test_case(50, 1, 0, 40, 0, 0.0 ; "below viewport")]
    #[test_case(39, 1, 0, 40, 0, 1.0 ; "last visible row")]
    #[test_case(40, 1, 0, 40, 1, 1.0 ; "inside margin")]
    #[test_case(40, 2, 0, 40, 1, 0.5 ; "half inside margin")]
    #[test_case(10, 0, 0, 40, 0, 0.0 ; "empty marker")]
    fn test_visibility_ratio(top: u32, height: u32, view: u32, view_h: u32, margin: u32, expected: f32) {
        let ratio = visibility_ratio(top, height, view, view_h, margin);
        assert!((ratio - expected).abs() < f32::EPSILON);
    }

    #[test_case(20, 16, 2 ; "rounds up")]
    #[test_case(20, 20, 1 ; "exact")]
    #[test_case(20, 0, 0 ; "unknown cell size")]
    fn test_margin_rows(margin_px: u16, cell: u16, expected: u32) {
        let config = SentinelConfig {
            margin_px,
            ..SentinelConfig::default()
        };
        assert_eq!(config.margin_rows(cell), expected);
    }

    #[test]
    fn test_not_armed_while_mounting() {
        let mut sentinel = Sentinel::default();
        assert!(!sentinel.is_armed());
        assert!(!sentinel.observe(1.0, true));
    }

    #[test]
    fn test_fires_once_per_entry() {
        let mut sentinel = armed();

        assert!(sentinel.observe(1.0, true));
        assert!(!sentinel.observe(1.0, true));

        assert!(!sentinel.observe(0.2, true));
        assert!(sentinel.observe(1.0, true));
    }

    #[test]
    fn test_partial_visibility_does_not_fire() {
        let mut sentinel = armed();
        assert!(!sentinel.observe(0.99, true));
    }

    #[test]
    fn test_no_fire_without_more_pages() {
        let mut sentinel = armed();
        assert!(!sentinel.observe(1.0, false));
    }

    #[test]
    fn test_loading_releases_and_settling_rearms() {
        let mut sentinel = armed();
        assert_eq!(sentinel.generation(), Some(1));
        assert!(sentinel.observe(1.0, true));

        sentinel.sync(true);
        assert!(!sentinel.is_armed());
        assert!(!sentinel.observe(1.0, true));

        sentinel.sync(false);
        assert_eq!(sentinel.generation(), Some(2));
        assert!(sentinel.observe(1.0, true));
    }

    #[test]
    fn test_wait_for_exit_holds_next_subscription() {
        let mut sentinel = Sentinel::default();
        sentinel.wait_for_exit();
        sentinel.sync(false);

        assert!(sentinel.is_armed());
        assert!(!sentinel.observe(1.0, true));
        assert!(!sentinel.observe(1.0, true));

        assert!(!sentinel.observe(0.0, true));
        assert!(sentinel.observe(1.0, true));
    }

    #[test]
    fn test_wait_for_exit_holds_current_subscription() {
        let mut sentinel = armed();
        sentinel.wait_for_exit();

        assert!(!sentinel.observe(1.0, true));

        sentinel.sync(true);
        sentinel.sync(false);
        assert!(sentinel.observe(1.0, true));
    }

    #[test]
    fn test_reenter_releases_hold() {
        let mut sentinel = Sentinel::default();
        sentinel.wait_for_exit();
        sentinel.sync(false);
        assert!(!sentinel.observe(1.0, true));

        sentinel.reenter();
        assert!(sentinel.observe(1.0, true));
        assert!(!sentinel.observe(1.0, true));
    }

    #[test]
    fn test_sync_without_transition_keeps_subscription() {
        let mut sentinel = armed();
        assert!(sentinel.observe(1.0, true));

        sentinel.sync(false);
        assert_eq!(sentinel.generation(), Some(1));
        assert!(!sentinel.observe(1.0, true));
    }
}
