use bevy::prelude::*;

use crate::rpc::web_rpc::WebRpcInterface;

/// Settled/total accounting for every initially-known asset: one unit for
/// the catalog document itself plus one per car slot. The denominator is
/// fixed when the catalog settles, so the percentage is monotonic and
/// reaches 100 exactly when the last model settles (geometry or
/// placeholder). A stalled fetch shows as a stuck percentage, never as an
/// error.
#[derive(Resource, Default)]
pub struct LoadingProgress {
    total: usize,
    settled: usize,
    last_reported: Option<u8>,
}

impl LoadingProgress {
    /// Called once when the catalog settles; the catalog counts as one
    /// settled unit.
    pub fn begin(&mut self, slot_count: usize) {
        self.total = slot_count + 1;
        self.settled = 1;
    }

    /// One model fetch finished.
    pub fn mark_settled(&mut self) {
        self.settled = (self.settled + 1).min(self.total);
    }

    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        ((self.settled * 100 + self.total / 2) / self.total) as u8
    }

    /// Next value worth reporting, if the percentage advanced.
    fn advance(&mut self) -> Option<u8> {
        if self.total == 0 {
            return None;
        }
        let percent = self.percent();
        if self.last_reported.is_none_or(|last| percent > last) {
            self.last_reported = Some(percent);
            Some(percent)
        } else {
            None
        }
    }
}

/// Notify the UI layer whenever the percentage advances.
pub fn publish_progress(mut progress: ResMut<LoadingProgress>, mut rpc: ResMut<WebRpcInterface>) {
    if let Some(percent) = progress.advance() {
        rpc.send_notification("load_progress", serde_json::json!({ "percent": percent }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_is_monotonic_and_reaches_100() {
        let mut progress = LoadingProgress::default();
        progress.begin(4);

        let mut last = 0;
        for _ in 0..4 {
            progress.mark_settled();
            let percent = progress.percent();
            assert!(percent >= last);
            last = percent;
        }
        assert_eq!(progress.percent(), 100);
    }

    #[test]
    fn advance_reports_each_value_once() {
        let mut progress = LoadingProgress::default();
        progress.begin(1);

        assert_eq!(progress.advance(), Some(50));
        assert_eq!(progress.advance(), None);
        progress.mark_settled();
        assert_eq!(progress.advance(), Some(100));
        assert_eq!(progress.advance(), None);
    }

    #[test]
    fn nothing_is_reported_before_the_catalog_settles() {
        let mut progress = LoadingProgress::default();
        assert_eq!(progress.advance(), None);
        assert_eq!(progress.percent(), 0);
    }

    #[test]
    fn extra_settles_never_overflow_the_total() {
        let mut progress = LoadingProgress::default();
        progress.begin(1);
        progress.mark_settled();
        progress.mark_settled();
        assert_eq!(progress.percent(), 100);
    }
}
