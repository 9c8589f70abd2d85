// Progress aggregation
//
// The percentage forwarded to the UI always belongs to the media item that is
// currently downloading and restarts at 0 for every work item. Only the
// "N/M completed" counter is monotonic over the whole run.

use super::models::{EngineEvent, ProgressEvent, StatusEvent, WorkItem};
use crate::ytdlp::ToolLine;

#[derive(Debug, Clone)]
pub struct ProgressTracker {
    total: usize,
    /// Media items of fully settled work items
    completed: usize,
    /// Completion markers seen inside the current multi-item work item
    in_flight: usize,
    current_count: usize,
    current_multi: bool,
    /// Set once the current media item produced a completion marker
    current_marked: bool,
}

impl ProgressTracker {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            completed: 0,
            in_flight: 0,
            current_count: 0,
            current_multi: false,
            current_marked: false,
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    /// Value of the "N" in "N/M" right now
    pub fn counter(&self) -> usize {
        self.completed + self.in_flight
    }

    /// Reset per-item state and announce the work item
    pub fn begin(&mut self, item: &WorkItem) -> [EngineEvent; 2] {
        self.in_flight = 0;
        self.current_count = item.item_count;
        self.current_multi = item.kind.is_multi_item();
        self.current_marked = false;

        let position = (self.completed + 1).min(self.total.max(1));
        [
            EngineEvent::Progress(ProgressEvent { percent: 0.0 }),
            EngineEvent::Status(StatusEvent::info(format!(
                "⬇️ Downloading ({}/{})...",
                position, self.total
            ))),
        ]
    }

    /// Fold one recognised stdout line into zero or more events
    pub fn observe(&mut self, line: &ToolLine) -> Vec<EngineEvent> {
        let mut events = Vec::new();

        match line {
            ToolLine::Progress(percent) => {
                events.push(EngineEvent::Progress(ProgressEvent { percent: *percent }));
            }
            ToolLine::ItemHeader { .. } => {
                self.current_marked = false;
            }
            ToolLine::Merging => {
                events.push(EngineEvent::Status(StatusEvent::info(
                    "🔄 Merging video and audio...",
                )));
            }
            ToolLine::AlreadyDownloaded | ToolLine::Destination(_) => {}
        }

        if line.is_completion() && self.current_multi && !self.current_marked {
            self.current_marked = true;
            if self.in_flight < self.current_count {
                self.in_flight += 1;
                events.push(EngineEvent::Status(StatusEvent::info(format!(
                    "⬇️ Completed video {}/{}",
                    self.counter(),
                    self.total
                ))));
            }
        }

        events
    }

    /// Count the whole work item as done, whatever its exit code was
    pub fn settle(&mut self) {
        self.completed += self.current_count;
        self.in_flight = 0;
        self.current_count = 0;
        self.current_multi = false;
        self.current_marked = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn statuses(events: &[EngineEvent]) -> Vec<String> {
        events
            .iter()
            .filter_map(|e| match e {
                EngineEvent::Status(s) => Some(s.message.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_single_item_forwards_percent() {
        let mut tracker = ProgressTracker::new(1);
        let item = WorkItem::single("https://a.example/v");
        let begin = tracker.begin(&item);
        assert_eq!(begin[0], EngineEvent::Progress(ProgressEvent { percent: 0.0 }));
        assert_eq!(statuses(&begin), vec!["⬇️ Downloading (1/1)..."]);

        let events = tracker.observe(&ToolLine::Progress(50.0));
        assert_eq!(events, vec![EngineEvent::Progress(ProgressEvent { percent: 50.0 })]);

        // single items never emit incremental completion lines
        let events = tracker.observe(&ToolLine::Progress(100.0));
        assert_eq!(events.len(), 1);

        tracker.settle();
        assert_eq!(tracker.completed(), 1);
    }

    #[test]
    fn test_playlist_counter_counts_each_item_once() {
        let mut tracker = ProgressTracker::new(4);
        tracker.begin(&WorkItem::full_playlist("https://a.example/p", 3));

        tracker.observe(&ToolLine::ItemHeader { index: 1, count: 3 });
        // merged formats hit 100% twice for one media item
        let first = tracker.observe(&ToolLine::Progress(100.0));
        let second = tracker.observe(&ToolLine::Progress(100.0));
        assert_eq!(statuses(&first), vec!["⬇️ Completed video 1/4"]);
        assert!(statuses(&second).is_empty());

        tracker.observe(&ToolLine::ItemHeader { index: 2, count: 3 });
        let already = tracker.observe(&ToolLine::AlreadyDownloaded);
        assert_eq!(statuses(&already), vec!["⬇️ Completed video 2/4"]);
        assert_eq!(tracker.counter(), 2);
    }

    #[test]
    fn test_counter_capped_at_item_count() {
        let mut tracker = ProgressTracker::new(2);
        tracker.begin(&WorkItem::partial_playlist("https://a.example/w", 1, 3));
        for index in 1..=3 {
            tracker.observe(&ToolLine::ItemHeader { index, count: 3 });
            tracker.observe(&ToolLine::Progress(100.0));
        }
        assert_eq!(tracker.counter(), 1);
        tracker.settle();
        assert_eq!(tracker.completed(), 1);
    }

    #[test]
    fn test_counter_monotonic_across_items() {
        let mut tracker = ProgressTracker::new(3);
        tracker.begin(&WorkItem::full_playlist("p", 2));
        tracker.observe(&ToolLine::Progress(100.0));
        let mid = tracker.counter();
        tracker.settle();
        assert!(tracker.counter() >= mid);

        let begin = tracker.begin(&WorkItem::single("s"));
        assert_eq!(statuses(&begin), vec!["⬇️ Downloading (3/3)..."]);
        assert_eq!(begin[0], EngineEvent::Progress(ProgressEvent { percent: 0.0 }));
    }

    #[test]
    fn test_merge_line_is_informational() {
        let mut tracker = ProgressTracker::new(1);
        tracker.begin(&WorkItem::single("s"));
        let events = tracker.observe(&ToolLine::Merging);
        assert_eq!(statuses(&events), vec!["🔄 Merging video and audio..."]);
    }
}
