// Seams of the engine: playlist enumeration and event publishing

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::models::{EngineEvent, ProgressEvent, RunSummary, StatusEvent};

/// Result of asking the tool how many entries a playlist has.
///
/// `Unknown` keeps "could not tell" apart from a genuinely empty playlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaylistCount {
    Known(usize),
    Unknown,
}

impl PlaylistCount {
    /// Count as a plain integer, 0 when unknown
    pub fn value(&self) -> usize {
        match self {
            Self::Known(n) => *n,
            Self::Unknown => 0,
        }
    }

    /// Count only when it is known and non-zero
    pub fn positive(&self) -> Option<usize> {
        match self {
            Self::Known(n) if *n > 0 => Some(*n),
            _ => None,
        }
    }
}

/// Trait for playlist enumeration backends
#[async_trait]
pub trait PlaylistProbe: Send + Sync {
    /// Name of the probe (for logging)
    fn name(&self) -> &'static str;

    /// Never fails past this boundary; problems come back as `Unknown`
    async fn count_items(&self, playlist_url: &str) -> PlaylistCount;
}

/// Publishes engine events to whoever holds the receiving end
#[derive(Clone)]
pub struct ProgressEmitter {
    sender: mpsc::UnboundedSender<EngineEvent>,
}

impl ProgressEmitter {
    pub fn new(sender: mpsc::UnboundedSender<EngineEvent>) -> Self {
        Self { sender }
    }

    /// Emitter plus the receiver it feeds
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<EngineEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self::new(sender), receiver)
    }

    pub fn emit(&self, event: EngineEvent) {
        // a closed receiver only means nobody is watching any more
        let _ = self.sender.send(event);
    }

    pub fn progress(&self, percent: f32) {
        self.emit(EngineEvent::Progress(ProgressEvent { percent }));
    }

    pub fn status(&self, status: StatusEvent) {
        self.emit(EngineEvent::Status(status));
    }

    pub fn finished(&self, summary: RunSummary) {
        self.emit(EngineEvent::Finished(summary));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playlist_count_values() {
        assert_eq!(PlaylistCount::Known(7).value(), 7);
        assert_eq!(PlaylistCount::Unknown.value(), 0);
        assert_eq!(PlaylistCount::Known(7).positive(), Some(7));
        assert_eq!(PlaylistCount::Known(0).positive(), None);
        assert_eq!(PlaylistCount::Unknown.positive(), None);
    }

    #[test]
    fn test_emitter_survives_dropped_receiver() {
        let (emitter, receiver) = ProgressEmitter::channel();
        drop(receiver);
        emitter.progress(10.0);
        emitter.status(StatusEvent::info("still fine"));
    }

    #[test]
    fn test_emitter_delivers_in_order() {
        let (emitter, mut receiver) = ProgressEmitter::channel();
        emitter.progress(1.0);
        emitter.status(StatusEvent::warning("w"));
        assert_eq!(
            receiver.try_recv().unwrap(),
            EngineEvent::Progress(ProgressEvent { percent: 1.0 })
        );
        assert!(matches!(receiver.try_recv().unwrap(), EngineEvent::Status(_)));
    }
}
