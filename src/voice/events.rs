use serenity::async_trait;
use songbird::tracks::PlayMode;
use songbird::{Event, EventContext, EventHandler as VoiceEventHandler};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Signals a waiting command once the track it started has finished.
///
/// Registered for both `TrackEvent::End` and `TrackEvent::Error`; clones
/// share one sender, so whichever fires first wins and later events are ignored.
#[derive(Clone)]
pub struct PlaybackFinished {
    sender: Arc<Mutex<Option<oneshot::Sender<PlaybackEnd>>>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEnd {
    Completed,
    Failed,
}

impl PlaybackFinished {
    pub fn new() -> (Self, oneshot::Receiver<PlaybackEnd>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                sender: Arc::new(Mutex::new(Some(tx))),
            },
            rx,
        )
    }

    fn notify(&self, end: PlaybackEnd) {
        let sender = match self.sender.lock() {
            Ok(mut guard) => guard.take(),
            Err(_) => {
                warn!("Playback notifier mutex poisoned");
                None
            }
        };
        if let Some(tx) = sender {
            // The receiver is gone if the command was dropped mid-playback
            let _ = tx.send(end);
        }
    }
}

#[async_trait]
impl VoiceEventHandler for PlaybackFinished {
    async fn act(&self, ctx: &EventContext<'_>) -> Option<Event> {
        if let EventContext::Track(track_list) = ctx {
            for (state, handle) in *track_list {
                debug!("Track {} changed state: {:?}", handle.uuid(), state.playing);
                let end = match &state.playing {
                    PlayMode::Errored(_) => PlaybackEnd::Failed,
                    PlayMode::End | PlayMode::Stop => PlaybackEnd::Completed,
                    _ => continue,
                };
                self.notify(end);
            }
        }
        None
    }
}
