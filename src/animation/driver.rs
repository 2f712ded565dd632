// Animation driver — the swap-ready abstraction over "play a timeline".
//
// The state machine never owns a clock. It submits a timeline to a driver
// and reacts to the boundary notices that come back on its notice channel:
// segment started, segment completed, timeline completed. Each playback
// carries an id so notices from a killed playback can be recognized as
// stale and discarded.
//
// Two drivers ship: TimerDriver sleeps through tween durations on the tokio
// clock (optionally scaled), and InstantDriver reports every boundary
// immediately — that one exists for tests and for headless one-shot use.

use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use super::timeline::Timeline;

/// Identifies one playback; assigned by the submitter.
pub type PlaybackId = u64;

/// A boundary the driver reached while playing a timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    SegmentStarted(usize),
    SegmentCompleted(usize),
    TimelineCompleted,
}

/// One notice on the submitter's channel.
#[derive(Debug, Clone)]
pub struct PlaybackNotice {
    pub playback: PlaybackId,
    pub boundary: Boundary,
}

/// Handle to an in-flight playback. Killing it stops notice delivery before
/// the next boundary; dropping the handle kills implicitly, which is
/// harmless for playbacks that already completed.
pub struct Playback {
    id: PlaybackId,
    kill_tx: Option<oneshot::Sender<()>>,
}

impl Playback {
    pub fn id(&self) -> PlaybackId {
        self.id
    }

    /// Stop the playback. No further notices will be delivered for it.
    pub fn kill(&mut self) {
        if let Some(tx) = self.kill_tx.take() {
            // The receiver is gone once the playback task finished; either
            // way the playback is over.
            let _ = tx.send(());
        }
    }
}

impl Drop for Playback {
    fn drop(&mut self) {
        self.kill();
    }
}

/// Interface over the tweening engine: submit a timeline, get a killable
/// handle, receive boundary notices on `notices`.
pub trait AnimationDriver: Send + Sync {
    fn play(
        &self,
        id: PlaybackId,
        timeline: Timeline,
        notices: mpsc::UnboundedSender<PlaybackNotice>,
    ) -> Playback;
}

/// Plays timelines in real time on the tokio clock.
pub struct TimerDriver {
    /// Playback speed multiplier; 2.0 plays twice as fast. Useful for
    /// demos where the real tween durations feel slow in a terminal.
    speed: f64,
}

impl TimerDriver {
    pub fn new() -> Self {
        Self { speed: 1.0 }
    }

    pub fn with_speed(speed: f64) -> Self {
        Self {
            speed: speed.max(f64::MIN_POSITIVE),
        }
    }
}

impl Default for TimerDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl AnimationDriver for TimerDriver {
    fn play(
        &self,
        id: PlaybackId,
        timeline: Timeline,
        notices: mpsc::UnboundedSender<PlaybackNotice>,
    ) -> Playback {
        let (kill_tx, mut kill_rx) = oneshot::channel::<()>();
        let speed = self.speed;

        tokio::spawn(async move {
            for (index, segment) in timeline.segments.iter().enumerate() {
                if notices
                    .send(PlaybackNotice {
                        playback: id,
                        boundary: Boundary::SegmentStarted(index),
                    })
                    .is_err()
                {
                    return;
                }

                let duration = segment.duration().div_f64(speed);
                tokio::select! {
                    _ = tokio::time::sleep(duration) => {}
                    _ = &mut kill_rx => {
                        debug!(playback = id, segment = segment.label, "Playback killed");
                        return;
                    }
                }

                if notices
                    .send(PlaybackNotice {
                        playback: id,
                        boundary: Boundary::SegmentCompleted(index),
                    })
                    .is_err()
                {
                    return;
                }
            }

            let _ = notices.send(PlaybackNotice {
                playback: id,
                boundary: Boundary::TimelineCompleted,
            });
        });

        Playback {
            id,
            kill_tx: Some(kill_tx),
        }
    }
}

/// Reports every boundary without sleeping. Yields between notices so the
/// submitter's event loop stays responsive to commands arriving in between.
pub struct InstantDriver;

impl AnimationDriver for InstantDriver {
    fn play(
        &self,
        id: PlaybackId,
        timeline: Timeline,
        notices: mpsc::UnboundedSender<PlaybackNotice>,
    ) -> Playback {
        let (kill_tx, mut kill_rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            for index in 0..timeline.segments.len() {
                if kill_rx.try_recv().is_ok() {
                    return;
                }
                if notices
                    .send(PlaybackNotice {
                        playback: id,
                        boundary: Boundary::SegmentStarted(index),
                    })
                    .is_err()
                {
                    return;
                }
                if notices
                    .send(PlaybackNotice {
                        playback: id,
                        boundary: Boundary::SegmentCompleted(index),
                    })
                    .is_err()
                {
                    return;
                }
                tokio::task::yield_now().await;
            }
            if kill_rx.try_recv().is_ok() {
                return;
            }
            let _ = notices.send(PlaybackNotice {
                playback: id,
                boundary: Boundary::TimelineCompleted,
            });
        });

        Playback {
            id,
            kill_tx: Some(kill_tx),
        }
    }
}
