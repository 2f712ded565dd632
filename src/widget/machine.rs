// The widget state machine — the core of the engine.
//
// The machine is a single actor task owning the visual state. Hosts talk to
// it through a cloneable WidgetHandle; the animation driver talks back
// through boundary notices. All state mutation happens inside the run loop
// when a command or notice is processed, so the machine tolerates
// interrupted, overlapping, and out-of-order transitions:
//
//   - a newer indicator sequence kills the previous one (kill-and-replace,
//     never locking), and notices from killed playbacks are discarded by id;
//   - a score arriving while the loading loop plays is deferred and resolved
//     at the next loop boundary that observes `is_loading == false`;
//   - reconfiguration during loading is queued and applied after the
//     end-of-loading sequence.

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::{broadcast, mpsc, RwLock};
use tracing::{debug, error, warn};

use crate::animation::driver::{AnimationDriver, Boundary, Playback, PlaybackId, PlaybackNotice};
use crate::animation::timeline::{StateEdit, Timeline};
use crate::config::WidgetConfig;
use crate::gradient::{
    adjusted_control_points, build_color_scale, interpolate_color, Rgb, GRADIENT_POINT_COUNT,
};
use crate::scoring::coordinator::user_facing_message;
use crate::scoring::traits::ScoreFetcher;
use crate::widget::events::WidgetEvent;
use crate::widget::sequences;
use crate::widget::state::{should_show_feedback, VisualState, LAYER_COUNT};

/// Layer index of the feedback-result panel.
const FEEDBACK_RESULT_LAYER: usize = 2;

/// Commands accepted by the state machine.
#[derive(Debug)]
pub enum WidgetCommand {
    ScoreChanged(f64),
    SetLoading(bool),
    TransitionToLayer(usize),
    UpdateConfig(WidgetConfig),
    SubmitFeedback {
        comment: String,
        marked_as_toxic: bool,
    },
    ModelInfoLinkClicked,
    ShowError(Option<String>),
    AllowFeedback(bool),
}

/// A host-readable copy of the widget's current state, refreshed after
/// every processed command or animation boundary.
#[derive(Debug, Clone, Default)]
pub struct WidgetSnapshot {
    pub state: VisualState,
    pub score: f64,
    /// The indicator's current gradient color for the score
    pub color: Rgb,
    pub error_message: Option<String>,
    pub feedback_allowed: bool,
    /// Derived: feedback is allowed and the score clears the feedback threshold
    pub show_feedback_prompt: bool,
}

/// Cloneable handle to a spawned widget state machine.
#[derive(Clone)]
pub struct WidgetHandle {
    commands: mpsc::UnboundedSender<WidgetCommand>,
    events: broadcast::Sender<WidgetEvent>,
    snapshot: Arc<RwLock<WidgetSnapshot>>,
}

impl WidgetHandle {
    pub fn notify_score_change(&self, score: f64) {
        let _ = self.commands.send(WidgetCommand::ScoreChanged(score));
    }

    pub fn set_loading(&self, loading: bool) {
        let _ = self.commands.send(WidgetCommand::SetLoading(loading));
    }

    pub fn transition_to_layer(&self, target: usize) {
        let _ = self.commands.send(WidgetCommand::TransitionToLayer(target));
    }

    /// Reconfigure the widget. Validation happens here so the caller gets
    /// the error; the machine coalesces the change with any in-flight or
    /// loading animation.
    pub fn update_config(&self, config: WidgetConfig) -> Result<()> {
        config.validate()?;
        let _ = self.commands.send(WidgetCommand::UpdateConfig(config));
        Ok(())
    }

    pub fn submit_feedback(&self, comment: impl Into<String>, marked_as_toxic: bool) {
        let _ = self.commands.send(WidgetCommand::SubmitFeedback {
            comment: comment.into(),
            marked_as_toxic,
        });
    }

    pub fn model_info_link_clicked(&self) {
        let _ = self.commands.send(WidgetCommand::ModelInfoLinkClicked);
    }

    pub fn show_error(&self, message: Option<String>) {
        let _ = self.commands.send(WidgetCommand::ShowError(message));
    }

    pub fn allow_feedback(&self, allowed: bool) {
        let _ = self.commands.send(WidgetCommand::AllowFeedback(allowed));
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WidgetEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> WidgetSnapshot {
        self.snapshot.read().await.clone()
    }
}

/// Builder wiring the machine's collaborators before spawning it.
pub struct WidgetBuilder {
    config: WidgetConfig,
    driver: Option<Arc<dyn AnimationDriver>>,
    fetcher: Option<Arc<dyn ScoreFetcher>>,
    session_id: String,
}

impl WidgetBuilder {
    pub fn new(config: WidgetConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            driver: None,
            fetcher: None,
            session_id: "0".to_string(),
        })
    }

    pub fn driver(mut self, driver: Arc<dyn AnimationDriver>) -> Self {
        self.driver = Some(driver);
        self
    }

    pub fn fetcher(mut self, fetcher: Arc<dyn ScoreFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }

    /// Spawn the state machine task. Must be called inside a tokio runtime.
    /// The machine stops once every handle clone has been dropped.
    pub fn spawn(self) -> Result<WidgetHandle> {
        let scale = scale_for(&self.config)?;
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (notices_tx, notices_rx) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(64);
        let snapshot = Arc::new(RwLock::new(WidgetSnapshot::default()));

        let machine = WidgetStateMachine {
            config: self.config,
            scale,
            state: VisualState::default(),
            score: 0.0,
            pending_score: None,
            queued_config: None,
            driver: self.driver,
            fetcher: self.fetcher,
            session_id: self.session_id,
            error_message: None,
            feedback_allowed: false,
            commands_rx,
            commands_weak: commands_tx.downgrade(),
            notices_rx,
            notices_tx,
            events: events.clone(),
            snapshot: snapshot.clone(),
            next_playback: 0,
            indicator_seq: None,
            layer_seq: None,
        };
        tokio::spawn(machine.run());

        Ok(WidgetHandle {
            commands: commands_tx,
            events,
            snapshot,
        })
    }
}

fn scale_for(config: &WidgetConfig) -> Result<Vec<Rgb>> {
    let points = adjusted_control_points(
        GRADIENT_POINT_COUNT,
        config.score_thresholds.as_array(),
    );
    Ok(build_color_scale(config.anchors()?, points, GRADIENT_POINT_COUNT))
}

/// Which kind of sequence a playback belongs to. Same-kind slots are
/// kill-and-replace; the Loading* kinds chain into each other at
/// timeline-completion boundaries.
#[derive(Debug, Clone, Copy, PartialEq)]
enum SequenceKind {
    ScoreChange,
    LoadingStart,
    LoadingCycle,
    LoadingEnd { resolved_pending: bool },
    LayerSlide,
}

struct ActiveSequence {
    playback: Playback,
    timeline: Timeline,
    kind: SequenceKind,
}

enum Slot {
    Indicator,
    Layer,
}

pub struct WidgetStateMachine {
    config: WidgetConfig,
    scale: Vec<Rgb>,
    state: VisualState,
    score: f64,
    /// Score received while the loading loop was playing, to be resolved at
    /// the next loop boundary that sees `is_loading == false`
    pending_score: Option<f64>,
    /// Reconfiguration received during loading, applied after the
    /// end-of-loading sequence
    queued_config: Option<WidgetConfig>,
    driver: Option<Arc<dyn AnimationDriver>>,
    fetcher: Option<Arc<dyn ScoreFetcher>>,
    session_id: String,
    error_message: Option<String>,
    feedback_allowed: bool,
    commands_rx: mpsc::UnboundedReceiver<WidgetCommand>,
    /// Weak so the machine doesn't keep itself alive once handles are gone
    commands_weak: mpsc::WeakUnboundedSender<WidgetCommand>,
    notices_rx: mpsc::UnboundedReceiver<PlaybackNotice>,
    notices_tx: mpsc::UnboundedSender<PlaybackNotice>,
    events: broadcast::Sender<WidgetEvent>,
    snapshot: Arc<RwLock<WidgetSnapshot>>,
    next_playback: PlaybackId,
    /// In-flight sequence mutating the indicator (score change or loading)
    indicator_seq: Option<ActiveSequence>,
    /// In-flight layer slide — independent of the indicator
    layer_seq: Option<ActiveSequence>,
}

impl WidgetStateMachine {
    async fn run(mut self) {
        self.publish().await;
        loop {
            tokio::select! {
                biased;
                command = self.commands_rx.recv() => match command {
                    Some(command) => self.handle_command(command),
                    // Every handle dropped — shut down
                    None => break,
                },
                Some(notice) = self.notices_rx.recv() => self.handle_notice(notice),
            }
            self.publish().await;
        }
        debug!("Widget state machine stopped");
    }

    fn handle_command(&mut self, command: WidgetCommand) {
        match command {
            WidgetCommand::ScoreChanged(score) => {
                let _ = self.events.send(WidgetEvent::ScoreChanged(score));
                // Check the loading flag too: commands are drained before
                // notices, so a score can arrive after SetLoading(true) but
                // before the loop's first boundary notice set the playing flag.
                if self.state.is_loading || self.state.is_playing_loading_animation {
                    debug!(score, "Loading in progress; deferring score");
                    self.pending_score = Some(score);
                } else {
                    self.score = score;
                    let timeline = sequences::score_change(&self.config, &self.scale, score);
                    self.start_indicator(timeline, SequenceKind::ScoreChange);
                }
            }
            WidgetCommand::SetLoading(true) => {
                self.state.is_loading = true;
                if !self.state.is_playing_loading_animation {
                    let timeline = sequences::loading_start(&self.config);
                    self.start_indicator(timeline, SequenceKind::LoadingStart);
                }
            }
            WidgetCommand::SetLoading(false) => {
                // Flag only — the loop exits at its next boundary, never mid-cycle
                self.state.is_loading = false;
            }
            WidgetCommand::TransitionToLayer(target) => self.transition_to_layer(target),
            WidgetCommand::UpdateConfig(config) => {
                if self.state.is_loading || self.state.is_playing_loading_animation {
                    debug!("Loading in progress; queueing reconfiguration");
                    self.queued_config = Some(config);
                } else {
                    self.apply_config(config);
                }
            }
            WidgetCommand::SubmitFeedback {
                comment,
                marked_as_toxic,
            } => self.submit_feedback(comment, marked_as_toxic),
            WidgetCommand::ModelInfoLinkClicked => {
                let _ = self.events.send(WidgetEvent::ModelInfoLinkClicked);
            }
            WidgetCommand::ShowError(message) => {
                if message.is_some() {
                    self.feedback_allowed = false;
                }
                self.error_message = message;
            }
            WidgetCommand::AllowFeedback(allowed) => self.feedback_allowed = allowed,
        }
    }

    fn handle_notice(&mut self, notice: PlaybackNotice) {
        let slot = if self
            .indicator_seq
            .as_ref()
            .is_some_and(|s| s.playback.id() == notice.playback)
        {
            Slot::Indicator
        } else if self
            .layer_seq
            .as_ref()
            .is_some_and(|s| s.playback.id() == notice.playback)
        {
            Slot::Layer
        } else {
            debug!(playback = notice.playback, "Discarding stale playback notice");
            return;
        };

        match notice.boundary {
            Boundary::SegmentStarted(index) => self.apply_segment_edits(&slot, index, false),
            Boundary::SegmentCompleted(index) => self.apply_segment_edits(&slot, index, true),
            Boundary::TimelineCompleted => self.on_timeline_completed(slot),
        }
    }

    fn apply_segment_edits(&mut self, slot: &Slot, index: usize, completed: bool) {
        let sequence = match slot {
            Slot::Indicator => self.indicator_seq.as_ref(),
            Slot::Layer => self.layer_seq.as_ref(),
        };
        let edits: Vec<StateEdit> = match sequence.and_then(|s| s.timeline.segments.get(index)) {
            Some(segment) if completed => segment.on_complete.clone(),
            Some(segment) => segment.on_start.clone(),
            None => {
                warn!(index, "Boundary notice for unknown segment");
                return;
            }
        };
        for edit in edits {
            self.apply_edit(edit);
        }
    }

    fn apply_edit(&mut self, edit: StateEdit) {
        match edit {
            StateEdit::SetShape(shape) => self.state.shape = shape,
            StateEdit::SetEmoji(emoji) => self.state.emoji = emoji,
            StateEdit::SetLayer(layer) => {
                self.state.layer = layer;
                self.state.showing_more_info = layer == 1;
            }
            StateEdit::SetHidden(hidden) => self.state.hide_indicator = hidden,
            StateEdit::SetPlayingLoadingAnimation(playing) => {
                self.state.is_playing_loading_animation = playing;
            }
        }
    }

    fn on_timeline_completed(&mut self, slot: Slot) {
        match slot {
            Slot::Layer => {
                self.layer_seq = None;
            }
            Slot::Indicator => {
                let kind = match self.indicator_seq.take() {
                    Some(sequence) => sequence.kind,
                    None => return,
                };
                match kind {
                    SequenceKind::ScoreChange => {
                        let _ = self.events.send(WidgetEvent::ScoreChangeAnimationCompleted);
                    }
                    // Both the start segment and each loop cycle end at an
                    // iteration boundary where the loading flag is re-checked.
                    SequenceKind::LoadingStart | SequenceKind::LoadingCycle => {
                        if self.state.is_loading {
                            self.start_indicator(
                                sequences::loading_cycle(),
                                SequenceKind::LoadingCycle,
                            );
                        } else {
                            self.finish_loading();
                        }
                    }
                    SequenceKind::LoadingEnd { resolved_pending } => {
                        self.after_loading_end(resolved_pending);
                    }
                    SequenceKind::LayerSlide => {
                        warn!("Layer slide completed in the indicator slot; ignoring");
                    }
                }
            }
        }
    }

    /// The loop boundary observed `is_loading == false`: resolve the score
    /// that changed meanwhile and play the end-of-loading sequence toward it.
    fn finish_loading(&mut self) {
        let resolved = self.pending_score.take();
        if let Some(score) = resolved {
            self.score = score;
        }
        let timeline = sequences::loading_end(&self.config, &self.scale, self.score);
        self.start_indicator(
            timeline,
            SequenceKind::LoadingEnd {
                resolved_pending: resolved.is_some(),
            },
        );
    }

    fn after_loading_end(&mut self, resolved_pending: bool) {
        if resolved_pending {
            let _ = self.events.send(WidgetEvent::ScoreChangeAnimationCompleted);
        }
        if self.state.is_loading {
            // Loading was re-requested while the end sequence played
            let timeline = sequences::loading_start(&self.config);
            self.start_indicator(timeline, SequenceKind::LoadingStart);
            return;
        }
        // Install a queued reconfiguration before replaying any score that
        // arrived during the end sequence, so the replay uses the new
        // gradient and thresholds.
        let reconfigured = match self.queued_config.take() {
            Some(config) => self.install_config(config),
            None => false,
        };
        if let Some(score) = self.pending_score.take() {
            self.score = score;
            let timeline = sequences::score_change(&self.config, &self.scale, score);
            self.start_indicator(timeline, SequenceKind::ScoreChange);
        } else if reconfigured {
            let timeline = sequences::score_change(&self.config, &self.scale, self.score);
            self.start_indicator(timeline, SequenceKind::ScoreChange);
        }
    }

    fn transition_to_layer(&mut self, target: usize) {
        if target >= LAYER_COUNT {
            error!(target, "Layer index out of range; skipping transition");
            return;
        }
        if target == self.state.layer {
            return;
        }
        let Some(driver) = self.driver.clone() else {
            error!("No animation driver attached; skipping layer transition");
            return;
        };
        if let Some(mut previous) = self.layer_seq.take() {
            debug!("Killing in-flight layer slide");
            previous.playback.kill();
        }
        let timeline = sequences::layer_slide(self.state.layer, target);
        let id = self.next_playback_id();
        let playback = driver.play(id, timeline.clone(), self.notices_tx.clone());
        self.layer_seq = Some(ActiveSequence {
            playback,
            timeline,
            kind: SequenceKind::LayerSlide,
        });
    }

    fn apply_config(&mut self, config: WidgetConfig) {
        if self.install_config(config) {
            // Re-render the current score under the new configuration,
            // replacing any in-flight score-change animation.
            let timeline = sequences::score_change(&self.config, &self.scale, self.score);
            self.start_indicator(timeline, SequenceKind::ScoreChange);
        }
    }

    fn install_config(&mut self, config: WidgetConfig) -> bool {
        match scale_for(&config) {
            Ok(scale) => {
                self.scale = scale;
                self.config = config;
                true
            }
            Err(e) => {
                error!(error = %e, "Rejecting invalid widget configuration");
                false
            }
        }
    }

    fn submit_feedback(&mut self, comment: String, marked_as_toxic: bool) {
        if !self.feedback_allowed {
            warn!("Feedback submitted while not accepted; ignoring");
            return;
        }
        let Some(fetcher) = self.fetcher.clone() else {
            error!("No score fetcher attached; cannot submit feedback");
            return;
        };
        let session_id = self.session_id.clone();
        let events = self.events.clone();
        let commands = self.commands_weak.clone();

        tokio::spawn(async move {
            match fetcher
                .suggest_score(&comment, &session_id, marked_as_toxic)
                .await
            {
                Ok(()) => {
                    let _ = events.send(WidgetEvent::FeedbackSubmitted(marked_as_toxic));
                    if let Some(commands) = commands.upgrade() {
                        let _ = commands
                            .send(WidgetCommand::TransitionToLayer(FEEDBACK_RESULT_LAYER));
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Feedback submission failed");
                    if let Some(commands) = commands.upgrade() {
                        let _ = commands
                            .send(WidgetCommand::ShowError(Some(user_facing_message(&e))));
                    }
                }
            }
        });
    }

    fn start_indicator(&mut self, timeline: Timeline, kind: SequenceKind) {
        let Some(driver) = self.driver.clone() else {
            error!(?kind, "No animation driver attached; skipping transition");
            return;
        };
        if let Some(mut previous) = self.indicator_seq.take() {
            debug!(?kind, previous = ?previous.kind, "Killing in-flight indicator sequence");
            previous.playback.kill();
        }
        let id = self.next_playback_id();
        let playback = driver.play(id, timeline.clone(), self.notices_tx.clone());
        self.indicator_seq = Some(ActiveSequence {
            playback,
            timeline,
            kind,
        });
    }

    fn next_playback_id(&mut self) -> PlaybackId {
        let id = self.next_playback;
        self.next_playback += 1;
        id
    }

    async fn publish(&self) {
        let mut snapshot = self.snapshot.write().await;
        snapshot.state = self.state.clone();
        snapshot.score = self.score;
        snapshot.color = interpolate_color(self.score, &self.scale);
        snapshot.error_message = self.error_message.clone();
        snapshot.feedback_allowed = self.feedback_allowed;
        snapshot.show_feedback_prompt = self.feedback_allowed
            && should_show_feedback(self.score, &self.config.score_thresholds);
    }
}
