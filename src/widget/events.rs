// Events the widget emits toward its host.

/// Host-visible widget events, delivered over a broadcast channel obtained
/// from [`WidgetHandle::subscribe`](super::machine::WidgetHandle::subscribe).
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetEvent {
    /// A new score was received (before any animation plays)
    ScoreChanged(f64),
    /// The animation sequence for the latest score finished
    ScoreChangeAnimationCompleted,
    /// The user clicked the model info link
    ModelInfoLinkClicked,
    /// User feedback was submitted; payload is "marked as toxic"
    FeedbackSubmitted(bool),
}
