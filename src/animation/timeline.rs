// Timeline value types — the unit of work handed to an animation driver.
//
// A timeline is an ordered list of segments; segments play strictly in
// order, while the tweens inside one segment play together. State edits are
// attached to segment boundaries so the state machine mutates its visual
// state only when the driver reports that a boundary was reached, never at
// submission time.

use tokio::time::Duration;

use crate::gradient::Rgb;
use crate::widget::state::{Emoji, Shape};

/// What a tween animates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TweenTarget {
    /// The score indicator element (shape or emoji)
    Indicator,
    /// One of the stacked UI layers
    Layer(usize),
    /// The detail text under the indicator
    DetailText,
}

/// Animatable properties. Only the set properties are tweened.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TweenProps {
    pub opacity: Option<f64>,
    pub scale: Option<f64>,
    /// Horizontal offset in fractional layer widths (for layer slides)
    pub x_offset: Option<f64>,
    pub color: Option<Rgb>,
}

/// One property animation over a duration.
#[derive(Debug, Clone, PartialEq)]
pub struct Tween {
    pub target: TweenTarget,
    pub duration: Duration,
    pub props: TweenProps,
}

/// A visual-state mutation applied at a segment boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StateEdit {
    SetShape(Shape),
    SetEmoji(Emoji),
    SetLayer(usize),
    SetHidden(bool),
    SetPlayingLoadingAnimation(bool),
}

/// A group of tweens that play together, with edits applied when the
/// segment starts and when it completes.
#[derive(Debug, Clone, Default)]
pub struct Segment {
    pub label: &'static str,
    pub tweens: Vec<Tween>,
    pub on_start: Vec<StateEdit>,
    pub on_complete: Vec<StateEdit>,
}

impl Segment {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            ..Default::default()
        }
    }

    pub fn tween(mut self, target: TweenTarget, duration: Duration, props: TweenProps) -> Self {
        self.tweens.push(Tween {
            target,
            duration,
            props,
        });
        self
    }

    pub fn on_start(mut self, edit: StateEdit) -> Self {
        self.on_start.push(edit);
        self
    }

    pub fn on_complete(mut self, edit: StateEdit) -> Self {
        self.on_complete.push(edit);
        self
    }

    /// A segment's duration is its longest tween (tweens run together).
    pub fn duration(&self) -> Duration {
        self.tweens
            .iter()
            .map(|t| t.duration)
            .max()
            .unwrap_or(Duration::ZERO)
    }
}

/// An ordered sequence of segments.
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    pub segments: Vec<Segment>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn segment(mut self, segment: Segment) -> Self {
        self.segments.push(segment);
        self
    }

    /// Total wall-clock duration when played at normal speed.
    pub fn duration(&self) -> Duration {
        self.segments.iter().map(|s| s.duration()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_duration_is_longest_tween() {
        let segment = Segment::new("test")
            .tween(
                TweenTarget::Indicator,
                Duration::from_millis(300),
                TweenProps::default(),
            )
            .tween(
                TweenTarget::DetailText,
                Duration::from_millis(450),
                TweenProps::default(),
            );
        assert_eq!(segment.duration(), Duration::from_millis(450));
    }

    #[test]
    fn timeline_duration_sums_segments() {
        let timeline = Timeline::new()
            .segment(Segment::new("a").tween(
                TweenTarget::Indicator,
                Duration::from_millis(100),
                TweenProps::default(),
            ))
            .segment(Segment::new("b").tween(
                TweenTarget::Indicator,
                Duration::from_millis(200),
                TweenProps::default(),
            ));
        assert_eq!(timeline.duration(), Duration::from_millis(300));
    }

    #[test]
    fn empty_segment_has_zero_duration() {
        assert_eq!(Segment::new("edits-only").duration(), Duration::ZERO);
    }
}
