// Timeline builders for every transition the state machine plays.
//
// Segment ordering within a timeline is the ordering guarantee the rest of
// the widget relies on: visibility updates play before the shape morph,
// which plays before the detail text fade. Tweens inside one segment (both
// layer panels during a slide) play together.

use tokio::time::Duration;

use crate::config::WidgetConfig;
use crate::gradient::{interpolate_color, Rgb};
use crate::widget::state::{emoji_for_score, shape_for_score, should_hide};

use crate::animation::timeline::{Segment, StateEdit, Timeline, TweenProps, TweenTarget};

pub const VISIBILITY_DURATION: Duration = Duration::from_millis(300);
pub const MORPH_DURATION: Duration = Duration::from_millis(450);
pub const DETAIL_FADE_DURATION: Duration = Duration::from_millis(400);
pub const LOADING_START_DURATION: Duration = Duration::from_millis(600);
pub const LOADING_FADE_DURATION: Duration = Duration::from_millis(500);
pub const LAYER_SLIDE_DURATION: Duration = Duration::from_millis(600);

/// The "update to score" sequence: visibility, then the shape/emoji morph,
/// then the detail text fade-in.
pub fn score_change(config: &WidgetConfig, scale: &[Rgb], score: f64) -> Timeline {
    let hidden = should_hide(config, false, score);
    let color = interpolate_color(score, scale);

    Timeline::new()
        .segment(
            Segment::new("update visibility")
                .on_start(StateEdit::SetHidden(hidden))
                .tween(
                    TweenTarget::Indicator,
                    VISIBILITY_DURATION,
                    TweenProps {
                        opacity: Some(if hidden { 0.0 } else { 1.0 }),
                        scale: Some(if hidden { 0.0 } else { 1.0 }),
                        ..Default::default()
                    },
                ),
        )
        .segment(
            Segment::new("morph to score")
                .tween(
                    TweenTarget::Indicator,
                    MORPH_DURATION,
                    TweenProps {
                        color: Some(color),
                        scale: Some(1.0),
                        ..Default::default()
                    },
                )
                .on_complete(StateEdit::SetShape(shape_for_score(
                    score,
                    &config.score_thresholds,
                )))
                .on_complete(StateEdit::SetEmoji(emoji_for_score(
                    score,
                    &config.score_thresholds,
                ))),
        )
        .segment(Segment::new("fade in details").tween(
            TweenTarget::DetailText,
            DETAIL_FADE_DURATION,
            TweenProps {
                opacity: Some(1.0),
                ..Default::default()
            },
        ))
}

/// The opening segment of the loading animation: mark the loading animation
/// as playing, apply the load-start visibility policy, shrink the indicator.
pub fn loading_start(config: &WidgetConfig) -> Timeline {
    let hidden = should_hide(config, true, 0.0);

    Timeline::new().segment(
        Segment::new("begin loading")
            .on_start(StateEdit::SetPlayingLoadingAnimation(true))
            .on_start(StateEdit::SetHidden(hidden))
            .tween(
                TweenTarget::Indicator,
                LOADING_START_DURATION,
                TweenProps {
                    scale: Some(0.5),
                    opacity: Some(if hidden { 0.0 } else { 1.0 }),
                    ..Default::default()
                },
            ),
    )
}

/// One iteration of the repeating fade/shrink loop. Completion of this
/// timeline is the loop boundary where `is_loading` is re-checked.
pub fn loading_cycle() -> Timeline {
    Timeline::new()
        .segment(Segment::new("loading fade down").tween(
            TweenTarget::Indicator,
            LOADING_FADE_DURATION,
            TweenProps {
                opacity: Some(0.25),
                scale: Some(0.35),
                ..Default::default()
            },
        ))
        .segment(Segment::new("loading fade up").tween(
            TweenTarget::Indicator,
            LOADING_FADE_DURATION,
            TweenProps {
                opacity: Some(1.0),
                scale: Some(0.5),
                ..Default::default()
            },
        ))
}

/// The end-of-loading sequence, built against the resolved score: restore
/// visibility and shape, fade the detail text back in, and clear the
/// loading-animation flag at the very end.
pub fn loading_end(config: &WidgetConfig, scale: &[Rgb], score: f64) -> Timeline {
    let hidden = should_hide(config, false, score);
    let color = interpolate_color(score, scale);

    Timeline::new()
        .segment(
            Segment::new("restore indicator")
                .on_start(StateEdit::SetHidden(hidden))
                .tween(
                    TweenTarget::Indicator,
                    LOADING_START_DURATION,
                    TweenProps {
                        scale: Some(if hidden { 0.0 } else { 1.0 }),
                        opacity: Some(if hidden { 0.0 } else { 1.0 }),
                        color: Some(color),
                        ..Default::default()
                    },
                )
                .on_complete(StateEdit::SetShape(shape_for_score(
                    score,
                    &config.score_thresholds,
                )))
                .on_complete(StateEdit::SetEmoji(emoji_for_score(
                    score,
                    &config.score_thresholds,
                ))),
        )
        .segment(
            Segment::new("restore details")
                .tween(
                    TweenTarget::DetailText,
                    DETAIL_FADE_DURATION,
                    TweenProps {
                        opacity: Some(1.0),
                        ..Default::default()
                    },
                )
                .on_complete(StateEdit::SetPlayingLoadingAnimation(false)),
        )
}

/// Slide the current layer out while the target slides in. Direction
/// follows index order: moving to a higher layer slides leftward.
pub fn layer_slide(current: usize, target: usize) -> Timeline {
    let direction = if target > current { -1.0 } else { 1.0 };

    Timeline::new().segment(
        Segment::new("layer slide")
            .tween(
                TweenTarget::Layer(current),
                LAYER_SLIDE_DURATION,
                TweenProps {
                    x_offset: Some(direction),
                    opacity: Some(0.0),
                    ..Default::default()
                },
            )
            .tween(
                TweenTarget::Layer(target),
                LAYER_SLIDE_DURATION,
                TweenProps {
                    x_offset: Some(0.0),
                    opacity: Some(1.0),
                    ..Default::default()
                },
            )
            .on_complete(StateEdit::SetLayer(target)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gradient::{adjusted_control_points, build_color_scale, GRADIENT_POINT_COUNT};
    use crate::widget::state::Shape;

    fn scale() -> Vec<Rgb> {
        let config = WidgetConfig::default();
        let points = adjusted_control_points(
            GRADIENT_POINT_COUNT,
            config.score_thresholds.as_array(),
        );
        build_color_scale(config.anchors().unwrap(), points, GRADIENT_POINT_COUNT)
    }

    #[test]
    fn score_change_orders_visibility_morph_details() {
        let timeline = score_change(&WidgetConfig::default(), &scale(), 0.85);
        let labels: Vec<_> = timeline.segments.iter().map(|s| s.label).collect();
        assert_eq!(
            labels,
            vec!["update visibility", "morph to score", "fade in details"]
        );
    }

    #[test]
    fn score_change_morph_targets_score_band() {
        let timeline = score_change(&WidgetConfig::default(), &scale(), 0.85);
        let morph = &timeline.segments[1];
        assert!(morph
            .on_complete
            .contains(&StateEdit::SetShape(Shape::Diamond)));
    }

    #[test]
    fn score_change_hides_when_always_hide_is_set() {
        let mut config = WidgetConfig::default();
        config.always_hide_loading_icon = true;
        let timeline = score_change(&config, &scale(), 0.85);
        assert!(timeline.segments[0]
            .on_start
            .contains(&StateEdit::SetHidden(true)));
    }

    #[test]
    fn loading_end_clears_the_playing_flag_last() {
        let timeline = loading_end(&WidgetConfig::default(), &scale(), 0.3);
        let last = timeline.segments.last().unwrap();
        assert!(last
            .on_complete
            .contains(&StateEdit::SetPlayingLoadingAnimation(false)));
    }

    #[test]
    fn layer_slide_updates_the_layer_on_completion() {
        let timeline = layer_slide(0, 2);
        assert!(timeline.segments[0]
            .on_complete
            .contains(&StateEdit::SetLayer(2)));
    }

    #[test]
    fn layer_slide_direction_follows_index_order() {
        let up = layer_slide(0, 1);
        let down = layer_slide(1, 0);
        assert_eq!(up.segments[0].tweens[0].props.x_offset, Some(-1.0));
        assert_eq!(down.segments[0].tweens[0].props.x_offset, Some(1.0));
    }
}
