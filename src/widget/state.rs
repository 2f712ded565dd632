// Visual state of the indicator and the pure band-selection rules.
//
// These are the types that flow through the state machine. The band
// functions are deliberately separate for shape selection (strict `>`) and
// feedback visibility (inclusive `>=`) — the two comparisons differ at exact
// threshold values and must not be unified, since unifying them would change
// visible behavior at those boundaries.

use serde::{Deserialize, Serialize};

use crate::config::{ScoreThresholds, WidgetConfig};

/// Number of stacked UI layers (icon/prompt, detail/question, feedback-result).
pub const LAYER_COUNT: usize = 3;

/// Indicator shape for the shape-based loading icon style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Shape {
    Circle,
    Square,
    Diamond,
}

impl Shape {
    pub fn as_str(&self) -> &'static str {
        match self {
            Shape::Circle => "circle",
            Shape::Square => "square",
            Shape::Diamond => "diamond",
        }
    }
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Indicator face for the emoji loading icon style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Emoji {
    Smile,
    Neutral,
    Sad,
}

impl Emoji {
    pub fn as_str(&self) -> &'static str {
        match self {
            Emoji::Smile => "smile",
            Emoji::Neutral => "neutral",
            Emoji::Sad => "sad",
        }
    }
}

impl std::fmt::Display for Emoji {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The indicator's visual state.
///
/// Owned exclusively by the widget state machine and mutated only when
/// animation boundary notices are applied — callers observe it through
/// snapshots, never mutate it directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualState {
    pub shape: Shape,
    pub emoji: Emoji,
    /// Current layer index, 0..LAYER_COUNT
    pub layer: usize,
    pub is_loading: bool,
    pub is_playing_loading_animation: bool,
    pub hide_indicator: bool,
    /// Derived: true while the detail/question layer (index 1) is showing
    pub showing_more_info: bool,
}

impl Default for VisualState {
    fn default() -> Self {
        Self {
            shape: Shape::Circle,
            emoji: Emoji::Smile,
            layer: 0,
            is_loading: false,
            is_playing_loading_animation: false,
            hide_indicator: false,
            showing_more_info: false,
        }
    }
}

/// Shape for a score: strictly above the uncivil threshold → Diamond,
/// strictly above borderline → Square, else Circle. Scores exactly equal to
/// a threshold fall to the lower band.
pub fn shape_for_score(score: f64, thresholds: &ScoreThresholds) -> Shape {
    if score > thresholds.uncivil {
        Shape::Diamond
    } else if score > thresholds.borderline {
        Shape::Square
    } else {
        Shape::Circle
    }
}

/// Emoji for a score, same band rules as [`shape_for_score`].
pub fn emoji_for_score(score: f64, thresholds: &ScoreThresholds) -> Emoji {
    if score > thresholds.uncivil {
        Emoji::Sad
    } else if score > thresholds.borderline {
        Emoji::Neutral
    } else {
        Emoji::Smile
    }
}

/// Whether a score is high enough to show the feedback prompt.
/// Inclusive at the lowest threshold, unlike the shape bands.
pub fn should_show_feedback(score: f64, thresholds: &ScoreThresholds) -> bool {
    score >= thresholds.okay
}

/// Index into `feedback_text` for a score, or None when the score is below
/// the lowest threshold and no feedback text applies.
pub fn feedback_text_index(score: f64, thresholds: &ScoreThresholds) -> Option<usize> {
    if score > thresholds.uncivil {
        Some(2)
    } else if score > thresholds.borderline {
        Some(1)
    } else if score >= thresholds.okay {
        Some(0)
    } else {
        None
    }
}

/// The indicator visibility policy.
///
/// `load_start` is true when evaluating at the start of a loading animation
/// (the score is not yet known at that point).
pub fn should_hide(config: &WidgetConfig, load_start: bool, score: f64) -> bool {
    (config.hide_loading_icon_after_load && !load_start)
        || (config.hide_loading_icon_for_low_scores
            && (load_start || score < config.score_thresholds.okay))
        || config.always_hide_loading_icon
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thresholds() -> ScoreThresholds {
        ScoreThresholds {
            okay: 0.0,
            borderline: 0.4,
            uncivil: 0.7,
        }
    }

    #[test]
    fn score_above_uncivil_is_diamond_sad() {
        assert_eq!(shape_for_score(0.75, &thresholds()), Shape::Diamond);
        assert_eq!(emoji_for_score(0.75, &thresholds()), Emoji::Sad);
    }

    #[test]
    fn score_exactly_at_uncivil_falls_to_square() {
        // Strict `>`: the boundary belongs to the lower band
        assert_eq!(shape_for_score(0.7, &thresholds()), Shape::Square);
        assert_eq!(emoji_for_score(0.7, &thresholds()), Emoji::Neutral);
    }

    #[test]
    fn score_exactly_at_borderline_falls_to_circle() {
        assert_eq!(shape_for_score(0.4, &thresholds()), Shape::Circle);
        assert_eq!(emoji_for_score(0.4, &thresholds()), Emoji::Smile);
    }

    #[test]
    fn feedback_is_inclusive_at_the_lowest_threshold() {
        let t = ScoreThresholds {
            okay: 0.2,
            borderline: 0.4,
            uncivil: 0.7,
        };
        assert!(should_show_feedback(0.2, &t));
        assert!(!should_show_feedback(0.19, &t));
    }

    #[test]
    fn feedback_text_bands() {
        let t = ScoreThresholds {
            okay: 0.2,
            borderline: 0.4,
            uncivil: 0.7,
        };
        assert_eq!(feedback_text_index(0.1, &t), None);
        assert_eq!(feedback_text_index(0.2, &t), Some(0));
        assert_eq!(feedback_text_index(0.4, &t), Some(0));
        assert_eq!(feedback_text_index(0.41, &t), Some(1));
        assert_eq!(feedback_text_index(0.71, &t), Some(2));
    }

    #[test]
    fn hide_policy_always_overrides() {
        let mut config = WidgetConfig::default();
        config.always_hide_loading_icon = true;
        assert!(should_hide(&config, true, 0.9));
        assert!(should_hide(&config, false, 0.9));
    }

    #[test]
    fn hide_after_load_shows_during_load_start() {
        let mut config = WidgetConfig::default();
        config.hide_loading_icon_after_load = true;
        assert!(!should_hide(&config, true, 0.0));
        assert!(should_hide(&config, false, 0.9));
    }

    #[test]
    fn hide_for_low_scores_hides_at_load_start_and_below_min() {
        let mut config = WidgetConfig::default();
        config.score_thresholds = ScoreThresholds {
            okay: 0.2,
            borderline: 0.4,
            uncivil: 0.7,
        };
        config.hide_loading_icon_for_low_scores = true;
        assert!(should_hide(&config, true, 0.9));
        assert!(should_hide(&config, false, 0.1));
        assert!(!should_hide(&config, false, 0.5));
    }
}
