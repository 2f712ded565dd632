use std::env;
use std::path::PathBuf;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::gradient::Rgb;

/// Which scoring backend the demo binary talks to.
#[derive(Debug, Clone, PartialEq)]
pub enum ScoringBackend {
    /// A local checker server exposing POST /check and POST /suggest_score
    LocalServer,
    /// The Perspective API directly — requires PERSPECTIVE_API_KEY
    DirectApi,
}

/// Engine configuration loaded from environment variables.
///
/// This covers the hosting concerns (which backend, where the session id
/// lives); the widget's own behavior is configured through [`WidgetConfig`].
/// The .env file is loaded at startup via dotenvy.
pub struct EngineConfig {
    /// Base URL of the local checker server (LITMUS_SERVER_URL)
    pub server_url: String,
    pub perspective_api_key: String,
    /// Optional community identifier forwarded with every check request
    pub community_id: Option<String>,
    /// Directory holding the persisted session id
    pub session_dir: PathBuf,
    pub backend: ScoringBackend,
}

impl EngineConfig {
    /// Load configuration from environment variables.
    ///
    /// Everything has a workable default except the API key, which is
    /// validated lazily via `require_perspective` on the direct path.
    pub fn load() -> Result<Self> {
        let backend = match env::var("LITMUS_BACKEND").as_deref() {
            Ok("direct") => ScoringBackend::DirectApi,
            // "server" or unset both default to the local server path
            _ => ScoringBackend::LocalServer,
        };

        let session_dir = env::var("LITMUS_SESSION_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| crate::session::default_session_dir());

        Ok(Self {
            server_url: env::var("LITMUS_SERVER_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            perspective_api_key: env::var("PERSPECTIVE_API_KEY").unwrap_or_default(),
            community_id: env::var("LITMUS_COMMUNITY_ID").ok(),
            session_dir,
            backend,
        })
    }

    /// Check that the Perspective API key is configured.
    /// Call this before constructing the direct-API client.
    pub fn require_perspective(&self) -> Result<()> {
        if self.perspective_api_key.is_empty() {
            bail!(
                "PERSPECTIVE_API_KEY not set. Add it to your .env file,\n\
                 or unset LITMUS_BACKEND to use a local checker server."
            );
        }
        Ok(())
    }
}

/// How the loading/score indicator is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadingIconStyle {
    /// Morphing circle/square/diamond shapes
    Shape,
    /// Smile/neutral/sad emoji faces
    Emoji,
}

impl LoadingIconStyle {
    /// Parse a host-provided style name.
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "shape" | "circle_square_diamond" => Ok(Self::Shape),
            "emoji" => Ok(Self::Emoji),
            other => {
                bail!("Unknown loading icon style {other:?} (expected \"shape\" or \"emoji\")")
            }
        }
    }
}

/// The three score thresholds partitioning [0,1] into four bands.
///
/// Invariant: strictly increasing. Enforced by [`WidgetConfig::validate`];
/// the band-selection functions in `widget::state` assume it holds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreThresholds {
    pub okay: f64,
    pub borderline: f64,
    pub uncivil: f64,
}

impl Default for ScoreThresholds {
    fn default() -> Self {
        Self {
            okay: 0.0,
            borderline: 0.4,
            uncivil: 0.7,
        }
    }
}

impl ScoreThresholds {
    pub fn as_array(&self) -> [f64; 3] {
        [self.okay, self.borderline, self.uncivil]
    }

    fn validate(&self) -> Result<()> {
        if !(self.okay < self.borderline && self.borderline < self.uncivil) {
            bail!(
                "Score thresholds must be strictly increasing, got [{}, {}, {}]",
                self.okay,
                self.borderline,
                self.uncivil
            );
        }
        Ok(())
    }
}

/// The full host-visible widget configuration surface.
///
/// Every recognized option is an explicit field with a default; unknown
/// options simply don't exist. Construct with `WidgetConfig::default()`,
/// override fields, then hand it to the widget builder, which calls
/// [`WidgetConfig::validate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetConfig {
    pub score_thresholds: ScoreThresholds,
    /// Gradient anchor colors as `#rrggbb` hex strings, one per threshold
    pub gradient_colors: [String; 3],
    pub loading_icon_style: LoadingIconStyle,
    /// Hide the indicator once loading finishes
    pub hide_loading_icon_after_load: bool,
    /// Hide the indicator while loading and for scores below the lowest threshold
    pub hide_loading_icon_for_low_scores: bool,
    /// Unconditional override: never show the indicator
    pub always_hide_loading_icon: bool,
    /// Feedback text per score band (okay, borderline, uncivil)
    pub feedback_text: [String; 3],
    pub show_percentage: bool,
    pub show_more_info_link: bool,
    pub user_feedback_prompt_text: String,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            score_thresholds: ScoreThresholds::default(),
            gradient_colors: [
                "#25C1F9".to_string(),
                "#7C4DFF".to_string(),
                "#D400F9".to_string(),
            ],
            loading_icon_style: LoadingIconStyle::Shape,
            hide_loading_icon_after_load: false,
            hide_loading_icon_for_low_scores: false,
            always_hide_loading_icon: false,
            feedback_text: [
                "Unlikely to be perceived as toxic".to_string(),
                "Unsure if this will be perceived as toxic".to_string(),
                "Likely to be perceived as toxic".to_string(),
            ],
            show_percentage: true,
            show_more_info_link: true,
            user_feedback_prompt_text: "Seem wrong?".to_string(),
        }
    }
}

impl WidgetConfig {
    /// Validate the configuration: thresholds strictly increasing, anchor
    /// colors parseable. Returns the first violation found.
    pub fn validate(&self) -> Result<()> {
        self.score_thresholds.validate()?;
        self.anchors()?;
        Ok(())
    }

    /// Parse the gradient anchor colors.
    pub fn anchors(&self) -> Result<[Rgb; 3]> {
        Ok([
            Rgb::from_hex(&self.gradient_colors[0])?,
            Rgb::from_hex(&self.gradient_colors[1])?,
            Rgb::from_hex(&self.gradient_colors[2])?,
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(WidgetConfig::default().validate().is_ok());
    }

    #[test]
    fn non_increasing_thresholds_rejected() {
        let mut config = WidgetConfig::default();
        config.score_thresholds = ScoreThresholds {
            okay: 0.5,
            borderline: 0.5,
            uncivil: 0.7,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn bad_anchor_color_rejected() {
        let mut config = WidgetConfig::default();
        config.gradient_colors[1] = "not-a-color".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn style_names_parse() {
        assert_eq!(
            LoadingIconStyle::parse("shape").unwrap(),
            LoadingIconStyle::Shape
        );
        assert_eq!(
            LoadingIconStyle::parse("emoji").unwrap(),
            LoadingIconStyle::Emoji
        );
        assert!(LoadingIconStyle::parse("sparkles").is_err());
    }
}
