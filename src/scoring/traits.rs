// Score fetcher trait — the swap-ready abstraction over the scoring backend.
//
// The widget talks to whichever backend is configured (a local checker
// server or the Perspective API directly) through this trait, so the
// coordinator and state machine never care which one is wired in.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::error;

/// Response to a check request: per-attribute span scores.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    #[serde(default)]
    pub attribute_scores: HashMap<String, AttributeScores>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeScores {
    #[serde(default)]
    pub span_scores: Vec<SpanScore>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpanScore {
    pub score: ScoreValue,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScoreValue {
    pub value: f64,
}

/// The single score the widget displays: the maximum across every
/// attribute's span scores. A response with no span values is treated as 0
/// and logged — it means the backend answered with an unexpected shape.
pub fn max_span_score(response: &AnalyzeResponse) -> f64 {
    let mut max: Option<f64> = None;
    for scores in response.attribute_scores.values() {
        for span in &scores.span_scores {
            max = Some(match max {
                Some(current) => current.max(span.score.value),
                None => span.score.value,
            });
        }
    }
    match max {
        Some(value) => value,
        None => {
            error!("Analyze response contained no span scores; treating score as 0");
            0.0
        }
    }
}

/// Scoring backend interface. Implementations are async because both
/// backends are HTTP APIs.
#[async_trait]
pub trait ScoreFetcher: Send + Sync {
    /// Score a comment. `community_id` is forwarded when the host supplies one.
    async fn check(
        &self,
        comment: &str,
        session_id: &str,
        community_id: Option<&str>,
    ) -> Result<AnalyzeResponse>;

    /// Submit user feedback on whether the comment was toxic.
    async fn suggest_score(
        &self,
        comment: &str,
        session_id: &str,
        marked_as_toxic: bool,
    ) -> Result<()>;
}
