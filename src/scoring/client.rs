// Scoring backend clients.
//
// LocalServerClient talks to a checker server that proxies the analysis
// API (POST /check, POST /suggest_score). DirectApiClient calls the
// Perspective API itself when the host is configured with an API key —
// same logical request and response shape, different endpoints.
//
// API docs: https://developers.perspectiveapi.com/s/about-the-api-methods

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use super::traits::{AnalyzeResponse, ScoreFetcher};

const PERSPECTIVE_BASE_URL: &str = "https://commentanalyzer.googleapis.com/v1alpha1";

fn build_http_client() -> Result<Client> {
    Client::builder()
        .user_agent("litmus/0.1 (toxicity-indicator-widget)")
        .build()
        .context("Failed to build HTTP client")
}

async fn expect_success(response: reqwest::Response, what: &str) -> Result<reqwest::Response> {
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        bail!("{what} returned {status}: {body}");
    }
    Ok(response)
}

/// Client for a local checker server.
pub struct LocalServerClient {
    client: Client,
    base_url: String,
}

impl LocalServerClient {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            client: build_http_client()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckRequest<'a> {
    comment: &'a str,
    session_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    community_id: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SuggestScoreRequest<'a> {
    comment: &'a str,
    session_id: &'a str,
    comment_marked_as_toxic: bool,
}

#[async_trait]
impl ScoreFetcher for LocalServerClient {
    async fn check(
        &self,
        comment: &str,
        session_id: &str,
        community_id: Option<&str>,
    ) -> Result<AnalyzeResponse> {
        let url = format!("{}/check", self.base_url);
        debug!(url = %url, "Check request");

        let response = self
            .client
            .post(&url)
            .json(&CheckRequest {
                comment,
                session_id,
                community_id,
            })
            .send()
            .await
            .context("Failed to call the checker server")?;

        expect_success(response, "Checker server /check")
            .await?
            .json()
            .await
            .context("Failed to parse check response")
    }

    async fn suggest_score(
        &self,
        comment: &str,
        session_id: &str,
        marked_as_toxic: bool,
    ) -> Result<()> {
        let url = format!("{}/suggest_score", self.base_url);
        debug!(url = %url, marked_as_toxic, "Suggest-score request");

        let response = self
            .client
            .post(&url)
            .json(&SuggestScoreRequest {
                comment,
                session_id,
                comment_marked_as_toxic: marked_as_toxic,
            })
            .send()
            .await
            .context("Failed to call the checker server")?;

        expect_success(response, "Checker server /suggest_score").await?;
        Ok(())
    }
}

/// Client for the Perspective API itself.
pub struct DirectApiClient {
    client: Client,
    api_key: String,
}

impl DirectApiClient {
    pub fn new(api_key: String) -> Result<Self> {
        Ok(Self {
            client: build_http_client()?,
            api_key,
        })
    }
}

// --- Perspective API request types ---

#[derive(Serialize)]
struct CommentText<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct RequestedAttributes {
    toxicity: AttributeConfig,
}

#[derive(Serialize)]
struct AttributeConfig {}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeCommentRequest<'a> {
    comment: CommentText<'a>,
    requested_attributes: RequestedAttributes,
    /// Span annotations carry the per-span scores the widget aggregates over
    span_annotations: bool,
    do_not_store: bool,
    session_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    community_id: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SuggestScoreValue {
    value: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SuggestedAttributeScore {
    summary_score: SuggestScoreValue,
}

#[derive(Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct SuggestedScores {
    toxicity: SuggestedAttributeScore,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SuggestCommentScoreRequest<'a> {
    comment: CommentText<'a>,
    attribute_scores: SuggestedScores,
    session_id: &'a str,
}

#[async_trait]
impl ScoreFetcher for DirectApiClient {
    async fn check(
        &self,
        comment: &str,
        session_id: &str,
        community_id: Option<&str>,
    ) -> Result<AnalyzeResponse> {
        let url = format!(
            "{PERSPECTIVE_BASE_URL}/comments:analyze?key={}",
            self.api_key
        );

        let request = AnalyzeCommentRequest {
            comment: CommentText { text: comment },
            requested_attributes: RequestedAttributes {
                toxicity: AttributeConfig {},
            },
            span_annotations: true,
            do_not_store: true,
            session_id,
            community_id,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("Failed to call the Perspective API")?;

        expect_success(response, "Perspective comments:analyze")
            .await?
            .json()
            .await
            .context("Failed to parse Perspective API response")
    }

    async fn suggest_score(
        &self,
        comment: &str,
        session_id: &str,
        marked_as_toxic: bool,
    ) -> Result<()> {
        let url = format!(
            "{PERSPECTIVE_BASE_URL}/comments:suggestscore?key={}",
            self.api_key
        );

        let request = SuggestCommentScoreRequest {
            comment: CommentText { text: comment },
            attribute_scores: SuggestedScores {
                toxicity: SuggestedAttributeScore {
                    summary_score: SuggestScoreValue {
                        value: if marked_as_toxic { 1.0 } else { 0.0 },
                    },
                },
            },
            session_id,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("Failed to call the Perspective API")?;

        expect_success(response, "Perspective comments:suggestscore").await?;
        Ok(())
    }
}
