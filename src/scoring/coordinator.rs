// Score request coordinator — debounce, dedup, and request lifecycle.
//
// Text changes are debounced for 500 ms and de-duplicated against both the
// last requested and the last pending text. At most one scoring request is
// ever in flight: issuing a new one aborts the previous request task first.
// Clearing the text entirely bypasses the debounce and resets the widget
// synchronously.

use std::sync::Arc;

use anyhow::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::{debug, warn};

use crate::scoring::traits::{max_span_score, ScoreFetcher};
use crate::widget::machine::WidgetHandle;

/// Delay between the last text change and the scoring request.
pub const DEBOUNCE_DELAY: Duration = Duration::from_millis(500);

const UNSUPPORTED_LANGUAGE_FRAGMENT: &str = "does not support request languages";

const UNSUPPORTED_LANGUAGE_MESSAGE: &str =
    "Sorry! We don't support that language yet.";
const GENERIC_ERROR_MESSAGE: &str =
    "Oops, something went wrong while checking your text. Please try again.";

/// Map a request error onto the message shown to the user. Known API
/// failures get friendlier text; everything else gets the generic message.
pub fn user_facing_message(error: &Error) -> String {
    let detail = format!("{error:#}");
    if detail.contains(UNSUPPORTED_LANGUAGE_FRAGMENT) {
        UNSUPPORTED_LANGUAGE_MESSAGE.to_string()
    } else {
        GENERIC_ERROR_MESSAGE.to_string()
    }
}

#[derive(Default)]
struct PendingRequestState {
    /// Text of the most recently issued request
    last_requested_text: String,
    /// Text currently waiting out the debounce delay
    last_pending_requested_text: String,
    /// The debounce timer task
    debounce: Option<JoinHandle<()>>,
    /// The in-flight request task, if any
    in_flight: Option<JoinHandle<()>>,
}

/// Feeds debounced text changes through the scoring backend into the
/// widget state machine.
#[derive(Clone)]
pub struct ScoreRequestCoordinator {
    inner: Arc<Inner>,
}

struct Inner {
    fetcher: Arc<dyn ScoreFetcher>,
    widget: WidgetHandle,
    session_id: String,
    community_id: Option<String>,
    pending: Mutex<PendingRequestState>,
}

impl ScoreRequestCoordinator {
    pub fn new(
        fetcher: Arc<dyn ScoreFetcher>,
        widget: WidgetHandle,
        session_id: impl Into<String>,
        community_id: Option<String>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                fetcher,
                widget,
                session_id: session_id.into(),
                community_id,
                pending: Mutex::new(PendingRequestState::default()),
            }),
        }
    }

    /// Handle a text change from the host.
    ///
    /// Duplicates of the last requested or last pending text are ignored.
    /// The empty string takes the higher-priority clear path: score reset
    /// to 0 and feedback cleared synchronously, independent of any debounce
    /// timer or outstanding request.
    pub async fn on_text_changed(&self, text: &str) {
        let mut pending = self.inner.pending.lock().await;

        // The clear path outranks de-duplication: the initial
        // last-requested text is also empty, and clearing must still work.
        if text.is_empty() {
            if let Some(handle) = pending.debounce.take() {
                handle.abort();
            }
            if let Some(handle) = pending.in_flight.take() {
                handle.abort();
            }
            pending.last_requested_text.clear();
            pending.last_pending_requested_text.clear();

            self.inner.widget.set_loading(false);
            self.inner.widget.show_error(None);
            self.inner.widget.allow_feedback(false);
            self.inner.widget.notify_score_change(0.0);
            return;
        }

        if text == pending.last_requested_text || text == pending.last_pending_requested_text {
            debug!("Ignoring duplicate text change");
            return;
        }

        pending.last_pending_requested_text = text.to_string();
        if let Some(handle) = pending.debounce.take() {
            handle.abort();
        }

        self.inner.widget.set_loading(true);

        let inner = self.inner.clone();
        let text = text.to_string();
        pending.debounce = Some(tokio::spawn(async move {
            tokio::time::sleep(DEBOUNCE_DELAY).await;
            Inner::issue_request(inner, text).await;
        }));
    }
}

impl Inner {
    /// The debounce delay elapsed: issue exactly one request for the latest
    /// text, aborting any previous still-outstanding request first.
    async fn issue_request(inner: Arc<Inner>, text: String) {
        let mut pending = inner.pending.lock().await;
        if let Some(handle) = pending.in_flight.take() {
            debug!("Aborting superseded in-flight request");
            handle.abort();
        }
        pending.last_requested_text = text.clone();

        let request_inner = inner.clone();
        pending.in_flight = Some(tokio::spawn(async move {
            let result = request_inner
                .fetcher
                .check(
                    &text,
                    &request_inner.session_id,
                    request_inner.community_id.as_deref(),
                )
                .await;

            let widget = &request_inner.widget;
            match result {
                Ok(response) => {
                    let score = max_span_score(&response);
                    widget.show_error(None);
                    widget.allow_feedback(true);
                    widget.set_loading(false);
                    widget.notify_score_change(score);
                }
                Err(e) => {
                    warn!(error = %e, "Scoring request failed");
                    widget.show_error(Some(user_facing_message(&e)));
                    widget.allow_feedback(false);
                    widget.set_loading(false);
                }
            }
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn unsupported_language_gets_friendly_message() {
        let error = anyhow!(
            "Perspective comments:analyze returned 400: Attribute TOXICITY \
             does not support request languages: de"
        );
        assert_eq!(user_facing_message(&error), UNSUPPORTED_LANGUAGE_MESSAGE);
    }

    #[test]
    fn unknown_errors_get_the_generic_message() {
        let error = anyhow!("connection refused");
        assert_eq!(user_facing_message(&error), GENERIC_ERROR_MESSAGE);
    }

    #[test]
    fn context_chains_are_searched_for_known_fragments() {
        let error = anyhow!("Attribute TOXICITY does not support request languages: zz")
            .context("Failed to call the Perspective API");
        assert_eq!(user_facing_message(&error), UNSUPPORTED_LANGUAGE_MESSAGE);
    }
}
