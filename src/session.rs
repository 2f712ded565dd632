// Session identifier persistence.
//
// The scoring backend correlates check and feedback requests through a
// session id. It's generated once per installation from a timestamp-seeded
// random value and stored in a small file under the platform data directory,
// so repeated runs reuse the same id.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::debug;

/// Fixed storage key — the filename inside the session directory.
const SESSION_ID_KEY: &str = "session_id";

/// Default directory for the session file (e.g. ~/.local/share/litmus).
pub fn default_session_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("litmus")
}

/// Read the stored session id, or generate and persist a new one.
pub fn get_or_create_session_id(dir: &Path) -> Result<String> {
    let path = dir.join(SESSION_ID_KEY);

    if let Ok(existing) = fs::read_to_string(&path) {
        let existing = existing.trim();
        if !existing.is_empty() {
            return Ok(existing.to_string());
        }
    }

    let id = generate_session_id();
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create session directory {}", dir.display()))?;
    fs::write(&path, &id)
        .with_context(|| format!("Failed to write session id to {}", path.display()))?;

    debug!(session_id = %id, path = %path.display(), "Generated new session id");
    Ok(id)
}

/// A random value seeded by the current timestamp, matching the widget's
/// original id scheme (round(now_millis * random)).
fn generate_session_id() -> String {
    let millis = Utc::now().timestamp_millis() as f64;
    let id = (millis * rand::random::<f64>()).round() as i64;
    id.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_is_stable_across_reads() {
        let dir = std::env::temp_dir().join(format!("litmus-session-test-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);

        let first = get_or_create_session_id(&dir).unwrap();
        let second = get_or_create_session_id(&dir).unwrap();
        assert_eq!(first, second);
        assert!(!first.is_empty());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn generated_ids_are_numeric() {
        let id = generate_session_id();
        assert!(id.parse::<i64>().is_ok(), "expected numeric id, got {id}");
    }
}
