use serde::Deserialize;

/// GitLab CI job/stage/pipeline status as returned by the GraphQL API.
///
/// The GraphQL enum is uppercase (`SUCCESS`, `WAITING_FOR_RESOURCE`, ...);
/// anything the API grows later falls into `Unknown` instead of failing the
/// whole decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Success,
    Failed,
    Running,
    Pending,
    Skipped,
    Canceled,
    Manual,
    Created,
    WaitingForResource,
    Preparing,
    Scheduled,
    #[serde(other)]
    Unknown,
}

/// Semantic emphasis for a status glyph; the TUI maps each category to a
/// color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emphasis {
    Good,
    Bad,
    Active,
    Attention,
    Neutral,
}

impl JobStatus {
    /// Display glyph for this status. Unknown statuses get `?`, never an
    /// error.
    pub fn glyph(self) -> &'static str {
        match self {
            JobStatus::Success => "✓",
            JobStatus::Failed => "✗",
            JobStatus::Running => "⟳",
            JobStatus::Pending => "●",
            JobStatus::Skipped => "⊘",
            JobStatus::Canceled => "⊘",
            JobStatus::Manual => "⚙",
            JobStatus::Created => "·",
            JobStatus::WaitingForResource => "⧖",
            JobStatus::Preparing => "⧗",
            JobStatus::Scheduled => "⏱",
            JobStatus::Unknown => "?",
        }
    }

    pub fn emphasis(self) -> Emphasis {
        match self {
            JobStatus::Success => Emphasis::Good,
            JobStatus::Failed => Emphasis::Bad,
            JobStatus::Running | JobStatus::Preparing => Emphasis::Active,
            JobStatus::Canceled | JobStatus::Manual => Emphasis::Attention,
            JobStatus::Pending
            | JobStatus::Skipped
            | JobStatus::Created
            | JobStatus::WaitingForResource
            | JobStatus::Scheduled
            | JobStatus::Unknown => Emphasis::Neutral,
        }
    }

    /// Log content is expected to still be changing for these.
    pub fn is_active(self) -> bool {
        matches!(self, JobStatus::Running | JobStatus::Pending)
    }

    /// Lowercase label for headers and notifications.
    pub fn label(self) -> &'static str {
        match self {
            JobStatus::Success => "success",
            JobStatus::Failed => "failed",
            JobStatus::Running => "running",
            JobStatus::Pending => "pending",
            JobStatus::Skipped => "skipped",
            JobStatus::Canceled => "canceled",
            JobStatus::Manual => "manual",
            JobStatus::Created => "created",
            JobStatus::WaitingForResource => "waiting for resource",
            JobStatus::Preparing => "preparing",
            JobStatus::Scheduled => "scheduled",
            JobStatus::Unknown => "unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glyph_success() {
        assert_eq!(JobStatus::Success.glyph(), "✓");
    }

    #[test]
    fn glyph_failed() {
        assert_eq!(JobStatus::Failed.glyph(), "✗");
    }

    #[test]
    fn glyph_unknown_fallback() {
        assert_eq!(JobStatus::Unknown.glyph(), "?");
        assert_eq!(JobStatus::Unknown.emphasis(), Emphasis::Neutral);
    }

    #[test]
    fn every_status_has_a_glyph_and_emphasis() {
        let all = [
            JobStatus::Success,
            JobStatus::Failed,
            JobStatus::Running,
            JobStatus::Pending,
            JobStatus::Skipped,
            JobStatus::Canceled,
            JobStatus::Manual,
            JobStatus::Created,
            JobStatus::WaitingForResource,
            JobStatus::Preparing,
            JobStatus::Scheduled,
            JobStatus::Unknown,
        ];
        for status in all {
            assert!(!status.glyph().is_empty());
            // emphasis() is total; just exercise it
            let _ = status.emphasis();
        }
    }

    #[test]
    fn active_statuses() {
        assert!(JobStatus::Running.is_active());
        assert!(JobStatus::Pending.is_active());
        assert!(!JobStatus::Success.is_active());
        assert!(!JobStatus::Created.is_active());
        assert!(!JobStatus::Manual.is_active());
    }

    #[test]
    fn deserialize_screaming_snake_case() {
        let s: JobStatus = serde_json::from_str("\"WAITING_FOR_RESOURCE\"").unwrap();
        assert_eq!(s, JobStatus::WaitingForResource);
    }

    #[test]
    fn deserialize_unknown_variant() {
        let s: JobStatus = serde_json::from_str("\"SOMETHING_NEW\"").unwrap();
        assert_eq!(s, JobStatus::Unknown);
    }
}
