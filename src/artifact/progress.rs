use std::time::Duration;

use super::models::ArtifactKind;

/// How long each loading message stays up before the next one.
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_millis(2500);

const EXPLANATION_MESSAGES: &[&str] = &[
    "Reading the commit diff...",
    "Following the changed code paths...",
    "Working out what the change is for...",
    "Writing the explanation...",
];

const ANALYSIS_MESSAGES: &[&str] = &[
    "Scanning changed files...",
    "Looking for risky patterns...",
    "Checking error handling and edge cases...",
    "Scoring the overall risk...",
    "Summarising findings...",
];

const REPORT_MESSAGES: &[&str] = &[
    "Collecting task history...",
    "Reviewing linked commits...",
    "Comparing progress against the task description...",
    "Drafting the report...",
];

pub fn messages(kind: ArtifactKind) -> &'static [&'static str] {
    match kind {
        ArtifactKind::Explanation => EXPLANATION_MESSAGES,
        ArtifactKind::Analysis => ANALYSIS_MESSAGES,
        ArtifactKind::Report => REPORT_MESSAGES,
    }
}

/// The message showing after `elapsed` time in the loading state.
pub fn message_at(kind: ArtifactKind, elapsed: Duration, interval: Duration) -> &'static str {
    let list = messages(kind);
    let step = match interval.as_nanos() {
        0 => 0,
        nanos => elapsed.as_nanos() / nanos,
    };
    list[(step % list.len() as u128) as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_rotates_on_interval() {
        let interval = Duration::from_secs(2);
        let at = |elapsed| message_at(ArtifactKind::Explanation, elapsed, interval);
        assert_eq!(at(Duration::ZERO), EXPLANATION_MESSAGES[0]);
        assert_eq!(at(Duration::from_millis(1999)), EXPLANATION_MESSAGES[0]);
        assert_eq!(at(Duration::from_secs(2)), EXPLANATION_MESSAGES[1]);
    }

    #[test]
    fn test_message_wraps_around() {
        let interval = Duration::from_secs(1);
        let n = REPORT_MESSAGES.len() as u64;
        let elapsed = Duration::from_secs(n);
        assert_eq!(
            message_at(ArtifactKind::Report, elapsed, interval),
            REPORT_MESSAGES[0]
        );
    }

    #[test]
    fn test_zero_interval_pins_first_message() {
        let elapsed = Duration::from_secs(60);
        assert_eq!(
            message_at(ArtifactKind::Analysis, elapsed, Duration::ZERO),
            ANALYSIS_MESSAGES[0]
        );
    }

    #[test]
    fn test_sub_millisecond_interval_rotates() {
        let interval = Duration::from_micros(500);
        let at = |elapsed| message_at(ArtifactKind::Analysis, elapsed, interval);
        assert_eq!(at(Duration::ZERO), ANALYSIS_MESSAGES[0]);
        assert_eq!(at(Duration::from_micros(500)), ANALYSIS_MESSAGES[1]);
        // 5 ms is ten intervals in; ten steps wrap a five-message list.
        assert_eq!(at(Duration::from_millis(5)), ANALYSIS_MESSAGES[0]);

        let nanos = Duration::from_nanos(1);
        let expected = (3_600_000_000_000u128 % REPORT_MESSAGES.len() as u128) as usize;
        assert_eq!(
            message_at(ArtifactKind::Report, Duration::from_secs(3600), nanos),
            REPORT_MESSAGES[expected]
        );
    }

    #[test]
    fn test_every_kind_has_messages() {
        for kind in ArtifactKind::ALL {
            assert!(!messages(kind).is_empty());
        }
    }
}
