use time::{Duration, OffsetDateTime, format_description::well_known::Rfc3339};

/// Court cards and readiness.
pub mod court;
/// History rows and totals.
pub mod history;
/// Phase and status labels.
pub mod phase;
/// Roster rows.
pub mod player;
/// Roster command inputs.
pub mod roster;
pub mod validation;

pub(crate) fn format_timestamp(time: OffsetDateTime) -> String {
    time.format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}

fn whole_seconds(span: Duration) -> i64 {
    span.whole_seconds().max(0)
}

/// Length of a finished game: `MM:SS` under an hour, `H:MM:SS` otherwise.
pub fn format_duration(start: OffsetDateTime, end: OffsetDateTime) -> String {
    let seconds = whole_seconds(end - start);
    if seconds < 3600 {
        format!("{:02}:{:02}", seconds / 60, seconds % 60)
    } else {
        format!(
            "{}:{:02}:{:02}",
            seconds / 3600,
            (seconds % 3600) / 60,
            seconds % 60
        )
    }
}

/// Running time of a game as `MM:SS`; minutes keep counting past 59.
pub fn format_elapsed(start: OffsetDateTime, now: OffsetDateTime) -> String {
    let seconds = whole_seconds(now - start);
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
