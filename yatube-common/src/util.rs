use time::{Duration, UtcDateTime};

/// How many characters of an entity's text make up its display label.
pub const LABEL_LEN: usize = 20;

/// Returns the first `max_chars` characters of `text`.
#[must_use]
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// The current time, cut down to the microsecond precision Postgres stores.
#[must_use]
pub fn now_micros() -> UtcDateTime {
    let now = UtcDateTime::now();
    now - Duration::nanoseconds(i64::from(now.nanosecond() % 1_000))
}
