use chrono::{DateTime, FixedOffset, Utc};

use crate::constants::{DATE_KEY_FORMAT, LOCAL_UTC_OFFSET_SECS};

/// Source of "now" for anything that stamps data with a date.
pub trait Clock: Send + Sync + core::fmt::Debug {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// Wall clock shifted into bot-local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&local_offset())
    }
}

const LOCAL_OFFSET: FixedOffset = match FixedOffset::east_opt(LOCAL_UTC_OFFSET_SECS) {
    Some(offset) => offset,
    None => panic!("local utc offset out of range"),
};

pub fn local_offset() -> FixedOffset {
    LOCAL_OFFSET
}

/// Calendar date of `ts` in bot-local time, e.g. `2024-05-01`.
pub fn date_key(ts: DateTime<FixedOffset>) -> String {
    ts.with_timezone(&local_offset())
        .format(DATE_KEY_FORMAT)
        .to_string()
}
