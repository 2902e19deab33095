use std::fmt::Display;

use chrono::{DateTime, FixedOffset, Local, Offset, TimeZone, Utc};

/// A point in time plus the UTC offset it was recorded in, as stored in commits.
///
/// Unlike `chrono::DateTime`, two timestamps for the same instant with different offsets are not
/// equal: the offset is part of the encoded commit, and so part of its id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Timestamp {
    /// Seconds since the unix epoch.
    pub unix: i64,
    /// Seconds east of UTC.
    pub offset: i32,
}

impl Timestamp {
    /// The timestamp of an unset commit time: 0001-01-01T00:00:00Z.
    pub const ZERO: Self = Timestamp {
        unix: -62_135_596_800,
        offset: 0,
    };

    pub fn new(unix: i64, offset: i32) -> Self {
        Self { unix, offset }
    }

    pub fn now() -> Self {
        let now = Local::now();
        Self {
            unix: now.timestamp(),
            offset: now.offset().local_minus_utc(),
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// The same instant as a chrono date. Offsets chrono cannot represent fall back to UTC.
    pub fn to_datetime(&self) -> Option<DateTime<FixedOffset>> {
        let offset = FixedOffset::east_opt(self.offset).unwrap_or_else(|| Utc.fix());
        offset.timestamp_opt(self.unix, 0).single()
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::ZERO
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Timestamp {
    fn from(dt: DateTime<Tz>) -> Self {
        Self {
            unix: dt.timestamp(),
            offset: dt.offset().fix().local_minus_utc(),
        }
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S %:z")),
            None => write!(f, "{} {:+}", self.unix, self.offset),
        }
    }
}
