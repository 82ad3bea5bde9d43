use serde::{Deserialize, Serialize};
use std::ops::Add;
use time::{Duration, OffsetDateTime};

//--------------------------------------------------------------------------------------------------
// Unix Timestamp handling
//--------------------------------------------------------------------------------------------------

// Token timestamps are second-granularity on the wire, so construction truncates to whole seconds

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct UnixTimestamp(OffsetDateTime);

impl Serialize for UnixTimestamp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.unix_timestamp().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for UnixTimestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let timestamp = i64::deserialize(deserializer)?;
        let datetime =
            OffsetDateTime::from_unix_timestamp(timestamp).map_err(serde::de::Error::custom)?;
        Ok(UnixTimestamp(datetime))
    }
}

impl From<UnixTimestamp> for OffsetDateTime {
    fn from(ts: UnixTimestamp) -> Self {
        ts.0
    }
}

impl Add<Duration> for UnixTimestamp {
    type Output = UnixTimestamp;

    fn add(self, duration: Duration) -> UnixTimestamp {
        UnixTimestamp(self.0 + duration)
    }
}

impl UnixTimestamp {
    pub fn now() -> Self {
        let now = OffsetDateTime::now_utc();
        // Cannot fail: the timestamp came from a valid OffsetDateTime
        UnixTimestamp(
            OffsetDateTime::from_unix_timestamp(now.unix_timestamp()).expect("valid timestamp"),
        )
    }

    pub fn unix_timestamp(self) -> i64 {
        self.0.unix_timestamp()
    }

    // Negative once the timestamp is in the past
    pub fn duration_until(self) -> Duration {
        self.0 - OffsetDateTime::now_utc()
    }
}

//--------------------------------------------------------------------------------------------------
