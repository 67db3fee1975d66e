//! Epoch based timestamps.
//!
//! | Encoding | Width | Unit | Epoch |
//! |----------|-------|------|-------|
//! | Java | 8 bytes | millisecond | 1970-01-01 00:00:00 UTC |
//! | Unix | 4 bytes | second | 1970-01-01 00:00:00 UTC |
//! | VMS | 8 bytes | 100 nanoseconds | 1858-11-17 00:00:00 UTC |
//!
//! Encoding truncates toward the earlier instant when the time has more precision than the unit.

use chrono::{DateTime, Utc};
use thiserror::Error;

const NANOS_PER_SECOND: i128 = 1_000_000_000;
const NANOS_PER_TICK: i128 = 100;
/// Seconds from the VMS epoch to the Unix epoch.
const VMS_EPOCH_OFFSET_SECONDS: i128 = 3_506_716_800;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TimeError {
    #[error("{encoding} timestamp {value} is outside the supported calendar range")]
    OutOfRange { encoding: &'static str, value: i64 },
    #[error("{time} cannot be represented as a {encoding} timestamp")]
    Unrepresentable {
        encoding: &'static str,
        time: DateTime<Utc>,
    },
}

pub fn decode_java(millis: i64) -> Result<DateTime<Utc>, TimeError> {
    DateTime::from_timestamp_millis(millis).ok_or(TimeError::OutOfRange {
        encoding: "Java",
        value: millis,
    })
}

pub fn encode_java(time: &DateTime<Utc>) -> i64 {
    time.timestamp_millis()
}

pub fn decode_unix(seconds: i32) -> Result<DateTime<Utc>, TimeError> {
    DateTime::from_timestamp(seconds as i64, 0).ok_or(TimeError::OutOfRange {
        encoding: "Unix",
        value: seconds as i64,
    })
}

pub fn encode_unix(time: &DateTime<Utc>) -> Result<i32, TimeError> {
    i32::try_from(time.timestamp()).map_err(|_| TimeError::Unrepresentable {
        encoding: "Unix",
        time: *time,
    })
}

pub fn decode_vms(ticks: i64) -> Result<DateTime<Utc>, TimeError> {
    let out_of_range = TimeError::OutOfRange {
        encoding: "VMS",
        value: ticks,
    };
    let nanos = ticks as i128 * NANOS_PER_TICK - VMS_EPOCH_OFFSET_SECONDS * NANOS_PER_SECOND;
    let seconds = i64::try_from(nanos.div_euclid(NANOS_PER_SECOND)).map_err(|_| out_of_range)?;
    let subsec = nanos.rem_euclid(NANOS_PER_SECOND) as u32;

    DateTime::from_timestamp(seconds, subsec).ok_or(out_of_range)
}

pub fn encode_vms(time: &DateTime<Utc>) -> Result<i64, TimeError> {
    let nanos = (time.timestamp() as i128 + VMS_EPOCH_OFFSET_SECONDS) * NANOS_PER_SECOND
        + time.timestamp_subsec_nanos() as i128;

    i64::try_from(nanos.div_euclid(NANOS_PER_TICK)).map_err(|_| TimeError::Unrepresentable {
        encoding: "VMS",
        time: *time,
    })
}
