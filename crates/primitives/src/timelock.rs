//! Proposal kinds, timelock actions and the timelock delay.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr, time::Duration};

/// Kind tag of a persisted proposal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
pub enum ProposalKind {
    Proposal,
    TimelockProposal,
}

/// Action a timelock proposal performs on its batches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
#[serde(rename_all = "lowercase")]
pub enum TimelockAction {
    #[display("schedule")]
    Schedule,
    #[display("cancel")]
    Cancel,
    #[display("bypass")]
    Bypass,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DelayParseError {
    #[error("invalid duration {0:?}")]
    Invalid(String),
    #[error("missing unit in duration {0:?}")]
    MissingUnit(String),
    #[error("unknown unit {unit:?} in duration {input:?}")]
    UnknownUnit { unit: String, input: String },
    #[error("negative duration {0:?}")]
    Negative(String),
    #[error("duration {0:?} overflows")]
    Overflow(String),
}

/// Timelock delay.
///
/// Written and read in the `72h3m0.5s` notation. Negative values are rejected.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::Deref,
)]
pub struct Delay(Duration);

impl Delay {
    pub const ZERO: Self = Self(Duration::ZERO);

    pub const fn new(duration: Duration) -> Self {
        Self(duration)
    }

    pub const fn from_secs(secs: u64) -> Self {
        Self(Duration::from_secs(secs))
    }

    pub const fn duration(&self) -> Duration {
        self.0
    }
}

impl From<Duration> for Delay {
    fn from(duration: Duration) -> Self {
        Self(duration)
    }
}

const NANOS_PER_SEC: u128 = 1_000_000_000;

fn unit_nanos(unit: &str) -> Option<u128> {
    Some(match unit {
        "ns" => 1,
        "us" | "µs" | "μs" => 1_000,
        "ms" => 1_000_000,
        "s" => NANOS_PER_SEC,
        "m" => 60 * NANOS_PER_SEC,
        "h" => 3_600 * NANOS_PER_SEC,
        _ => return None,
    })
}

impl FromStr for Delay {
    type Err = DelayParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let invalid = || DelayParseError::Invalid(input.to_string());
        let overflow = || DelayParseError::Overflow(input.to_string());

        if input.starts_with('-') {
            return Err(DelayParseError::Negative(input.to_string()));
        }
        let mut rest = input.strip_prefix('+').unwrap_or(input);
        if rest == "0" {
            return Ok(Self::ZERO);
        }
        if rest.is_empty() {
            return Err(invalid());
        }

        let mut total: u128 = 0;
        while !rest.is_empty() {
            let number_end = rest
                .find(|c: char| !(c.is_ascii_digit() || c == '.'))
                .ok_or_else(|| DelayParseError::MissingUnit(input.to_string()))?;
            let (number, tail) = rest.split_at(number_end);
            let unit_end =
                tail.find(|c: char| c.is_ascii_digit() || c == '.').unwrap_or(tail.len());
            let (unit, tail) = tail.split_at(unit_end);

            let scale = unit_nanos(unit).ok_or_else(|| DelayParseError::UnknownUnit {
                unit: unit.to_string(),
                input: input.to_string(),
            })?;

            let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
            if (whole.is_empty() && fraction.is_empty())
                || !whole.bytes().all(|b| b.is_ascii_digit())
                || !fraction.bytes().all(|b| b.is_ascii_digit())
            {
                return Err(invalid());
            }

            let whole: u128 =
                if whole.is_empty() { 0 } else { whole.parse().map_err(|_| overflow())? };
            let mut value = whole.checked_mul(scale).ok_or_else(overflow)?;

            let mut digit_scale = scale;
            for digit in fraction.bytes() {
                digit_scale /= 10;
                if digit_scale == 0 {
                    break;
                }
                value += u128::from(digit - b'0') * digit_scale;
            }

            total = total.checked_add(value).ok_or_else(overflow)?;
            rest = tail;
        }

        let secs = u64::try_from(total / NANOS_PER_SEC).map_err(|_| overflow())?;
        Ok(Self(Duration::new(secs, (total % NANOS_PER_SEC) as u32)))
    }
}

/// Writes `whole.fraction` with `digits` fractional digits, trailing zeros trimmed.
fn write_decimal(f: &mut fmt::Formatter<'_>, whole: u128, fraction: u128, digits: usize) -> fmt::Result {
    write!(f, "{whole}")?;
    if fraction != 0 {
        let padded = format!("{fraction:0digits$}");
        write!(f, ".{}", padded.trim_end_matches('0'))?;
    }
    Ok(())
}

impl fmt::Display for Delay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nanos = self.0.as_nanos();
        if nanos == 0 {
            return f.write_str("0s");
        }

        if nanos < NANOS_PER_SEC {
            return match nanos {
                n if n < 1_000 => write!(f, "{n}ns"),
                n if n < 1_000_000 => {
                    write_decimal(f, n / 1_000, n % 1_000, 3)?;
                    f.write_str("µs")
                }
                n => {
                    write_decimal(f, n / 1_000_000, n % 1_000_000, 6)?;
                    f.write_str("ms")
                }
            };
        }

        let secs = nanos / NANOS_PER_SEC;
        let (hours, minutes, seconds) = (secs / 3_600, secs % 3_600 / 60, secs % 60);
        if hours > 0 {
            write!(f, "{hours}h")?;
        }
        if hours > 0 || minutes > 0 {
            write!(f, "{minutes}m")?;
        }
        write_decimal(f, seconds, nanos % NANOS_PER_SEC, 9)?;
        f.write_str("s")
    }
}

impl Serialize for Delay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Delay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
