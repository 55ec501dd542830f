// Season keys and the range of seasons that can be queried.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::clock::Clock;

/// First season offered when the config does not say otherwise.
pub const DEFAULT_EARLIEST_SEASON: i32 = 2000;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SeasonError {
    #[error("season {year} is before the earliest supported season {earliest}")]
    TooEarly { year: i32, earliest: i32 },

    #[error("season {year} is not complete yet (latest completed season is {latest})")]
    NotCompleted { year: i32, latest: i32 },
}

/// An integer year identifying one statistics query. Only obtainable through
/// [`SeasonRange::key`], so every key in circulation is in range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SeasonKey(i32);

impl SeasonKey {
    pub fn year(self) -> i32 {
        self.0
    }
}

impl fmt::Display for SeasonKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Valid seasons: `earliest` up to, but excluding, the current year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeasonRange {
    earliest: i32,
    current_year: i32,
}

impl SeasonRange {
    pub fn new(earliest: i32, current_year: i32) -> Self {
        Self {
            earliest,
            current_year,
        }
    }

    pub fn from_clock(earliest: i32, clock: &dyn Clock) -> Self {
        Self::new(earliest, clock.current_year())
    }

    pub fn earliest(&self) -> i32 {
        self.earliest
    }

    /// Most recent completed season, or `None` when the range is empty.
    pub fn latest(&self) -> Option<SeasonKey> {
        let latest = self.current_year - 1;
        (latest >= self.earliest).then_some(SeasonKey(latest))
    }

    pub fn key(&self, year: i32) -> Result<SeasonKey, SeasonError> {
        if year < self.earliest {
            return Err(SeasonError::TooEarly {
                year,
                earliest: self.earliest,
            });
        }
        if year >= self.current_year {
            return Err(SeasonError::NotCompleted {
                year,
                latest: self.current_year - 1,
            });
        }
        Ok(SeasonKey(year))
    }

    /// All valid keys, newest first.
    pub fn seasons(&self) -> Vec<SeasonKey> {
        (self.earliest..self.current_year).rev().map(SeasonKey).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::{TimeZone, Utc};

    #[test]
    fn current_year_is_excluded() {
        let range = SeasonRange::new(2000, 2025);
        assert_eq!(range.key(2024).unwrap().year(), 2024);
        assert_eq!(
            range.key(2025),
            Err(SeasonError::NotCompleted {
                year: 2025,
                latest: 2024
            })
        );
        assert!(range.key(2030).is_err());
    }

    #[test]
    fn years_before_earliest_are_rejected() {
        let range = SeasonRange::new(2000, 2025);
        assert_eq!(range.key(2000).unwrap().year(), 2000);
        assert_eq!(
            range.key(1999),
            Err(SeasonError::TooEarly {
                year: 1999,
                earliest: 2000
            })
        );
    }

    #[test]
    fn seasons_are_listed_newest_first() {
        let range = SeasonRange::new(2020, 2024);
        let years: Vec<i32> = range.seasons().into_iter().map(SeasonKey::year).collect();
        assert_eq!(years, vec![2023, 2022, 2021, 2020]);
        assert_eq!(range.latest().map(SeasonKey::year), Some(2023));
    }

    #[test]
    fn empty_range_has_no_latest() {
        let range = SeasonRange::new(2024, 2024);
        assert!(range.seasons().is_empty());
        assert!(range.latest().is_none());
    }

    #[test]
    fn range_follows_the_clock() {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2019, 5, 1, 0, 0, 0).unwrap());
        let range = SeasonRange::from_clock(2000, &clock);
        assert_eq!(range.latest().map(SeasonKey::year), Some(2018));
        assert_eq!(range.earliest(), 2000);
    }

    #[test]
    fn key_displays_as_bare_year() {
        let key = SeasonRange::new(2000, 2025).key(2023).unwrap();
        assert_eq!(key.to_string(), "2023");
    }
}
