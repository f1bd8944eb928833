//! Defines the GFS run label and the logic that maps a requested datetime
//! to the run that covers it.

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the four daily GFS publication runs.
///
/// NOMADS publishes a fresh forecast four times a day, at 00:00, 06:00,
/// 12:00 and 18:00 UTC. Each run only carries predictions from its own
/// start hour onward, so a request for 14:30 has to go to the `12z` run
/// (or earlier), never to `18z`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RunLabel {
    /// The 00:00 UTC run.
    Z00,
    /// The 06:00 UTC run.
    Z06,
    /// The 12:00 UTC run.
    Z12,
    /// The 18:00 UTC run.
    Z18,
}

impl RunLabel {
    /// The suffix NOMADS uses for this run in dataset paths, e.g. `18z`.
    pub fn suffix(&self) -> &'static str {
        match self {
            RunLabel::Z00 => "00z",
            RunLabel::Z06 => "06z",
            RunLabel::Z12 => "12z",
            RunLabel::Z18 => "18z",
        }
    }

    /// Resolves the run that covers `target`, starting from the latest run
    /// (`Z18`) and stepping down while the requested time-of-day falls before
    /// the run boundary.
    ///
    /// Only the time-of-day of `target` is compared; its date is ignored.
    /// A request for a date far in the future still resolves purely from its
    /// clock time. This mirrors the upstream publication convention where the
    /// latest forecast always lives under today's date, but it is a known
    /// limitation: the resolved run is only meaningful for targets within the
    /// forecast horizon of today's runs.
    pub fn for_target(target: NaiveDateTime, now: NaiveDateTime) -> RunLabel {
        let time06 = now.date().and_hms_opt(6, 0, 0).unwrap_or(now).time();
        let time12 = now.date().and_hms_opt(12, 0, 0).unwrap_or(now).time();
        let time18 = now.date().and_hms_opt(18, 0, 0).unwrap_or(now).time();

        let mut run = RunLabel::Z18;
        if target.time() < time18 {
            run = RunLabel::Z12;
            if target.time() < time12 {
                run = RunLabel::Z06;
                if target.time() < time06 {
                    run = RunLabel::Z00;
                }
            }
        }
        run
    }

    /// The hour-of-day at which this run starts.
    pub fn start_hour(&self) -> u32 {
        match self {
            RunLabel::Z00 => 0,
            RunLabel::Z06 => 6,
            RunLabel::Z12 => 12,
            RunLabel::Z18 => 18,
        }
    }

    /// Whether `target`'s time-of-day lies at or after this run's start hour.
    pub fn covers(&self, target: NaiveDateTime) -> bool {
        target.hour() >= self.start_hour()
    }
}

impl fmt::Display for RunLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.suffix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 10, 15)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    #[test]
    fn resolves_run_from_time_of_day() {
        let now = at(20, 0);

        assert_eq!(RunLabel::for_target(at(0, 0), now), RunLabel::Z00);
        assert_eq!(RunLabel::for_target(at(5, 59), now), RunLabel::Z00);
        assert_eq!(RunLabel::for_target(at(6, 0), now), RunLabel::Z06);
        assert_eq!(RunLabel::for_target(at(11, 59), now), RunLabel::Z06);
        assert_eq!(RunLabel::for_target(at(12, 0), now), RunLabel::Z12);
        assert_eq!(RunLabel::for_target(at(17, 59), now), RunLabel::Z12);
        assert_eq!(RunLabel::for_target(at(18, 0), now), RunLabel::Z18);
        assert_eq!(RunLabel::for_target(at(23, 59), now), RunLabel::Z18);
    }

    #[test]
    fn ignores_target_date() {
        let now = at(20, 0);
        let far_future = NaiveDate::from_ymd_opt(2031, 1, 1)
            .unwrap()
            .and_hms_opt(13, 0, 0)
            .unwrap();

        // Date plays no role, only the clock time does.
        assert_eq!(RunLabel::for_target(far_future, now), RunLabel::Z12);
    }

    #[test]
    fn ignores_now_time_of_day() {
        // The wall clock only contributes its date to the boundaries, so
        // resolution is stable across the day.
        for hour in 0..24 {
            let now = at(hour, 30);
            assert_eq!(RunLabel::for_target(at(7, 0), now), RunLabel::Z06);
        }
    }

    #[test]
    fn run_coverage_matches_start_hour() {
        assert!(RunLabel::Z18.covers(at(18, 0)));
        assert!(!RunLabel::Z18.covers(at(17, 59)));
        assert!(RunLabel::Z00.covers(at(0, 0)));
    }

    #[test]
    fn suffix_round_trip() {
        assert_eq!(RunLabel::Z00.suffix(), "00z");
        assert_eq!(RunLabel::Z18.to_string(), "18z");
        assert!(RunLabel::Z00 < RunLabel::Z06);
    }
}
