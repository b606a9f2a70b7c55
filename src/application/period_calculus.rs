//! Calendar arithmetic over period keys relative to a fixed "today".
//!
//! A calculus is cheap to build; hosts create one per request from their
//! clock so that "today" never goes stale across midnight.

use crate::domain::period::{
    CurrentPeriodKeys, DateRange, PeriodError, PeriodKey, PeriodScope, Timeline,
};
use crate::infrastructure::clock::Clock;
use chrono::{Datelike, NaiveDate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodCalculus {
    today: NaiveDate,
}

impl PeriodCalculus {
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }

    pub fn from_clock(clock: &dyn Clock) -> Self {
        Self::new(clock.today())
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Today's period for `scope`.
    ///
    /// # Panics
    /// Panics when today lies outside years 0000..=9999, which no wall
    /// clock produces.
    pub fn current_key(&self, scope: PeriodScope) -> PeriodKey {
        PeriodKey::for_date(self.today, scope).expect("today lies within supported key years")
    }

    pub fn current_keys(&self) -> CurrentPeriodKeys {
        CurrentPeriodKeys {
            day: self.current_key(PeriodScope::Day),
            week: self.current_key(PeriodScope::Week),
            quarter: self.current_key(PeriodScope::Quarter),
            year: self.current_key(PeriodScope::Year),
        }
    }

    /// The key `offset` periods away from today's. Weeks, quarters and years
    /// step from the normalized start of the current period, never from
    /// today's raw date.
    pub fn key_from_offset(&self, offset: i64, scope: PeriodScope) -> Result<PeriodKey, PeriodError> {
        self.current_key(scope).offset_by(offset)
    }

    pub fn next_key(&self, key: &PeriodKey) -> Result<PeriodKey, PeriodError> {
        key.offset_by(1)
    }

    pub fn prev_key(&self, key: &PeriodKey) -> Result<PeriodKey, PeriodError> {
        key.offset_by(-1)
    }

    /// Display label: `Monday, Jan 27`, `Week of Jan 27`, `Quarter 1` or
    /// `2026 Goals`.
    pub fn format_label(&self, key: &PeriodKey) -> String {
        let start = key.start_date();
        match key.scope() {
            PeriodScope::Day => start.format("%A, %b %-d").to_string(),
            PeriodScope::Week => format!("Week of {}", start.format("%b %-d")),
            PeriodScope::Quarter => format!("Quarter {}", start.month0() / 3 + 1),
            PeriodScope::Year => format!("{:04} Goals", start.year()),
        }
    }

    pub fn is_current_period(&self, key: &PeriodKey) -> bool {
        *key == self.current_key(key.scope())
    }

    pub fn is_past_period(&self, key: &PeriodKey) -> bool {
        key.end_date() < self.today
    }

    pub fn is_future_period(&self, key: &PeriodKey) -> bool {
        key.start_date() > self.today
    }

    /// Past, current and future are mutually exclusive: the period holding
    /// today is neither past nor future.
    pub fn classify(&self, key: &PeriodKey) -> Timeline {
        if self.is_past_period(key) {
            Timeline::Past
        } else if self.is_future_period(key) {
            Timeline::Future
        } else {
            Timeline::Current
        }
    }

    pub fn date_range_of(&self, key: &PeriodKey) -> DateRange {
        key.date_range()
    }

    pub fn week_key_for_date(&self, date: NaiveDate) -> Result<PeriodKey, PeriodError> {
        PeriodKey::for_date(date, PeriodScope::Week)
    }

    pub fn monday_of_week(&self, week_key: &PeriodKey) -> Result<NaiveDate, PeriodError> {
        if week_key.scope() != PeriodScope::Week {
            return Err(PeriodError::ScopeMismatch {
                key: week_key.to_string(),
                expected: PeriodScope::Week,
            });
        }
        Ok(week_key.start_date())
    }

    /// Signed number of weeks between this week's Monday and the Monday of
    /// the week holding `today + day_offset`.
    pub fn week_offset_for_day_offset(&self, day_offset: i64) -> Result<i64, PeriodError> {
        let day = self.key_from_offset(day_offset, PeriodScope::Day)?;
        let target_monday = PeriodKey::for_date(day.start_date(), PeriodScope::Week)?.start_date();
        let current_monday = self.current_key(PeriodScope::Week).start_date();
        Ok((target_monday - current_monday).num_weeks())
    }

    /// Signed number of days between today and the Monday of the week
    /// `week_offset` weeks away; week navigation snaps days to Monday.
    pub fn day_offset_for_week_offset(&self, week_offset: i64) -> Result<i64, PeriodError> {
        let week = self.key_from_offset(week_offset, PeriodScope::Week)?;
        Ok((week.start_date() - self.today).num_days())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::FixedClock;
    use chrono::{DateTime, Duration, Utc};
    use proptest::prelude::*;

    fn date(value: &str) -> NaiveDate {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").expect("valid date")
    }

    fn key(value: &str) -> PeriodKey {
        value.parse().expect("valid period key")
    }

    // Saturday of ISO week 7, 2026.
    fn calculus() -> PeriodCalculus {
        PeriodCalculus::new(date("2026-02-14"))
    }

    #[test]
    fn current_keys_match_today() {
        let keys = calculus().current_keys();
        assert_eq!(keys.day.to_string(), "2026-02-14");
        assert_eq!(keys.week.to_string(), "2026-W07");
        assert_eq!(keys.quarter.to_string(), "2026-Q1");
        assert_eq!(keys.year.to_string(), "2026");
    }

    #[test]
    fn from_clock_uses_clock_day() {
        let now = DateTime::parse_from_rfc3339("2026-10-16T12:00:00Z")
            .expect("valid datetime")
            .with_timezone(&Utc);
        let calculus = PeriodCalculus::from_clock(&FixedClock::utc(now));
        assert_eq!(calculus.today(), date("2026-10-16"));
    }

    #[test]
    fn offsets_step_from_normalized_period_start() {
        let calculus = calculus();
        assert_eq!(calculus.key_from_offset(0, PeriodScope::Day).expect("day").to_string(), "2026-02-14");
        assert_eq!(calculus.key_from_offset(1, PeriodScope::Day).expect("day").to_string(), "2026-02-15");
        assert_eq!(calculus.key_from_offset(-365, PeriodScope::Day).expect("day").to_string(), "2025-02-14");
        assert_eq!(calculus.key_from_offset(1, PeriodScope::Week).expect("week").to_string(), "2026-W08");
        assert_eq!(calculus.key_from_offset(-7, PeriodScope::Week).expect("week").to_string(), "2025-W52");
        assert_eq!(calculus.key_from_offset(3, PeriodScope::Quarter).expect("quarter").to_string(), "2026-Q4");
        assert_eq!(calculus.key_from_offset(4, PeriodScope::Quarter).expect("quarter").to_string(), "2027-Q1");
        assert_eq!(calculus.key_from_offset(-1, PeriodScope::Year).expect("year").to_string(), "2025");
    }

    #[test]
    fn month_end_today_does_not_skip_quarters() {
        let calculus = PeriodCalculus::new(date("2026-03-31"));
        assert_eq!(calculus.key_from_offset(1, PeriodScope::Quarter).expect("next").to_string(), "2026-Q2");
        assert_eq!(calculus.key_from_offset(-1, PeriodScope::Quarter).expect("prev").to_string(), "2025-Q4");
    }

    #[test]
    fn next_and_prev_work_from_any_key() {
        let calculus = calculus();
        assert_eq!(calculus.next_key(&key("2026-Q4")).expect("next"), key("2027-Q1"));
        assert_eq!(calculus.prev_key(&key("2026-W01")).expect("prev"), key("2025-W52"));
        assert_eq!(calculus.next_key(&key("2026-W53")).expect("next"), key("2027-W01"));
        assert_eq!(calculus.next_key(&key("2026-12-31")).expect("next"), key("2027-01-01"));
    }

    #[test]
    fn labels_match_display_patterns() {
        let calculus = calculus();
        assert_eq!(calculus.format_label(&key("2025-01-27")), "Monday, Jan 27");
        assert_eq!(calculus.format_label(&key("2026-02-14")), "Saturday, Feb 14");
        assert_eq!(calculus.format_label(&key("2026-W07")), "Week of Feb 9");
        assert_eq!(calculus.format_label(&key("2026-W01")), "Week of Dec 29");
        assert_eq!(calculus.format_label(&key("2026-Q1")), "Quarter 1");
        assert_eq!(calculus.format_label(&key("2026-Q4")), "Quarter 4");
        assert_eq!(calculus.format_label(&key("2026")), "2026 Goals");
    }

    #[test]
    fn classification_is_three_way() {
        let calculus = calculus();
        assert_eq!(calculus.classify(&key("2026-02-13")), Timeline::Past);
        assert_eq!(calculus.classify(&key("2026-02-14")), Timeline::Current);
        assert_eq!(calculus.classify(&key("2026-02-15")), Timeline::Future);

        let this_week = key("2026-W07");
        assert!(calculus.is_current_period(&this_week));
        assert!(!calculus.is_past_period(&this_week));
        assert!(!calculus.is_future_period(&this_week));

        assert!(calculus.is_past_period(&key("2025-Q4")));
        assert!(calculus.is_future_period(&key("2027")));
        assert!(!calculus.is_current_period(&key("2025")));
    }

    #[test]
    fn week_key_for_date_follows_iso_rules() {
        let calculus = calculus();
        assert_eq!(calculus.week_key_for_date(date("2026-02-09")).expect("week").to_string(), "2026-W07");
        assert_eq!(calculus.week_key_for_date(date("2026-02-13")).expect("week").to_string(), "2026-W07");
        assert_eq!(calculus.week_key_for_date(date("2026-02-15")).expect("week").to_string(), "2026-W07");
        assert_eq!(calculus.week_key_for_date(date("2026-01-04")).expect("week").to_string(), "2026-W01");
        // Jan 1, 2026 is a Thursday, so its week is week 1 of 2026.
        assert_eq!(calculus.week_key_for_date(date("2026-01-01")).expect("week").to_string(), "2026-W01");
        assert_eq!(calculus.week_key_for_date(date("2026-12-31")).expect("week").to_string(), "2026-W53");
        assert_eq!(calculus.week_key_for_date(date("2024-02-29")).expect("week").to_string(), "2024-W09");
        assert_eq!(calculus.week_key_for_date(date("2023-01-01")).expect("week").to_string(), "2022-W52");
    }

    #[test]
    fn monday_of_week_requires_week_keys() {
        let calculus = calculus();
        assert_eq!(calculus.monday_of_week(&key("2026-W07")).expect("monday"), date("2026-02-09"));
        assert_eq!(calculus.monday_of_week(&key("2026-W01")).expect("monday"), date("2025-12-29"));
        assert_eq!(calculus.monday_of_week(&key("2020-W53")).expect("monday"), date("2020-12-28"));
        assert!(matches!(
            calculus.monday_of_week(&key("2026-Q1")),
            Err(PeriodError::ScopeMismatch { .. })
        ));
    }

    #[test]
    fn sync_rules_convert_between_day_and_week_offsets() {
        let calculus = calculus();
        // Saturday -> Monday of the same week.
        assert_eq!(calculus.day_offset_for_week_offset(0).expect("days"), -5);
        assert_eq!(calculus.day_offset_for_week_offset(1).expect("days"), 2);
        assert_eq!(calculus.day_offset_for_week_offset(-1).expect("days"), -12);

        assert_eq!(calculus.week_offset_for_day_offset(0).expect("weeks"), 0);
        assert_eq!(calculus.week_offset_for_day_offset(1).expect("weeks"), 0);
        assert_eq!(calculus.week_offset_for_day_offset(2).expect("weeks"), 1);
        assert_eq!(calculus.week_offset_for_day_offset(-5).expect("weeks"), 0);
        assert_eq!(calculus.week_offset_for_day_offset(-6).expect("weeks"), -1);
    }

    fn any_today() -> impl Strategy<Value = NaiveDate> {
        (1990i32..2100, 1u32..=365)
            .prop_map(|(year, ordinal)| NaiveDate::from_yo_opt(year, ordinal).expect("ordinal date"))
    }

    fn any_scope() -> impl Strategy<Value = PeriodScope> {
        prop_oneof![
            Just(PeriodScope::Day),
            Just(PeriodScope::Week),
            Just(PeriodScope::Quarter),
            Just(PeriodScope::Year),
        ]
    }

    proptest! {
        #[test]
        fn offsets_are_monotonic_and_adjacent(today in any_today(), scope in any_scope(), offset in -600i64..600) {
            let calculus = PeriodCalculus::new(today);
            let current = calculus.key_from_offset(offset, scope).expect("key");
            let next = calculus.key_from_offset(offset + 1, scope).expect("key");
            prop_assert!(next.start_date() > current.end_date());
            prop_assert_eq!(next.start_date(), current.end_date() + Duration::days(1));
            prop_assert_eq!(calculus.next_key(&current).expect("next"), next);
        }

        #[test]
        fn week_monday_roundtrip_is_idempotent(today in any_today(), day in any_today()) {
            let calculus = PeriodCalculus::new(today);
            let week = calculus.week_key_for_date(day).expect("week");
            let monday = calculus.monday_of_week(&week).expect("monday");
            prop_assert_eq!(monday.weekday(), chrono::Weekday::Mon);
            prop_assert!(monday <= day && day < monday + Duration::days(7));
            prop_assert_eq!(calculus.week_key_for_date(monday).expect("week"), week);
        }

        #[test]
        fn day_to_week_sync_is_idempotent(today in any_today(), day_offset in -800i64..800) {
            let calculus = PeriodCalculus::new(today);
            let week_offset = calculus.week_offset_for_day_offset(day_offset).expect("weeks");
            prop_assert_eq!(calculus.week_offset_for_day_offset(day_offset).expect("weeks"), week_offset);

            // Snapping to the week's Monday stays inside the same week.
            let snapped = calculus.day_offset_for_week_offset(week_offset).expect("days");
            prop_assert!(snapped <= day_offset && day_offset - snapped < 7);
            prop_assert_eq!(calculus.week_offset_for_day_offset(snapped).expect("weeks"), week_offset);
        }
    }
}
