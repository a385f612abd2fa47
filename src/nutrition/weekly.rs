//! Weekly grouper
//!
//! Buckets timestamped entries into the 7 calendar days ending at a reference
//! day. Days nobody logged anything for stay `InsufficientData`, which is not
//! the same thing as a day whose entries summed to zero.

use std::fmt;

use chrono::{DateTime, Duration, FixedOffset, Local, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Nutrition;
use super::normalize::{NutrientEntry, RecordedAt};

/// Days in the trailing window, reference day included
pub const WINDOW_DAYS: i64 = 7;

/// Display format for day keys, e.g. `Mon Mar 10 2025`
pub const DAY_LABEL_FORMAT: &str = "%a %b %d %Y";

/// Status of one calendar day in the window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DailyBucket {
    /// No entry mapped to this day
    InsufficientData,
    /// Running totals of the six numeric nutrients
    Totals(Nutrition),
}

impl DailyBucket {
    /// Fold one entry in. `InsufficientData` becomes `Totals` on the first
    /// entry and never goes back.
    pub fn accumulate(&mut self, nutrition: &Nutrition) {
        match self {
            DailyBucket::InsufficientData => *self = DailyBucket::Totals(*nutrition),
            DailyBucket::Totals(total) => *total += nutrition,
        }
    }

    pub fn totals(&self) -> Option<&Nutrition> {
        match self {
            DailyBucket::Totals(total) => Some(total),
            DailyBucket::InsufficientData => None,
        }
    }

    pub fn has_data(&self) -> bool {
        matches!(self, DailyBucket::Totals(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayIntake {
    pub date: NaiveDate,
    pub label: String,
    #[serde(flatten)]
    pub bucket: DailyBucket,
}

/// A 7-day trailing window, newest day first
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyIntake {
    pub reference_date: NaiveDate,
    pub days: Vec<DayIntake>,
}

impl WeeklyIntake {
    /// All 7 days seeded as `InsufficientData`
    pub fn empty(reference_date: NaiveDate) -> Self {
        let days = (0..WINDOW_DAYS)
            .map(|offset| {
                let date = reference_date - Duration::days(offset);
                DayIntake {
                    date,
                    label: day_label(date),
                    bucket: DailyBucket::InsufficientData,
                }
            })
            .collect();
        Self { reference_date, days }
    }

    pub fn get(&self, date: NaiveDate) -> Option<&DailyBucket> {
        self.slot(date).map(|i| &self.days[i].bucket)
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// First day of the window (6 days before the reference day)
    pub fn start_date(&self) -> NaiveDate {
        self.reference_date - Duration::days(WINDOW_DAYS - 1)
    }

    pub fn tracked_days(&self) -> usize {
        self.days.iter().filter(|d| d.bucket.has_data()).count()
    }

    /// Mean over tracked days only; `None` when nothing was tracked
    pub fn average_daily(&self) -> Option<Nutrition> {
        let tracked = self.tracked_days();
        if tracked == 0 {
            return None;
        }
        let total: Nutrition = self.days.iter().filter_map(|d| d.bucket.totals()).sum();
        Some(total.divide(tracked as f64))
    }

    fn slot(&self, date: NaiveDate) -> Option<usize> {
        let offset = (self.reference_date - date).num_days();
        (0..WINDOW_DAYS).contains(&offset).then_some(offset as usize)
    }

    fn fold(&mut self, date: NaiveDate, nutrition: &Nutrition) {
        if let Some(i) = self.slot(date) {
            self.days[i].bucket.accumulate(nutrition);
        }
    }
}

pub fn day_label(date: NaiveDate) -> String {
    date.format(DAY_LABEL_FORMAT).to_string()
}

/// Group entries into the window ending at `now`'s calendar day.
///
/// Instants are read in `now`'s timezone; bare dates are used as they are.
/// Entries with no timestamp or outside the window are ignored.
pub fn group_by_week<Tz: TimeZone>(entries: &[NutrientEntry], now: &DateTime<Tz>) -> WeeklyIntake {
    let tz = now.timezone();
    group_window(entries, now.date_naive(), |instant| {
        instant.with_timezone(&tz).date_naive()
    })
}

/// Group entries into the window ending at `reference_date`, reading
/// instants in `timezone`
pub fn group_by_week_ending(
    entries: &[NutrientEntry],
    reference_date: NaiveDate,
    timezone: &ReportTimezone,
) -> WeeklyIntake {
    group_window(entries, reference_date, |instant| timezone.calendar_date(instant))
}

fn group_window<F>(entries: &[NutrientEntry], reference_date: NaiveDate, day_of: F) -> WeeklyIntake
where
    F: Fn(&DateTime<Utc>) -> NaiveDate,
{
    let mut week = WeeklyIntake::empty(reference_date);
    for entry in entries {
        let date = match entry.recorded_at {
            Some(RecordedAt::Date(date)) => date,
            Some(RecordedAt::Instant(instant)) => day_of(&instant),
            None => continue,
        };
        week.fold(date, &entry.nutrition);
    }
    week
}

/// Timezone used to turn instants into calendar days
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportTimezone {
    /// Host wall clock
    #[default]
    Local,
    Utc,
    Fixed(FixedOffset),
}

impl ReportTimezone {
    /// Parse `local`, `utc`, or an offset like `+05:30` / `-0800`
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        match text.to_ascii_lowercase().as_str() {
            "" | "local" => return Some(ReportTimezone::Local),
            "utc" | "z" => return Some(ReportTimezone::Utc),
            _ => {}
        }
        let (sign, rest) = match text.as_bytes().first()? {
            b'+' => (1, &text[1..]),
            b'-' => (-1, &text[1..]),
            _ => return None,
        };
        let digits: String = rest.chars().filter(|c| *c != ':').collect();
        if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let hours: i32 = digits[..2].parse().ok()?;
        let minutes: i32 = digits[2..].parse().ok()?;
        if minutes >= 60 {
            return None;
        }
        FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).map(ReportTimezone::Fixed)
    }

    pub fn calendar_date(&self, instant: &DateTime<Utc>) -> NaiveDate {
        match self {
            ReportTimezone::Local => instant.with_timezone(&Local).date_naive(),
            ReportTimezone::Utc => instant.date_naive(),
            ReportTimezone::Fixed(offset) => instant.with_timezone(offset).date_naive(),
        }
    }

    /// Today's calendar date in this timezone
    pub fn today(&self) -> NaiveDate {
        self.calendar_date(&Utc::now())
    }

    pub fn group_by_week(&self, entries: &[NutrientEntry], now: DateTime<Utc>) -> WeeklyIntake {
        group_by_week_ending(entries, self.calendar_date(&now), self)
    }
}

impl fmt::Display for ReportTimezone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportTimezone::Local => f.write_str("local"),
            ReportTimezone::Utc => f.write_str("utc"),
            ReportTimezone::Fixed(offset) => write!(f, "{}", offset),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nutrition::normalize::normalize;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn noon_utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        date(y, m, d).and_hms_opt(12, 0, 0).unwrap().and_utc()
    }

    #[test]
    fn test_empty_input_yields_seven_insufficient_days() {
        let week = group_by_week(&[], &noon_utc(2025, 3, 15));
        assert_eq!(week.len(), WINDOW_DAYS as usize);
        assert!(week.days.iter().all(|d| d.bucket == DailyBucket::InsufficientData));
        assert_eq!(week.days[0].date, date(2025, 3, 15));
        assert_eq!(week.days[6].date, date(2025, 3, 9));
        assert_eq!(week.start_date(), date(2025, 3, 9));
        assert_eq!(week.average_daily(), None);
    }

    #[test]
    fn test_single_entry_example() {
        let entries = [normalize(&json!({"food": "Pasta", "calories": 300, "timestamp": "2025-03-10"}))];
        let week = group_by_week(&entries, &noon_utc(2025, 3, 15));

        assert_eq!(week.len(), 7);
        match week.get(date(2025, 3, 10)) {
            Some(DailyBucket::Totals(n)) => {
                assert_eq!(n.calories, 300.0);
                assert_eq!(n.protein, 0.0);
            }
            other => panic!("expected totals, got {:?}", other),
        }
        assert_eq!(week.tracked_days(), 1);
        assert_eq!(
            week.days.iter().filter(|d| d.bucket == DailyBucket::InsufficientData).count(),
            6
        );
    }

    #[test]
    fn test_zero_totals_are_not_insufficient_data() {
        let entries = [normalize(&json!({"calories": "??", "timestamp": "2025-03-14"}))];
        let week = group_by_week(&entries, &noon_utc(2025, 3, 15));
        assert_eq!(week.get(date(2025, 3, 14)), Some(&DailyBucket::Totals(Nutrition::zero())));
        assert_eq!(week.get(date(2025, 3, 13)), Some(&DailyBucket::InsufficientData));
    }

    #[test]
    fn test_entries_outside_window_are_ignored() {
        let entries = [
            normalize(&json!({"calories": 100, "timestamp": "2025-03-08"})),
            normalize(&json!({"calories": 100, "timestamp": "2025-03-16"})),
            normalize(&json!({"calories": 100})),
            normalize(&json!({"calories": 50, "timestamp": "2025-03-09"})),
        ];
        let week = group_by_week(&entries, &noon_utc(2025, 3, 15));
        assert_eq!(week.tracked_days(), 1);
        assert_eq!(week.get(date(2025, 3, 9)).and_then(|b| b.totals()).map(|n| n.calories), Some(50.0));
        assert_eq!(week.get(date(2025, 3, 8)), None);
    }

    #[test]
    fn test_same_day_entries_accumulate() {
        let entries = [
            normalize(&json!({"calories": 300, "protein": 10, "sugar": "4", "timestamp": "2025-03-15T07:00:00Z"})),
            normalize(&json!({"calories": "450", "protein": 20, "timestamp": "2025-03-15T19:30:00Z"})),
        ];
        let week = group_by_week(&entries, &noon_utc(2025, 3, 15));
        let totals = week.get(date(2025, 3, 15)).and_then(|b| b.totals()).copied().unwrap();
        assert_eq!(totals.calories, 750.0);
        assert_eq!(totals.protein, 30.0);
        assert_eq!(totals.sugar, 4.0);
    }

    #[test]
    fn test_instants_use_reporting_timezone() {
        // 02:00 UTC on the 15th is still the 14th in New York (-05:00)
        let entries = [normalize(&json!({"calories": 200, "timestamp": "2025-03-15T02:00:00Z"}))];
        let new_york = ReportTimezone::parse("-05:00").unwrap();

        let week = group_by_week_ending(&entries, date(2025, 3, 15), &new_york);
        assert!(week.get(date(2025, 3, 14)).unwrap().has_data());
        assert!(!week.get(date(2025, 3, 15)).unwrap().has_data());

        let utc_week = group_by_week_ending(&entries, date(2025, 3, 15), &ReportTimezone::Utc);
        assert!(utc_week.get(date(2025, 3, 15)).unwrap().has_data());
    }

    #[test]
    fn test_calendar_dates_ignore_timezone() {
        let entries = [normalize(&json!({"calories": 80, "timestamp": "2025-03-12"}))];
        let tz = ReportTimezone::parse("+14:00").unwrap();
        let week = group_by_week_ending(&entries, date(2025, 3, 15), &tz);
        assert!(week.get(date(2025, 3, 12)).unwrap().has_data());
    }

    #[test]
    fn test_generic_now_timezone() {
        let offset = FixedOffset::east_opt(9 * 3600).unwrap();
        // 2025-03-15 23:30 UTC is 2025-03-16 08:30 in Tokyo
        let now = noon_utc(2025, 3, 15)
            .checked_add_signed(Duration::minutes(690))
            .unwrap()
            .with_timezone(&offset);
        let week = group_by_week(&[], &now);
        assert_eq!(week.reference_date, date(2025, 3, 16));
    }

    #[test]
    fn test_average_over_tracked_days() {
        let entries = [
            normalize(&json!({"calories": 2000, "timestamp": "2025-03-15"})),
            normalize(&json!({"calories": 1000, "timestamp": "2025-03-13"})),
        ];
        let week = group_by_week(&entries, &noon_utc(2025, 3, 15));
        assert_eq!(week.average_daily().map(|n| n.calories), Some(1500.0));
    }

    #[test]
    fn test_day_labels_and_serialized_shape() {
        let entries = [normalize(&json!({"calories": 300, "timestamp": "2025-03-10"}))];
        let week = group_by_week(&entries, &noon_utc(2025, 3, 15));
        let value = serde_json::to_value(&week).unwrap();

        assert_eq!(value["days"][0]["label"], json!("Sat Mar 15 2025"));
        assert_eq!(value["days"][0]["status"], json!("insufficient_data"));
        assert_eq!(value["days"][5]["label"], json!("Mon Mar 10 2025"));
        assert_eq!(value["days"][5]["date"], json!("2025-03-10"));
        assert_eq!(value["days"][5]["status"], json!("totals"));
        assert_eq!(value["days"][5]["calories"], json!(300.0));
    }

    #[test]
    fn test_report_timezone_parse() {
        assert_eq!(ReportTimezone::parse("local"), Some(ReportTimezone::Local));
        assert_eq!(ReportTimezone::parse("UTC"), Some(ReportTimezone::Utc));
        assert_eq!(
            ReportTimezone::parse("+05:30"),
            Some(ReportTimezone::Fixed(FixedOffset::east_opt(19800).unwrap()))
        );
        assert_eq!(
            ReportTimezone::parse("-0800"),
            Some(ReportTimezone::Fixed(FixedOffset::west_opt(28800).unwrap()))
        );
        assert_eq!(ReportTimezone::parse("+5"), None);
        assert_eq!(ReportTimezone::parse("+05:75"), None);
        assert_eq!(ReportTimezone::parse("mars"), None);
    }

    #[test]
    fn test_report_timezone_display_parses_back() {
        for text in ["local", "utc", "+05:30", "-08:00"] {
            let tz = ReportTimezone::parse(text).unwrap();
            assert_eq!(tz.to_string(), text);
        }
    }
}
