//! Nutrition aggregation module
//!
//! Pure computation over already-fetched entries: normalization, report
//! totals, the 7-day trailing window, and daily-needs comparison. Nothing in
//! here performs I/O or can fail.

pub mod aggregate;
pub mod labels;
pub mod needs;
pub mod normalize;
pub mod weekly;

pub use aggregate::{aggregate, NutrientTotals};
pub use labels::LabelSet;
pub use needs::{DailyNeeds, NutrientProgress};
pub use normalize::{normalize, normalize_all, NutrientEntry, RecordedAt};
pub use weekly::{
    group_by_week, group_by_week_ending, DailyBucket, DayIntake, ReportTimezone, WeeklyIntake,
    WINDOW_DAYS,
};
