//! Aggregator
//!
//! Sums normalized entries into report totals and unions their label sets.

use serde::{Deserialize, Serialize};

use crate::models::Nutrition;
use super::labels::LabelSet;
use super::normalize::NutrientEntry;

/// Totals over a set of entries.
///
/// Serializes flat: six numbers plus two display-ready label strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NutrientTotals {
    #[serde(flatten)]
    pub nutrition: Nutrition,
    pub vitamins: LabelSet,
    pub minerals: LabelSet,
}

impl NutrientTotals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one entry in. Entries are never rejected.
    pub fn add_entry(&mut self, entry: &NutrientEntry) {
        self.nutrition += &entry.nutrition;
        self.vitamins.extend_from(&entry.vitamins);
        self.minerals.extend_from(&entry.minerals);
    }
}

impl<'a> FromIterator<&'a NutrientEntry> for NutrientTotals {
    fn from_iter<I: IntoIterator<Item = &'a NutrientEntry>>(iter: I) -> Self {
        let mut totals = Self::new();
        for entry in iter {
            totals.add_entry(entry);
        }
        totals
    }
}

/// Aggregate entries into totals; empty input gives all-zero totals
pub fn aggregate(entries: &[NutrientEntry]) -> NutrientTotals {
    entries.iter().collect()
}
