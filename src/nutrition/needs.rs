//! Estimated daily needs and consumed-vs-target progress

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::Nutrition;
use super::normalize::{lookup, parse_number};

/// Daily targets. A missing target renders as `N/A`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyNeeds {
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,
    pub fiber: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NutrientProgress {
    pub nutrient: &'static str,
    pub unit: &'static str,
    pub consumed: f64,
    pub target: Option<f64>,
    /// consumed / target as a percentage, when the target is positive
    pub percent: Option<f64>,
    pub display: String,
}

impl DailyNeeds {
    /// Loose parse of an estimator reply such as
    /// `{"calories": "2500 kcal", "protein": 56, ...}`
    pub fn from_value(value: &Value) -> Self {
        let field = |key: &str| {
            value
                .as_object()
                .and_then(|map| lookup(map, key))
                .and_then(parse_number)
        };
        Self {
            calories: field("calories"),
            protein: field("protein"),
            carbs: field("carbs"),
            fat: field("fat"),
            fiber: field("fiber"),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Consumed against target for each tracked nutrient
    pub fn compare(&self, consumed: &Nutrition) -> Vec<NutrientProgress> {
        [
            ("calories", "cal", consumed.calories, self.calories),
            ("protein", "g", consumed.protein, self.protein),
            ("carbs", "g", consumed.carbs, self.carbs),
            ("fat", "g", consumed.fat, self.fat),
            ("fiber", "g", consumed.fiber, self.fiber),
        ]
        .into_iter()
        .map(|(nutrient, unit, consumed, target)| NutrientProgress {
            nutrient,
            unit,
            consumed,
            target,
            percent: target.filter(|t| *t > 0.0).map(|t| consumed / t * 100.0),
            display: format_progress(consumed, target, unit),
        })
        .collect()
    }
}

/// `"1234.5 / 2000 cal"`, or `"1234.5 / N/A cal"` without a target
pub fn format_progress(consumed: f64, target: Option<f64>, unit: &str) -> String {
    let target = match target {
        Some(t) => format_quantity(t),
        None => "N/A".to_string(),
    };
    format!("{:.1} / {} {}", consumed, target, unit)
}

fn format_quantity(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{:.1}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value_loose_fields() {
        let needs = DailyNeeds::from_value(&json!({
            "Calories": "2500 kcal",
            "protein": 56,
            "carbs": "N/A",
            "fiber": "30g"
        }));
        assert_eq!(needs.calories, Some(2500.0));
        assert_eq!(needs.protein, Some(56.0));
        assert_eq!(needs.carbs, None);
        assert_eq!(needs.fat, None);
        assert_eq!(needs.fiber, Some(30.0));
    }

    #[test]
    fn test_from_non_object_is_empty() {
        assert!(DailyNeeds::from_value(&json!("2000")).is_empty());
    }

    #[test]
    fn test_compare_formats_like_weekly_view() {
        let needs = DailyNeeds { calories: Some(2000.0), protein: Some(50.0), ..Default::default() };
        let consumed = Nutrition { calories: 1234.56, protein: 25.0, ..Nutrition::zero() };
        let progress = needs.compare(&consumed);

        assert_eq!(progress.len(), 5);
        assert_eq!(progress[0].display, "1234.6 / 2000 cal");
        assert_eq!(progress[1].display, "25.0 / 50 g");
        assert_eq!(progress[2].display, "0.0 / N/A g");
        assert_eq!(progress[1].percent, Some(50.0));
        assert_eq!(progress[2].percent, None);
    }

    #[test]
    fn test_zero_target_has_no_percent() {
        let needs = DailyNeeds { fiber: Some(0.0), ..Default::default() };
        let progress = needs.compare(&Nutrition::zero());
        assert_eq!(progress[4].percent, None);
        assert_eq!(progress[4].display, "0.0 / 0 g");
    }
}
