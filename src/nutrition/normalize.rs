//! Entry normalizer
//!
//! Coerces loosely-typed nutrient records (manual form input, estimator
//! replies, stored history) into [`NutrientEntry`]. Normalization is total:
//! every JSON value produces an entry, bad numbers become `0` and bad labels
//! become empty sets.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::models::Nutrition;
use super::labels::LabelSet;

/// Name used when a record carries neither `food` nor `name`
pub const UNNAMED_FOOD: &str = "Unnamed item";

/// When an entry was recorded.
///
/// A bare calendar date is already a day and is never shifted by the
/// reporting timezone; an instant is converted before taking its date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordedAt {
    Instant(DateTime<Utc>),
    Date(NaiveDate),
}

impl RecordedAt {
    /// Best-effort parse of a raw timestamp value
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Self::parse_str(s),
            Value::Number(n) => {
                let millis = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?;
                DateTime::<Utc>::from_timestamp_millis(millis).map(RecordedAt::Instant)
            }
            Value::Object(map) => {
                let seconds = lookup(map, "seconds").or_else(|| lookup(map, "_seconds"))?.as_i64()?;
                let nanos = lookup(map, "nanoseconds")
                    .or_else(|| lookup(map, "_nanoseconds"))
                    .and_then(Value::as_u64)
                    .unwrap_or(0);
                DateTime::<Utc>::from_timestamp(seconds, nanos.min(999_999_999) as u32)
                    .map(RecordedAt::Instant)
            }
            _ => None,
        }
    }

    pub fn parse_str(text: &str) -> Option<Self> {
        let text = text.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
            return Some(RecordedAt::Instant(dt.with_timezone(&Utc)));
        }
        // Wall-clock strings without an offset are read as UTC
        for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
                return Some(RecordedAt::Instant(naive.and_utc()));
            }
        }
        NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .ok()
            .map(RecordedAt::Date)
    }

    /// Canonical string form: RFC 3339 for instants, `YYYY-MM-DD` for dates
    pub fn to_canonical(&self) -> String {
        match self {
            RecordedAt::Instant(dt) => dt.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            RecordedAt::Date(d) => d.format("%Y-%m-%d").to_string(),
        }
    }
}

impl Serialize for RecordedAt {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_canonical())
    }
}

impl<'de> Deserialize<'de> for RecordedAt {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Error;
        let text = String::deserialize(deserializer)?;
        Self::parse_str(&text).ok_or_else(|| D::Error::custom(format!("invalid timestamp: {text}")))
    }
}

/// One food item's canonical nutrient contribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutrientEntry {
    pub food: String,
    #[serde(flatten)]
    pub nutrition: Nutrition,
    pub vitamins: LabelSet,
    pub minerals: LabelSet,
    #[serde(rename = "timestamp", default, skip_serializing_if = "Option::is_none")]
    pub recorded_at: Option<RecordedAt>,
}

impl NutrientEntry {
    pub fn named(food: &str) -> Self {
        Self {
            food: food.to_string(),
            nutrition: Nutrition::zero(),
            vitamins: LabelSet::new(),
            minerals: LabelSet::new(),
            recorded_at: None,
        }
    }

    pub fn with_nutrition(mut self, nutrition: Nutrition) -> Self {
        self.nutrition = nutrition;
        self
    }

    pub fn recorded(mut self, at: RecordedAt) -> Self {
        self.recorded_at = Some(at);
        self
    }

    /// Render back to the loosely-typed input shape
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("food".into(), Value::String(self.food.clone()));
        map.insert("calories".into(), number(self.nutrition.calories));
        map.insert("protein".into(), number(self.nutrition.protein));
        map.insert("carbs".into(), number(self.nutrition.carbs));
        map.insert("fat".into(), number(self.nutrition.fat));
        map.insert("fiber".into(), number(self.nutrition.fiber));
        map.insert("sugar".into(), number(self.nutrition.sugar));
        map.insert("vitamins".into(), Value::String(self.vitamins.joined()));
        map.insert("minerals".into(), Value::String(self.minerals.joined()));
        if let Some(at) = &self.recorded_at {
            map.insert("timestamp".into(), Value::String(at.to_canonical()));
        }
        Value::Object(map)
    }
}

fn number(value: f64) -> Value {
    serde_json::Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or_else(|| Value::from(0))
}

/// Normalize one raw record. Never fails.
pub fn normalize(raw: &Value) -> NutrientEntry {
    let empty = Map::new();
    let map = raw.as_object().unwrap_or(&empty);

    let food = ["food", "name"]
        .iter()
        .filter_map(|key| lookup(map, key))
        .find_map(|v| match v {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            _ => None,
        })
        .unwrap_or_else(|| UNNAMED_FOOD.to_string());

    let field = |key: &str| lookup(map, key).map(coerce_number).unwrap_or(0.0);

    NutrientEntry {
        food,
        nutrition: Nutrition {
            calories: field("calories"),
            protein: field("protein"),
            carbs: field("carbs"),
            fat: field("fat"),
            fiber: field("fiber"),
            sugar: field("sugar"),
        },
        vitamins: lookup(map, "vitamins").map(coerce_labels).unwrap_or_default(),
        minerals: lookup(map, "minerals").map(coerce_labels).unwrap_or_default(),
        recorded_at: lookup(map, "timestamp").and_then(RecordedAt::from_value),
    }
}

pub fn normalize_all(raws: &[Value]) -> Vec<NutrientEntry> {
    raws.iter().map(normalize).collect()
}

/// Numeric coercion with a `0` fallback
pub fn coerce_number(value: &Value) -> f64 {
    parse_number(value).unwrap_or(0.0)
}

/// A non-negative finite quantity, if the value holds one.
///
/// Strings are read like a leading-number parse, so `"2.5 g"` is `2.5`.
pub fn parse_number(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_leading_number(s),
        _ => None,
    }?;
    (parsed.is_finite() && parsed >= 0.0).then_some(parsed)
}

/// Label coercion: lists keep string and number elements, strings split on commas
pub fn coerce_labels(value: &Value) -> LabelSet {
    match value {
        Value::String(s) => LabelSet::parse(s),
        Value::Array(items) => {
            let mut set = LabelSet::new();
            for item in items {
                match item {
                    Value::String(s) => {
                        set.insert(s);
                    }
                    Value::Number(n) => {
                        set.insert(&n.to_string());
                    }
                    _ => {}
                }
            }
            set
        }
        _ => LabelSet::new(),
    }
}

/// Exact key first, then a case-insensitive match
pub(crate) fn lookup<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    map.get(key).or_else(|| {
        map.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    })
}

/// Longest prefix of `text` (after leading whitespace) that reads as a decimal number
fn parse_leading_number(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let mut end = 0;

    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }
    if digits == 0 {
        return None;
    }

    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    text[..end].parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numeric_strings_and_numbers() {
        let entry = normalize(&json!({
            "food": "Apple",
            "calories": "95",
            "protein": 0.5,
            "carbs": " 25 g",
            "fat": "0.3g",
            "fiber": "4.4e0",
            "sugar": ".5"
        }));
        assert_eq!(entry.food, "Apple");
        assert_eq!(entry.nutrition.calories, 95.0);
        assert_eq!(entry.nutrition.protein, 0.5);
        assert_eq!(entry.nutrition.carbs, 25.0);
        assert_eq!(entry.nutrition.fat, 0.3);
        assert_eq!(entry.nutrition.fiber, 4.4);
        assert_eq!(entry.nutrition.sugar, 0.5);
    }

    #[test]
    fn test_invalid_numbers_become_zero() {
        let entry = normalize(&json!({
            "calories": "lots",
            "protein": null,
            "carbs": -12,
            "fat": true,
            "fiber": {"value": 3},
            "sugar": "1e999"
        }));
        assert!(entry.nutrition.is_zero());
        assert_eq!(entry.food, UNNAMED_FOOD);
    }

    #[test]
    fn test_non_object_input_is_total() {
        for raw in [json!(null), json!("Apple"), json!(42), json!([1, 2])] {
            let entry = normalize(&raw);
            assert!(entry.nutrition.is_zero());
            assert!(entry.vitamins.is_empty());
            assert!(entry.recorded_at.is_none());
        }
    }

    #[test]
    fn test_name_fallback_and_case_insensitive_keys() {
        let entry = normalize(&json!({"name": " Big Mac ", "Calories": 550, "PROTEIN": "25"}));
        assert_eq!(entry.food, "Big Mac");
        assert_eq!(entry.nutrition.calories, 550.0);
        assert_eq!(entry.nutrition.protein, 25.0);
    }

    #[test]
    fn test_labels_from_string_and_list() {
        let entry = normalize(&json!({
            "vitamins": "C, Fiber , ,C",
            "minerals": [" Iron", "", "Zinc", 12, null]
        }));
        assert_eq!(entry.vitamins.joined(), "C, Fiber");
        assert_eq!(entry.minerals.joined(), "Iron, Zinc, 12");
    }

    #[test]
    fn test_unmapped_label_types_are_empty() {
        let entry = normalize(&json!({"vitamins": 7, "minerals": {"iron": true}}));
        assert!(entry.vitamins.is_empty());
        assert!(entry.minerals.is_empty());
    }

    #[test]
    fn test_timestamp_forms() {
        let date = normalize(&json!({"timestamp": "2025-03-10"}));
        assert_eq!(
            date.recorded_at,
            Some(RecordedAt::Date(NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()))
        );

        let rfc = normalize(&json!({"timestamp": "2025-03-10T18:30:00-05:00"}));
        let expected = DateTime::parse_from_rfc3339("2025-03-10T23:30:00Z").unwrap().with_timezone(&Utc);
        assert_eq!(rfc.recorded_at, Some(RecordedAt::Instant(expected)));

        let millis = normalize(&json!({"timestamp": expected.timestamp_millis()}));
        assert_eq!(millis.recorded_at, Some(RecordedAt::Instant(expected)));

        let store = normalize(&json!({"timestamp": {"seconds": expected.timestamp(), "nanoseconds": 0}}));
        assert_eq!(store.recorded_at, Some(RecordedAt::Instant(expected)));

        let junk = normalize(&json!({"timestamp": "last tuesday"}));
        assert!(junk.recorded_at.is_none());
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let raws = [
            json!({"food": "Apple", "calories": "95", "protein": null, "vitamins": "C, Fiber"}),
            json!({"name": "Toast", "calories": 52, "protein": 2, "vitamins": ["Fiber", "B1"],
                   "timestamp": "2025-03-10T08:15:30.250Z"}),
            json!({"calories": "abc", "minerals": ["Iron", "Iron"], "timestamp": "2025-03-12"}),
            json!(null),
        ];
        for raw in &raws {
            let once = normalize(raw);
            let twice = normalize(&once.to_value());
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_serde_shape_matches_value_shape() {
        let entry = normalize(&json!({"food": "Toast", "calories": 52, "vitamins": ["B1"]}));
        let via_serde = serde_json::to_value(&entry).unwrap();
        assert_eq!(via_serde["calories"], json!(52.0));
        assert_eq!(via_serde["vitamins"], json!("B1"));
        assert!(via_serde.get("timestamp").is_none());
        let back: NutrientEntry = serde_json::from_value(via_serde).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn test_parse_leading_number() {
        assert_eq!(parse_leading_number("300kcal"), Some(300.0));
        assert_eq!(parse_leading_number("1.5e2x"), Some(150.0));
        assert_eq!(parse_leading_number("2e"), Some(2.0));
        assert_eq!(parse_leading_number("-4"), Some(-4.0));
        assert_eq!(parse_leading_number("."), None);
        assert_eq!(parse_leading_number("abc"), None);
        assert_eq!(parse_leading_number(""), None);
    }
}
