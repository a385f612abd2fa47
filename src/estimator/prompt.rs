//! Prompt builders

use chrono::NaiveDate;

use crate::models::UserProfile;

pub const SYSTEM_PROMPT: &str =
    "You are a nutrition assistant. Reply with JSON only, no commentary.";

const RECORD_KEYS: &str =
    "name, calories, protein, fat, carbs, fiber, sugar, vitamins, minerals";

/// Ask for one record per listed item, in order
pub fn items_prompt(items: &[String]) -> String {
    let list = items
        .iter()
        .map(|item| format!("- {}", item.trim()))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "Estimate the nutrition of each food item below. Return a JSON array with one \
         object per item, in the same order, with the keys: {}. Numbers are per serving \
         (calories in kcal, the rest in grams). vitamins and minerals are lists of names.\n\n{}",
        RECORD_KEYS, list
    )
}

/// Ask for per-item records from a free-text meal description
pub fn description_prompt(text: &str) -> String {
    format!(
        "Split this meal description into individual food items and estimate the \
         nutrition of each. Return a JSON array of objects with the keys: {}.\n\n{}",
        RECORD_KEYS,
        text.trim()
    )
}

/// Ask for daily targets from a profile
pub fn daily_needs_prompt(profile: &UserProfile, today: NaiveDate) -> String {
    format!(
        "Estimate the daily nutritional needs of a {}-year-old {} weighing {:.1} kg, \
         {} ft {} in tall, with a {} activity level. Return a JSON object with the keys \
         calories, protein, carbs, fat, fiber (calories in kcal, the rest in grams).",
        profile.age_on(today),
        profile.gender,
        profile.weight_kg,
        profile.height_feet,
        profile.height_inches,
        profile.activity_level
    )
}
