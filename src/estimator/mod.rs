//! Nutrient estimation
//!
//! A language-model completions API turns food descriptions into nutrition
//! records and a profile into daily targets. Replies are parsed loosely and
//! pushed through the normalizer, so nothing past this module sees the raw
//! reply shape.

mod openai;
pub mod parse;
pub mod prompt;

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use crate::models::UserProfile;
use crate::nutrition::normalize::UNNAMED_FOOD;
use crate::nutrition::{normalize, DailyNeeds, NutrientEntry};

pub use openai::OpenAiEstimator;

#[derive(Debug, Error)]
pub enum EstimatorError {
    #[error("Server misconfiguration: Missing OpenAI API key.")]
    MissingApiKey,
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("estimation service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("estimation service returned an empty completion")]
    EmptyCompletion,
    #[error("could not read nutrition data from reply: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait NutritionEstimator: Send + Sync {
    /// Send one system + user prompt pair and return the reply text
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, EstimatorError>;

    /// One normalized record per listed item. A record the reply leaves
    /// unnamed takes the name of the item at the same position.
    async fn estimate_items(&self, items: &[String]) -> Result<Vec<NutrientEntry>, EstimatorError> {
        if items.is_empty() {
            return Ok(Vec::new());
        }
        let reply = self
            .complete(prompt::SYSTEM_PROMPT, &prompt::items_prompt(items))
            .await?;
        let records = parse::json_records(&reply)?;

        Ok(records
            .iter()
            .enumerate()
            .map(|(i, raw)| {
                let mut entry = normalize(raw);
                if entry.food == UNNAMED_FOOD {
                    if let Some(item) = items.get(i) {
                        entry.food = item.clone();
                    }
                }
                entry
            })
            .collect())
    }

    /// Split a free-text meal description into per-item records
    async fn estimate_description(&self, text: &str) -> Result<Vec<NutrientEntry>, EstimatorError> {
        let reply = self
            .complete(prompt::SYSTEM_PROMPT, &prompt::description_prompt(text))
            .await?;
        let records = parse::json_records(&reply)?;
        Ok(records.iter().map(normalize).collect())
    }

    async fn estimate_daily_needs(
        &self,
        profile: &UserProfile,
        today: NaiveDate,
    ) -> Result<DailyNeeds, EstimatorError> {
        let reply = self
            .complete(prompt::SYSTEM_PROMPT, &prompt::daily_needs_prompt(profile, today))
            .await?;
        let needs = DailyNeeds::from_value(&parse::json_object(&reply)?);
        if needs.is_empty() {
            return Err(EstimatorError::Malformed(
                "reply contained no daily targets".to_string(),
            ));
        }
        Ok(needs)
    }
}
