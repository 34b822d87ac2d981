//! Turns style attributes into an outfit recommendation via the text model.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::llm::{LlmError, TextGenerator};

const PINTEREST_SEARCH: &str = "https://www.pinterest.com/search/pins/?q=";

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("text service failed: {0}")]
    Upstream(#[from] LlmError),

    #[error("could not parse model output: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("model returned an empty reply")]
    Empty,
}

/// Attributes a user supplies when asking for an outfit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleInput {
    pub body_type: String,
    pub occasion: String,
    pub weather: String,
    pub budget: String,
    pub style_preference: String,
    #[serde(default)]
    pub color_preference: Option<String>,
}

/// Outfit produced by the model. Every field is required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub outfit_title: String,
    pub outfit_description: String,
    pub color_palette: Vec<String>,
    pub accessories: Vec<String>,
    pub hairstyle: String,
    pub styling_explanation: String,
    pub color_of_the_day: String,
    pub budget_note: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveryLink {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveryLinks {
    pub full_outfit: DiscoveryLink,
    pub accessories: DiscoveryLink,
    pub hairstyle: DiscoveryLink,
    pub color_palette: DiscoveryLink,
}

#[derive(Clone)]
pub struct Stylist {
    generator: Arc<dyn TextGenerator>,
}

impl Stylist {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    #[instrument(skip(self, input), fields(occasion = %input.occasion, style = %input.style_preference))]
    pub async fn generate(&self, input: &StyleInput) -> Result<Recommendation, GenerationError> {
        let prompt = build_prompt(input);
        let raw = self.generator.complete(&prompt).await?;
        debug!(reply_len = raw.len(), "model replied");
        parse_recommendation(&raw)
    }
}

pub fn build_prompt(input: &StyleInput) -> String {
    let color_note = match input.color_preference.as_deref().map(str::trim) {
        Some(c) if !c.is_empty() => format!("Preferred colors: {c}."),
        _ => "No specific color preference.".to_string(),
    };

    format!(
        r#"You are a professional fashion stylist AI.

User Profile:
- Body type: {body_type}
- Occasion: {occasion}
- Weather: {weather}
- Budget: {budget}
- Style preference: {style}
- {color_note}

Return ONLY a valid JSON object with:

{{
  "outfit_title": "",
  "outfit_description": "",
  "color_palette": [],
  "accessories": [],
  "hairstyle": "",
  "styling_explanation": "",
  "color_of_the_day": "",
  "budget_note": ""
}}
"#,
        body_type = input.body_type,
        occasion = input.occasion,
        weather = input.weather,
        budget = input.budget,
        style = input.style_preference,
    )
}

/// Returns the contents of the first ``` fenced block, minus its language tag.
/// Text outside the block, before or after it, is ignored.
pub fn strip_code_fence(text: &str) -> &str {
    const FENCE: &str = "```";

    let text = text.trim();
    if text.starts_with('{') {
        return text;
    }
    let Some(open) = text.find(FENCE) else {
        return text;
    };
    let after_open = &text[open + FENCE.len()..];
    let inner = match after_open.find(FENCE) {
        Some(close) => &after_open[..close],
        None => after_open,
    };
    inner
        .trim_start_matches(|c: char| c.is_ascii_alphabetic())
        .trim()
}

pub fn parse_recommendation(raw: &str) -> Result<Recommendation, GenerationError> {
    let body = strip_code_fence(raw);
    if body.is_empty() {
        return Err(GenerationError::Empty);
    }
    Ok(serde_json::from_str(body)?)
}

pub fn discovery_links(
    recommendation: &Recommendation,
    occasion: &str,
    style_preference: &str,
) -> DiscoveryLinks {
    let accessories = match recommendation.accessories.as_slice() {
        [] => format!("{occasion} accessories"),
        items => items.iter().take(2).map(String::as_str).collect::<Vec<_>>().join(" "),
    };

    DiscoveryLinks {
        full_outfit: search_link(&format!(
            "{style_preference} {occasion} outfit {}",
            recommendation.color_of_the_day
        )),
        accessories: search_link(&accessories),
        hairstyle: search_link(&format!("{} hairstyle", recommendation.hairstyle)),
        color_palette: search_link(&format!(
            "{} outfit color palette",
            recommendation.color_of_the_day
        )),
    }
}

fn search_link(query: &str) -> DiscoveryLink {
    DiscoveryLink {
        url: format!("{PINTEREST_SEARCH}{}", urlencoding::encode(query.trim())),
    }
}
