use serde::{Deserialize, Serialize};

use super::repo_types::HistorySummary;
use crate::stylist::{DiscoveryLinks, Recommendation};

pub const DEFAULT_HISTORY_LIMIT: i64 = 5;
pub const MAX_HISTORY_LIMIT: i64 = 50;

#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    pub recommendation: Recommendation,
    pub pinterest_links: DiscoveryLinks,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
}
fn default_limit() -> i64 {
    DEFAULT_HISTORY_LIMIT
}

impl HistoryQuery {
    pub fn clamped_limit(&self) -> i64 {
        self.limit.clamp(0, MAX_HISTORY_LIMIT)
    }
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub history: Vec<HistorySummary>,
}
