use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ranking::ScoredListing;
use crate::model::MatchStatus;

/// 次元別スコア（各0〜100）
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub location: f64,
    pub time: f64,
    pub category: f64,
    pub capacity: f64,
    pub price: f64,
    pub facility: f64,
}

/// 推薦結果。(listing_id, request_id) で一意。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub listing_id: i64,
    pub request_id: i64,
    pub total_score: f64,
    pub breakdown: ScoreBreakdown,
    pub status: MatchStatus,
    pub auto_recommended: bool,
    pub created_at: DateTime<Utc>,
    pub viewed_at: Option<DateTime<Utc>>,
    pub applied_at: Option<DateTime<Utc>>,
}

impl MatchResult {
    /// エンジンが生成する推薦（status=recommended, auto_recommended=true）
    pub fn recommended(request_id: i64, scored: &ScoredListing<'_>, now: DateTime<Utc>) -> Self {
        Self {
            listing_id: scored.listing.id,
            request_id,
            total_score: scored.score.total,
            breakdown: scored.score.breakdown(),
            status: MatchStatus::Recommended,
            auto_recommended: true,
            created_at: now,
            viewed_at: None,
            applied_at: None,
        }
    }

    pub fn key(&self) -> (i64, i64) {
        (self.listing_id, self.request_id)
    }
}
