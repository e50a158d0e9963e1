use std::cmp::Ordering;

use super::scoring::MatchScore;
use crate::Listing;

#[derive(Debug, Clone)]
pub struct ScoredListing<'a> {
    pub listing: &'a Listing,
    pub score: MatchScore,
}

/// 総合スコア降順 → 認証済み優先 → 評価降順。同点は入力順を維持する。
pub fn compare(a: &ScoredListing<'_>, b: &ScoredListing<'_>) -> Ordering {
    b.score
        .total
        .total_cmp(&a.score.total)
        .then_with(|| b.listing.is_verified.cmp(&a.listing.is_verified))
        .then_with(|| {
            b.listing
                .average_rating
                .total_cmp(&a.listing.average_rating)
        })
}

/// 0点以下を除外して並べ替え、上位 `top_n` 件に切り詰める
pub fn rank<'a>(mut scored: Vec<ScoredListing<'a>>, top_n: usize) -> Vec<ScoredListing<'a>> {
    scored.retain(|s| s.score.total > 0.0);
    scored.sort_by(compare);
    scored.truncate(top_n);
    scored
}
