use super::{
    capacity::score_capacity,
    category::{CompatibilityTable, score_category},
    facility::score_facility,
    location::score_location,
    price::score_price,
    result::ScoreBreakdown,
    schedule::score_time,
    weights::WeightVector,
};
use crate::{Listing, Request, config::MatchingConfig};

pub const MAX_SCORE: f64 = 100.0;

#[derive(Debug, Clone, PartialEq)]
pub struct ScoringResult {
    /// 0〜100
    pub score: f64,
    pub status: &'static str,
    pub details: String,
}

impl ScoringResult {
    pub fn new(score: f64, details: impl Into<String>) -> Self {
        let score = clamp_score(score);
        Self {
            score,
            status: status_from_score(score),
            details: details.into(),
        }
    }

    /// 判定材料が不足している場合の中立スコア
    pub fn unknown(score: f64, details: impl Into<String>) -> Self {
        Self {
            score: clamp_score(score),
            status: "UNKNOWN",
            details: details.into(),
        }
    }

    pub fn miss(details: impl Into<String>) -> Self {
        Self::new(0.0, details)
    }
}

#[derive(Debug, Clone)]
pub struct MatchScore {
    pub total: f64,
    pub location: ScoringResult,
    pub time: ScoringResult,
    pub category: ScoringResult,
    pub capacity: ScoringResult,
    pub price: ScoringResult,
    pub facility: ScoringResult,
}

impl MatchScore {
    pub fn breakdown(&self) -> ScoreBreakdown {
        ScoreBreakdown {
            location: self.location.score,
            time: self.time.score,
            category: self.category.score,
            capacity: self.capacity.score,
            price: self.price.score,
            facility: self.facility.score,
        }
    }
}

pub struct ScoringEngine<'a> {
    weights: &'a WeightVector,
    compatibility: &'a CompatibilityTable,
}

impl<'a> ScoringEngine<'a> {
    pub fn new(config: &'a MatchingConfig) -> Self {
        Self {
            weights: &config.weights,
            compatibility: &config.compatibility,
        }
    }

    /// 6次元のスコアを計算し、重み付き合計を付与する
    pub fn calculate_match_score(&self, request: &Request, listing: &Listing) -> MatchScore {
        let location = score_location(request, listing);
        let time = score_time(request, listing);
        let category = score_category(self.compatibility, request, listing);
        let capacity = score_capacity(request, listing);
        let price = score_price(request, listing);
        let facility = score_facility(request, listing);

        let mut score = MatchScore {
            total: 0.0,
            location,
            time,
            category,
            capacity,
            price,
            facility,
        };
        score.total = aggregate(self.weights, &score.breakdown());
        score
    }
}

/// Weighted sum of the six dimension scores, rounded to two decimals.
pub fn aggregate(weights: &WeightVector, breakdown: &ScoreBreakdown) -> f64 {
    let total = breakdown.location * weights.location
        + breakdown.time * weights.time
        + breakdown.category * weights.category
        + breakdown.capacity * weights.capacity
        + breakdown.price * weights.price
        + breakdown.facility * weights.facility;

    round2(total)
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, MAX_SCORE)
    }
}

fn status_from_score(score: f64) -> &'static str {
    if score >= 90.0 {
        "PERFECT_MATCH"
    } else if score >= 70.0 {
        "MATCH"
    } else if score > 0.0 {
        "PARTIAL_MATCH"
    } else {
        "MISS"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        fixtures,
        matching::weights::CANONICAL_WEIGHTS,
        model::{Category, DayKind, PriceModel, TimeWindow},
    };

    #[test]
    fn perfect_candidate_scores_one_hundred() {
        let config = MatchingConfig::default();
        let engine = ScoringEngine::new(&config);
        let mut request = fixtures::request();
        request.sub_regions = vec!["Pudong".into()];

        let score = engine.calculate_match_score(&request, &fixtures::listing());

        assert_eq!(score.location.score, 100.0);
        assert_eq!(score.time.score, 100.0);
        assert_eq!(score.category.score, 100.0);
        assert_eq!(score.capacity.score, 100.0);
        assert_eq!(score.price.score, 100.0);
        assert_eq!(score.facility.score, 100.0);
        assert_eq!(score.total, 100.0);
        assert_eq!(score.location.status, "PERFECT_MATCH");
    }

    #[test]
    fn city_mismatch_caps_total_at_seventy() {
        let config = MatchingConfig::default();
        let engine = ScoringEngine::new(&config);
        let mut listing = fixtures::listing();
        listing.city = "Beijing".into();

        let score = engine.calculate_match_score(&fixtures::request(), &listing);

        assert_eq!(score.location.score, 0.0);
        assert_eq!(score.location.status, "MISS");
        assert!(score.total <= 70.0);
        assert_eq!(score.total, 70.0);
    }

    #[test]
    fn total_is_rounded_weighted_sum() {
        let config = MatchingConfig::default();
        let engine = ScoringEngine::new(&config);
        let mut listing = fixtures::listing();
        listing.category = Category::Office;
        listing.capacity = 7;
        listing.time_windows = vec![TimeWindow::parse("11:00", "18:00").unwrap()];
        listing.price_model = PriceModel::Hourly;
        listing.price = Some(90.0);
        listing.available_days = vec![DayKind::Weekday, DayKind::Weekend];

        let score = engine.calculate_match_score(&fixtures::request(), &listing);
        let expected = round2(
            score.location.score * 0.30
                + score.time.score * 0.25
                + score.category.score * 0.20
                + score.capacity.score * 0.10
                + score.price.score * 0.10
                + score.facility.score * 0.05,
        );

        assert_eq!(score.total, expected);
        assert_eq!(score.total, aggregate(&CANONICAL_WEIGHTS, &score.breakdown()));
    }

    #[test]
    fn scores_are_clamped_into_range() {
        assert_eq!(ScoringResult::new(140.0, "").score, 100.0);
        assert_eq!(ScoringResult::new(-5.0, "").score, 0.0);
        assert_eq!(ScoringResult::new(f64::NAN, "").score, 0.0);
        assert_eq!(ScoringResult::unknown(50.0, "").status, "UNKNOWN");
    }

    #[test]
    fn round2_keeps_two_decimals() {
        assert_eq!(round2(71.23456), 71.23);
        assert_eq!(round2(71.235001), 71.24);
    }
}
