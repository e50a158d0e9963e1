use super::scoring::ScoringResult;
use crate::{
    Listing, Request,
    model::{BudgetTier, PriceModel},
};

const IN_BUDGET_SCORE: f64 = 100.0;
const GRACE_SCORE: f64 = 70.0;
const OVER_BUDGET_SCORE: f64 = 30.0;
const CEILING_GRACE_RATIO: f64 = 1.2;

/// 価格スコア
///
/// 判定順: 無料掲載 → 予算制約なし/応相談 → 掲載側応相談 → 価格未設定
/// → 上限金額 → 予算帯
pub fn score_price(request: &Request, listing: &Listing) -> ScoringResult {
    if listing.price_model == PriceModel::Free {
        return ScoringResult::new(IN_BUDGET_SCORE, "無料スペース");
    }

    if !request.has_budget_constraint() || request.budget_tier == Some(BudgetTier::Negotiable) {
        return ScoringResult::new(80.0, "予算制約なし/応相談");
    }

    if listing.price_model == PriceModel::Negotiable {
        return ScoringResult::new(70.0, "掲載側が価格応相談");
    }

    let Some(price) = listing.price else {
        return ScoringResult::unknown(50.0, "価格未設定のため中立スコア");
    };

    if let Some(ceiling) = request.max_budget {
        let (score, label) = if price <= ceiling {
            (IN_BUDGET_SCORE, "予算内")
        } else if price <= ceiling * CEILING_GRACE_RATIO {
            (GRACE_SCORE, "予算やや超過")
        } else {
            (OVER_BUDGET_SCORE, "予算超過")
        };
        return ScoringResult::new(
            score,
            format!("{}: {:.0} / 上限{:.0}", label, price, ceiling),
        );
    }

    match request.budget_tier {
        Some(tier) => ScoringResult::new(
            tier_score(tier, price),
            format!("予算帯 {}: 価格{:.0}", tier.as_ref(), price),
        ),
        None => ScoringResult::unknown(50.0, "予算情報が不明"),
    }
}

/// 予算帯ごとの固定境界。帯内100、猶予帯70、それ以外0。
pub fn tier_score(tier: BudgetTier, price: f64) -> f64 {
    let in_band = match tier {
        BudgetTier::Free => return 0.0,
        BudgetTier::Negotiable => return 80.0,
        BudgetTier::Under100 => price <= 100.0,
        BudgetTier::From100To300 => (100.0..=300.0).contains(&price),
        BudgetTier::From300To500 => (300.0..=500.0).contains(&price),
        BudgetTier::Over500 => price >= 500.0,
    };
    if in_band {
        return IN_BUDGET_SCORE;
    }

    let in_grace = match tier {
        BudgetTier::Under100 => price <= 120.0,
        BudgetTier::From100To300 => price <= 350.0,
        BudgetTier::From300To500 => price <= 600.0,
        BudgetTier::Over500 => price >= 400.0,
        BudgetTier::Free | BudgetTier::Negotiable => false,
    };
    if in_grace { GRACE_SCORE } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    fn paid_listing(price: Option<f64>) -> Listing {
        let mut listing = fixtures::listing();
        listing.price_model = PriceModel::Hourly;
        listing.price = price;
        listing
    }

    #[test]
    fn free_listing_always_scores_full() {
        let mut request = fixtures::request();
        request.budget_tier = Some(BudgetTier::Free);
        request.max_budget = Some(0.0);

        assert_eq!(score_price(&request, &fixtures::listing()).score, 100.0);
    }

    #[test]
    fn unconstrained_or_negotiable_budget_scores_eighty() {
        let mut request = fixtures::request();
        assert_eq!(score_price(&request, &paid_listing(Some(999.0))).score, 80.0);

        request.budget_tier = Some(BudgetTier::Negotiable);
        request.max_budget = Some(10.0);
        assert_eq!(score_price(&request, &paid_listing(Some(999.0))).score, 80.0);
    }

    #[test]
    fn negotiable_listing_and_missing_price() {
        let mut request = fixtures::request();
        request.max_budget = Some(300.0);

        let mut negotiable = paid_listing(None);
        negotiable.price_model = PriceModel::Negotiable;
        assert_eq!(score_price(&request, &negotiable).score, 70.0);

        let unknown = score_price(&request, &paid_listing(None));
        assert_eq!(unknown.score, 50.0);
        assert_eq!(unknown.status, "UNKNOWN");
    }

    #[test]
    fn budget_ceiling_tiers() {
        let mut request = fixtures::request();
        request.max_budget = Some(300.0);

        assert_eq!(score_price(&request, &paid_listing(Some(280.0))).score, 100.0);
        assert_eq!(score_price(&request, &paid_listing(Some(340.0))).score, 70.0);
        assert_eq!(score_price(&request, &paid_listing(Some(500.0))).score, 30.0);
    }

    #[test]
    fn ceiling_takes_precedence_over_tier() {
        let mut request = fixtures::request();
        request.budget_tier = Some(BudgetTier::Under100);
        request.max_budget = Some(300.0);

        assert_eq!(score_price(&request, &paid_listing(Some(250.0))).score, 100.0);
    }

    #[test]
    fn budget_tier_bands() {
        assert_eq!(tier_score(BudgetTier::Under100, 100.0), 100.0);
        assert_eq!(tier_score(BudgetTier::Under100, 115.0), 70.0);
        assert_eq!(tier_score(BudgetTier::Under100, 121.0), 0.0);

        assert_eq!(tier_score(BudgetTier::From100To300, 200.0), 100.0);
        assert_eq!(tier_score(BudgetTier::From100To300, 330.0), 70.0);
        assert_eq!(tier_score(BudgetTier::From100To300, 351.0), 0.0);

        assert_eq!(tier_score(BudgetTier::From300To500, 450.0), 100.0);
        assert_eq!(tier_score(BudgetTier::From300To500, 580.0), 70.0);
        assert_eq!(tier_score(BudgetTier::From300To500, 700.0), 0.0);

        assert_eq!(tier_score(BudgetTier::Over500, 800.0), 100.0);
        assert_eq!(tier_score(BudgetTier::Over500, 450.0), 70.0);
        assert_eq!(tier_score(BudgetTier::Over500, 300.0), 0.0);

        assert_eq!(tier_score(BudgetTier::Free, 10.0), 0.0);
    }

    #[test]
    fn tier_is_used_without_ceiling() {
        let mut request = fixtures::request();
        request.budget_tier = Some(BudgetTier::From100To300);

        let result = score_price(&request, &paid_listing(Some(320.0)));
        assert_eq!(result.score, 70.0);
        assert!(result.details.contains("100_300"));
    }
}
