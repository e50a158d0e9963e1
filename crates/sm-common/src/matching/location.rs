use super::scoring::ScoringResult;
use crate::{Listing, Request, model::GeoPoint};

const EARTH_RADIUS_KM: f64 = 6371.0;

const SAME_CITY_SCORE: f64 = 80.0;
const SAME_SUB_REGION_SCORE: f64 = 100.0;
const OTHER_SUB_REGION_SCORE: f64 = 70.0;

/// 2点間の大圏距離（km）
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.latitude.to_radians().cos() * b.latitude.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

/// 立地スコア
///
/// 都市一致が前提（不一致は0点）。サブ地域の指定があれば一致100/不一致70、
/// 指定がなければ同一都市の80点。起点・最大距離・掲載座標が揃っている場合は
/// 実距離で判定し、範囲内なら100点に引き上げる（地区不一致は引き上げない）。
pub fn score_location(request: &Request, listing: &Listing) -> ScoringResult {
    let regions: Vec<&str> = request
        .target_regions
        .iter()
        .map(|r| r.trim())
        .filter(|r| !r.is_empty())
        .collect();

    if regions.is_empty() {
        return ScoringResult::miss("希望都市が未指定のため評価不可");
    }

    let city = listing.city.trim();
    if !regions.contains(&city) {
        return ScoringResult::miss(format!(
            "都市不一致: listing={} / 希望={}",
            city,
            regions.join(",")
        ));
    }

    let (tier, promotable) = sub_region_tier(request, listing);
    if !promotable {
        return tier;
    }

    if let Some(distance) = within_radius(request, listing) {
        return ScoringResult::new(
            SAME_SUB_REGION_SCORE,
            format!("距離範囲内: {:.1}km ({})", distance, tier.details),
        );
    }

    tier
}

/// 地区の段階スコアと、距離による引き上げ対象かどうか
fn sub_region_tier(request: &Request, listing: &Listing) -> (ScoringResult, bool) {
    let sub_regions: Vec<&str> = request
        .sub_regions
        .iter()
        .map(|r| r.trim())
        .filter(|r| !r.is_empty())
        .collect();

    if sub_regions.is_empty() {
        let tier = ScoringResult::new(
            SAME_CITY_SCORE,
            format!("同一都市: {}", listing.city.trim()),
        );
        return (tier, true);
    }

    match listing.district.as_deref().map(str::trim) {
        Some(district) if sub_regions.contains(&district) => (
            ScoringResult::new(
                SAME_SUB_REGION_SCORE,
                format!("同一都市・同一地区: {}", district),
            ),
            true,
        ),
        district => (
            ScoringResult::new(
                OTHER_SUB_REGION_SCORE,
                format!(
                    "同一都市・地区不一致: listing={} / 希望={}",
                    district.unwrap_or("不明"),
                    sub_regions.join(",")
                ),
            ),
            false,
        ),
    }
}

/// 距離判定が可能で、かつ範囲内の場合のみ距離を返す
fn within_radius(request: &Request, listing: &Listing) -> Option<f64> {
    let max_distance = request.max_distance_km.filter(|d| d.is_finite() && *d > 0.0)?;
    let origin = request.origin?;
    let location = listing.location?;

    let distance = haversine_km(origin, location);
    (distance <= max_distance).then_some(distance)
}
