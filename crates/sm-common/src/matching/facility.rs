use super::scoring::ScoringResult;
use crate::{Listing, Request};

const PARTIAL_MAX: f64 = 80.0;

fn normalize_tags(tags: &[String]) -> Vec<String> {
    tags.iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

/// 部分文字列の包含関係（どちら向きでも可）で一致とみなす
pub fn facility_matches(required: &str, offered: &str) -> bool {
    offered.contains(required) || required.contains(offered)
}

/// 設備スコア
pub fn score_facility(request: &Request, listing: &Listing) -> ScoringResult {
    let required = normalize_tags(&request.required_facilities);
    if required.is_empty() {
        return ScoringResult::new(100.0, "必須設備なし");
    }

    let offered = normalize_tags(&listing.facilities);
    if offered.is_empty() {
        return ScoringResult::miss("掲載側の設備情報なし");
    }

    let (matched, missing): (Vec<&String>, Vec<&String>) = required
        .iter()
        .partition(|req| offered.iter().any(|off| facility_matches(req, off)));

    let score = if missing.is_empty() {
        100.0
    } else {
        matched.len() as f64 / required.len() as f64 * PARTIAL_MAX
    };

    ScoringResult::new(
        score,
        format!(
            "設備{}件中{}件に合致 (不足: {})",
            required.len(),
            matched.len(),
            if missing.is_empty() {
                "なし".to_string()
            } else {
                missing
                    .iter()
                    .map(|s| s.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            }
        ),
    )
}
