use super::scoring::ScoringResult;
use crate::{Listing, Request};

/// 収容人数スコア（ratio = capacity / expected_occupants）
///
/// 境界は整数演算で比較する（1.5倍・0.8倍・0.6倍）。
pub fn score_capacity(request: &Request, listing: &Listing) -> ScoringResult {
    let required = u64::from(request.expected_occupants.max(1));
    let available = u64::from(listing.capacity);
    let ratio = available as f64 / required as f64;

    let (score, label) = if available == required {
        (100.0, "ぴったり")
    } else if available > required {
        if available * 2 <= required * 3 {
            (90.0, "余裕あり")
        } else {
            (80.0, "広すぎ")
        }
    } else if available * 5 >= required * 4 {
        (60.0, "やや不足")
    } else if available * 5 >= required * 3 {
        (40.0, "不足")
    } else {
        (0.0, "利用不可")
    };

    ScoringResult::new(
        score,
        format!(
            "収容{}: {}人 / 希望{}人 (ratio={:.2})",
            label, available, required, ratio
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    fn score_for(occupants: u32, capacity: u32) -> f64 {
        let mut request = fixtures::request();
        request.expected_occupants = occupants;
        let mut listing = fixtures::listing();
        listing.capacity = capacity;
        score_capacity(&request, &listing).score
    }

    #[test]
    fn tiers_follow_ratio_boundaries() {
        assert_eq!(score_for(10, 10), 100.0);
        assert_eq!(score_for(10, 15), 90.0);
        assert_eq!(score_for(10, 16), 80.0);
        assert_eq!(score_for(10, 9), 60.0);
        assert_eq!(score_for(10, 8), 60.0);
        assert_eq!(score_for(10, 7), 40.0);
        assert_eq!(score_for(10, 6), 40.0);
        assert_eq!(score_for(10, 5), 0.0);
    }

    #[test]
    fn far_too_small_room_is_unusable() {
        assert_eq!(score_for(10, 4), 0.0);
    }

    #[test]
    fn growing_toward_requested_size_never_decreases() {
        let scores: Vec<f64> = (1..=12).map(|capacity| score_for(12, capacity)).collect();
        assert!(scores.windows(2).all(|w| w[0] <= w[1]), "{scores:?}");
        assert_eq!(*scores.last().unwrap(), 100.0);
    }
}
