use super::scoring::ScoringResult;
use crate::{
    Listing, Request,
    model::{DayKind, TimeWindow},
};

const FULL_CONTAINMENT_SCORE: f64 = 100.0;
const PARTIAL_OVERLAP_MAX: f64 = 80.0;
const NO_WINDOWS_SCORE: f64 = 50.0;
const GAP_TOLERANCE_MINUTES: i64 = 60;

/// 時間帯スコア
pub fn score_time(request: &Request, listing: &Listing) -> ScoringResult {
    let day = request.day_kind();

    // holiday 可の掲載は曜日を問わず利用可能として扱う
    if !listing.offers_day(day) && !listing.offers_day(DayKind::Holiday) {
        return ScoringResult::miss(format!(
            "利用日不可: {} ({})",
            request.use_date,
            day.as_ref()
        ));
    }

    let windows: Vec<&TimeWindow> = listing
        .time_windows
        .iter()
        .filter(|w| w.is_valid())
        .collect();

    if windows.is_empty() {
        return ScoringResult::unknown(NO_WINDOWS_SCORE, "利用日は一致、時間帯の指定なし");
    }

    let requested = &request.use_time;
    let (best, best_window) = windows
        .iter()
        .map(|w| (window_score(requested, w), *w))
        .fold((0.0_f64, None), |(best, best_window), (score, window)| {
            if score > best {
                (score, Some(window))
            } else {
                (best, best_window)
            }
        });

    let details = match best_window {
        Some(w) => format!(
            "希望 {}-{} / 最良枠 {}-{}: {:.1}",
            requested.start.format("%H:%M"),
            requested.end.format("%H:%M"),
            w.start.format("%H:%M"),
            w.end.format("%H:%M"),
            best
        ),
        None => format!(
            "希望 {}-{} に合う枠なし",
            requested.start.format("%H:%M"),
            requested.end.format("%H:%M")
        ),
    };

    ScoringResult::new(best, details)
}

/// 1枠あたりのスコア（分単位の区間演算）
pub fn window_score(requested: &TimeWindow, offered: &TimeWindow) -> f64 {
    let (rs, re) = (requested.start_minute(), requested.end_minute());
    let (os, oe) = (offered.start_minute(), offered.end_minute());

    let duration = re - rs;
    if duration <= 0 {
        return 0.0;
    }

    if rs >= os && re <= oe {
        return FULL_CONTAINMENT_SCORE;
    }

    let overlap = re.min(oe) - rs.max(os);
    if overlap > 0 {
        return overlap as f64 / duration as f64 * PARTIAL_OVERLAP_MAX;
    }

    // 重なりなし: 最も近い端同士の距離
    let gap = if re <= os { os - re } else { rs - oe };
    if gap <= GAP_TOLERANCE_MINUTES {
        (GAP_TOLERANCE_MINUTES - gap).max(0) as f64
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use chrono::NaiveDate;

    fn window(start: &str, end: &str) -> TimeWindow {
        TimeWindow::parse(start, end).unwrap()
    }

    #[test]
    fn full_containment_scores_one_hundred() {
        assert_eq!(
            window_score(&window("10:00", "12:00"), &window("09:00", "18:00")),
            100.0
        );
        assert_eq!(
            window_score(&window("09:00", "18:00"), &window("09:00", "18:00")),
            100.0
        );
    }

    #[test]
    fn partial_overlap_scales_to_eighty() {
        // 60 of 120 minutes overlap
        assert_eq!(
            window_score(&window("10:00", "12:00"), &window("11:00", "18:00")),
            40.0
        );
        // offered window strictly inside the requested one
        assert_eq!(
            window_score(&window("08:00", "12:00"), &window("09:00", "10:00")),
            20.0
        );
    }

    #[test]
    fn small_gap_earns_partial_credit() {
        assert_eq!(
            window_score(&window("10:00", "12:00"), &window("12:30", "18:00")),
            30.0
        );
        assert_eq!(
            window_score(&window("19:00", "20:00"), &window("09:00", "18:20")),
            20.0
        );
        // touching edges have no overlap and zero gap
        assert_eq!(
            window_score(&window("10:00", "12:00"), &window("12:00", "18:00")),
            60.0
        );
    }

    #[test]
    fn large_gap_contributes_nothing() {
        assert_eq!(
            window_score(&window("07:00", "08:00"), &window("09:30", "18:00")),
            0.0
        );
    }

    #[test]
    fn takes_best_window() {
        let mut listing = fixtures::listing();
        listing.time_windows = vec![window("08:00", "10:30"), window("13:00", "18:00")];

        let result = score_time(&fixtures::request(), &listing);
        // 10:00-12:00 vs 08:00-10:30 overlaps 30 of 120 minutes
        assert_eq!(result.score, 20.0);
        assert!(result.details.contains("08:00-10:30"));
    }

    #[test]
    fn unavailable_day_scores_zero() {
        let mut request = fixtures::request();
        request.use_date = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();

        let result = score_time(&request, &fixtures::listing());
        assert_eq!(result.score, 0.0);
        assert!(result.details.contains("weekend"));
    }

    #[test]
    fn holiday_availability_covers_any_day() {
        let mut request = fixtures::request();
        request.use_date = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let mut listing = fixtures::listing();
        listing.available_days = vec![DayKind::Holiday];

        assert_eq!(score_time(&request, &listing).score, 100.0);
    }

    #[test]
    fn no_declared_windows_is_neutral() {
        let mut listing = fixtures::listing();
        listing.time_windows.clear();

        let result = score_time(&fixtures::request(), &listing);
        assert_eq!(result.score, 50.0);
        assert_eq!(result.status, "UNKNOWN");
    }
}
