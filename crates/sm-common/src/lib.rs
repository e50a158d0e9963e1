pub mod config;
pub mod db;
pub mod logging;
pub mod matching;
pub mod memory;
pub mod model;
pub mod store;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use model::{
    BudgetTier, Category, DayKind, GeoPoint, ListingStatus, PriceModel, RequestStatus, TimeWindow,
    Urgency,
};

// Commonly used data models for matching functions.

/// 利用リクエスト（借りたい側の掲示）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub id: i64,
    pub title: String,
    pub category: Category,
    /// 希望都市（先頭が第一希望）
    pub target_regions: Vec<String>,
    #[serde(default)]
    pub sub_regions: Vec<String>,
    pub max_distance_km: Option<f64>,
    /// max_distance_km の起点
    pub origin: Option<GeoPoint>,
    pub use_date: NaiveDate,
    pub use_time: TimeWindow,
    pub duration_hours: Option<f64>,
    pub expected_occupants: u32,
    #[serde(default)]
    pub required_facilities: Vec<String>,
    pub preferences: Option<String>,
    pub budget_tier: Option<BudgetTier>,
    pub max_budget: Option<f64>,
    #[serde(default)]
    pub urgency: Urgency,
    pub status: RequestStatus,
}

impl Request {
    pub fn primary_region(&self) -> Option<&str> {
        self.target_regions.first().map(String::as_str)
    }

    /// 利用日の曜日区分（祝日判定はしない）
    pub fn day_kind(&self) -> DayKind {
        match self.use_date.weekday() {
            Weekday::Sat | Weekday::Sun => DayKind::Weekend,
            _ => DayKind::Weekday,
        }
    }

    pub fn has_budget_constraint(&self) -> bool {
        self.budget_tier.is_some() || self.max_budget.is_some()
    }

    /// マッチング入力としての不変条件を検証する
    pub fn validate_for_matching(&self) -> Result<(), String> {
        if !self.status.is_matchable() {
            return Err(format!(
                "status {} is not published/matching",
                self.status.as_ref()
            ));
        }
        if self.target_regions.iter().all(|r| r.trim().is_empty()) {
            return Err("target regions are empty".into());
        }
        if !self.use_time.is_valid() {
            return Err(format!(
                "use time window is inverted: {} >= {}",
                self.use_time.start, self.use_time.end
            ));
        }
        if self.expected_occupants == 0 {
            return Err("expected occupants must be positive".into());
        }
        Ok(())
    }
}

/// 掲載スペース（貸したい側）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: i64,
    pub name: String,
    pub category: Category,
    pub city: String,
    pub district: Option<String>,
    pub street: Option<String>,
    pub location: Option<GeoPoint>,
    pub capacity: u32,
    #[serde(default)]
    pub facilities: Vec<String>,
    #[serde(default)]
    pub available_days: Vec<DayKind>,
    #[serde(default)]
    pub time_windows: Vec<TimeWindow>,
    pub price_model: PriceModel,
    pub price: Option<f64>,
    pub is_verified: bool,
    pub average_rating: f64,
    pub rating_count: u32,
    pub status: ListingStatus,
    pub is_available: bool,
}

impl Listing {
    /// 公開中かつ受付中の掲載のみ候補になる
    pub fn is_candidate(&self) -> bool {
        self.status == ListingStatus::Released && self.is_available
    }

    pub fn offers_day(&self, day: DayKind) -> bool {
        self.available_days.contains(&day)
    }

    /// 採点できない掲載を弾く。有料モデルの価格未設定は価格スコア側で中立扱いにする
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.capacity == 0 {
            return Err("capacity must be at least 1".into());
        }
        match self.price {
            Some(price) if !price.is_finite() || price < 0.0 => {
                Err(format!("price must be non-negative: {price}"))
            }
            _ => Ok(()),
        }
    }

    /// 有料モデルなのに価格が入っていない
    pub fn is_missing_price(&self) -> bool {
        self.price.is_none() && self.price_model.requires_price()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn request() -> Request {
        Request {
            id: 1,
            title: "チーム定例".into(),
            category: Category::MeetingRoom,
            target_regions: vec!["Shanghai".into()],
            sub_regions: vec![],
            max_distance_km: None,
            origin: None,
            // 2024-03-06 is a Wednesday
            use_date: NaiveDate::from_ymd_opt(2024, 3, 6).unwrap(),
            use_time: TimeWindow::parse("10:00", "12:00").unwrap(),
            duration_hours: Some(2.0),
            expected_occupants: 8,
            required_facilities: vec![],
            preferences: None,
            budget_tier: None,
            max_budget: None,
            urgency: Urgency::Normal,
            status: RequestStatus::Published,
        }
    }

    pub fn listing() -> Listing {
        Listing {
            id: 100,
            name: "Room A".into(),
            category: Category::MeetingRoom,
            city: "Shanghai".into(),
            district: Some("Pudong".into()),
            street: None,
            location: None,
            capacity: 8,
            facilities: vec![],
            available_days: vec![DayKind::Weekday],
            time_windows: vec![TimeWindow::parse("09:00", "18:00").unwrap()],
            price_model: PriceModel::Free,
            price: None,
            is_verified: false,
            average_rating: 0.0,
            rating_count: 0,
            status: ListingStatus::Released,
            is_available: true,
        }
    }
}
