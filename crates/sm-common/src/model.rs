use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumIter, EnumString};

/// スペース種別（リクエスト/掲載で共通）
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Category {
    Office,
    MeetingRoom,
    ConferenceRoom,
    SharedDesk,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ListingStatus {
    Draft,
    Pending,
    /// 公開中：マッチング対象になる唯一の状態
    Released,
    Suspended,
    Deleted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RequestStatus {
    Draft,
    Published,
    Matching,
    Booked,
    Completed,
    Cancelled,
}

impl RequestStatus {
    pub fn is_matchable(&self) -> bool {
        matches!(self, RequestStatus::Published | RequestStatus::Matching)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PriceModel {
    Free,
    Hourly,
    Daily,
    PerUse,
    Negotiable,
}

impl PriceModel {
    /// free / negotiable 以外は価格が必須
    pub fn requires_price(&self) -> bool {
        !matches!(self, PriceModel::Free | PriceModel::Negotiable)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
pub enum BudgetTier {
    #[serde(rename = "free")]
    #[strum(serialize = "free")]
    Free,
    #[serde(rename = "under_100")]
    #[strum(serialize = "under_100")]
    Under100,
    #[serde(rename = "100_300")]
    #[strum(serialize = "100_300")]
    From100To300,
    #[serde(rename = "300_500")]
    #[strum(serialize = "300_500")]
    From300To500,
    #[serde(rename = "over_500")]
    #[strum(serialize = "over_500")]
    Over500,
    #[serde(rename = "negotiable")]
    #[strum(serialize = "negotiable")]
    Negotiable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Urgency {
    #[default]
    Normal,
    Urgent,
    Emergency,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DayKind {
    Weekday,
    Weekend,
    Holiday,
}

/// 推薦結果のユーザー側ステータス（エンジンが書き込むのは `Recommended` のみ）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MatchStatus {
    #[default]
    Recommended,
    Viewed,
    Applied,
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// Time-of-day window. Serialized as `"HH:MM"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    #[serde(with = "clock")]
    pub start: NaiveTime,
    #[serde(with = "clock")]
    pub end: NaiveTime,
}

impl TimeWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// `"09:00"` / `"09:00:00"` 形式から生成する
    pub fn parse(start: &str, end: &str) -> Option<Self> {
        Some(Self {
            start: clock::parse(start)?,
            end: clock::parse(end)?,
        })
    }

    pub fn start_minute(&self) -> i64 {
        minute_of_day(self.start)
    }

    pub fn end_minute(&self) -> i64 {
        minute_of_day(self.end)
    }

    pub fn duration_minutes(&self) -> i64 {
        self.end_minute() - self.start_minute()
    }

    pub fn is_valid(&self) -> bool {
        self.start < self.end
    }
}

pub fn minute_of_day(time: NaiveTime) -> i64 {
    (time.num_seconds_from_midnight() / 60) as i64
}

pub mod clock {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn parse(raw: &str) -> Option<NaiveTime> {
        let raw = raw.trim();
        NaiveTime::parse_from_str(raw, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
            .ok()
    }

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| D::Error::custom(format!("invalid time of day: {raw}")))
    }
}
