use chrono::NaiveDate;
use serde_json::Value;
use tokio_postgres::Row;
use tracing::instrument;

use crate::{
    Request,
    db::{
        PgPool,
        util::{TimedClientExt, non_negative_u32, parse_enum, parse_optional_enum, parse_string_array},
    },
    model::{GeoPoint, TimeWindow, clock},
    store::StoreError,
};

const SELECT_REQUEST: &str = "SELECT \
        id::int8 AS id,\
        title,\
        request_type,\
        to_jsonb(target_cities) AS target_cities,\
        to_jsonb(target_districts) AS target_districts,\
        max_distance::float8 AS max_distance,\
        origin_latitude::float8 AS origin_latitude,\
        origin_longitude::float8 AS origin_longitude,\
        use_date::date AS use_date,\
        use_time_start::text AS use_time_start,\
        use_time_end::text AS use_time_end,\
        duration_hours::float8 AS duration_hours,\
        expected_capacity::int8 AS expected_capacity,\
        to_jsonb(required_facilities) AS required_facilities,\
        preferences,\
        budget_range,\
        max_budget::float8 AS max_budget,\
        urgency,\
        status\
    FROM shared_office_requests\
    WHERE id = $1";

/// shared_office_requests の1行（DB表現のまま）
#[derive(Debug, Clone)]
pub struct RequestRow {
    pub id: i64,
    pub title: String,
    pub request_type: String,
    pub target_cities: Option<Value>,
    pub target_districts: Option<Value>,
    pub max_distance: Option<f64>,
    pub origin_latitude: Option<f64>,
    pub origin_longitude: Option<f64>,
    pub use_date: NaiveDate,
    pub use_time_start: String,
    pub use_time_end: String,
    pub duration_hours: Option<f64>,
    pub expected_capacity: i64,
    pub required_facilities: Option<Value>,
    pub preferences: Option<String>,
    pub budget_range: Option<String>,
    pub max_budget: Option<f64>,
    pub urgency: Option<String>,
    pub status: String,
}

impl RequestRow {
    fn from_row(row: &Row) -> Result<Self, tokio_postgres::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            title: row.try_get::<_, Option<String>>("title")?.unwrap_or_default(),
            request_type: row.try_get("request_type")?,
            target_cities: row.try_get("target_cities")?,
            target_districts: row.try_get("target_districts")?,
            max_distance: row.try_get("max_distance")?,
            origin_latitude: row.try_get("origin_latitude")?,
            origin_longitude: row.try_get("origin_longitude")?,
            use_date: row.try_get("use_date")?,
            use_time_start: row.try_get("use_time_start")?,
            use_time_end: row.try_get("use_time_end")?,
            duration_hours: row.try_get("duration_hours")?,
            expected_capacity: row.try_get("expected_capacity")?,
            required_facilities: row.try_get("required_facilities")?,
            preferences: row.try_get("preferences")?,
            budget_range: row.try_get("budget_range")?,
            max_budget: row.try_get("max_budget")?,
            urgency: row.try_get("urgency")?,
            status: row.try_get("status")?,
        })
    }
}

impl TryFrom<RequestRow> for Request {
    type Error = StoreError;

    fn try_from(row: RequestRow) -> Result<Self, Self::Error> {
        let start = clock::parse(&row.use_time_start).ok_or_else(|| {
            StoreError::Mapping(format!("invalid use_time_start: {:?}", row.use_time_start))
        })?;
        let end = clock::parse(&row.use_time_end).ok_or_else(|| {
            StoreError::Mapping(format!("invalid use_time_end: {:?}", row.use_time_end))
        })?;

        let origin = match (row.origin_latitude, row.origin_longitude) {
            (Some(latitude), Some(longitude)) => Some(GeoPoint {
                latitude,
                longitude,
            }),
            _ => None,
        };

        Ok(Request {
            id: row.id,
            title: row.title,
            category: parse_enum("request_type", &row.request_type)?,
            target_regions: parse_string_array(row.target_cities),
            sub_regions: parse_string_array(row.target_districts),
            max_distance_km: row.max_distance,
            origin,
            use_date: row.use_date,
            use_time: TimeWindow::new(start, end),
            duration_hours: row.duration_hours,
            expected_occupants: non_negative_u32("expected_capacity", row.expected_capacity)?,
            required_facilities: parse_string_array(row.required_facilities),
            preferences: row.preferences,
            budget_tier: parse_optional_enum("budget_range", row.budget_range.as_deref())?,
            max_budget: row.max_budget,
            urgency: parse_optional_enum("urgency", row.urgency.as_deref())?.unwrap_or_default(),
            status: parse_enum("status", &row.status)?,
        })
    }
}

#[instrument(skip(pool))]
pub async fn fetch_request(pool: &PgPool, request_id: i64) -> Result<Option<Request>, StoreError> {
    let client = pool.get().await?;
    let stmt = client.prepare_cached(SELECT_REQUEST).await?;

    let Some(row) = client
        .timed_query_opt(&stmt, &[&request_id], "fetch_request")
        .await?
    else {
        return Ok(None);
    };

    let row = RequestRow::from_row(&row)?;
    Request::try_from(row).map(Some)
}
