use serde_json::Value;
use tokio_postgres::{Row, types::ToSql};
use tracing::{instrument, warn};

use crate::{
    Listing,
    db::{
        PgPool,
        util::{
            TimedClientExt, non_negative_u32, parse_enum, parse_string_array, parse_time_windows,
        },
    },
    model::{DayKind, GeoPoint},
    store::{ListingFilter, StoreError},
};

const SELECT_LISTINGS: &str = "SELECT \
        id::int8 AS id,\
        name,\
        space_type,\
        city,\
        district,\
        street,\
        latitude::float8 AS latitude,\
        longitude::float8 AS longitude,\
        capacity::int8 AS capacity,\
        to_jsonb(facilities) AS facilities,\
        to_jsonb(available_days) AS available_days,\
        to_jsonb(available_time_slots) AS available_time_slots,\
        pricing_model,\
        price::float8 AS price,\
        COALESCE(is_verified, false) AS is_verified,\
        COALESCE(average_rating, 0)::float8 AS average_rating,\
        COALESCE(rating_count, 0)::int8 AS rating_count,\
        status,\
        COALESCE(is_available, false) AS is_available\
    FROM shared_office_spaces";

/// shared_office_spaces の1行（DB表現のまま）
#[derive(Debug, Clone)]
pub struct ListingRow {
    pub id: i64,
    pub name: Option<String>,
    pub space_type: String,
    pub city: String,
    pub district: Option<String>,
    pub street: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub capacity: i64,
    pub facilities: Option<Value>,
    pub available_days: Option<Value>,
    pub available_time_slots: Option<Value>,
    pub pricing_model: String,
    pub price: Option<f64>,
    pub is_verified: bool,
    pub average_rating: f64,
    pub rating_count: i64,
    pub status: String,
    pub is_available: bool,
}

impl ListingRow {
    fn from_row(row: &Row) -> Result<Self, tokio_postgres::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            space_type: row.try_get("space_type")?,
            city: row.try_get("city")?,
            district: row.try_get("district")?,
            street: row.try_get("street")?,
            latitude: row.try_get("latitude")?,
            longitude: row.try_get("longitude")?,
            capacity: row.try_get("capacity")?,
            facilities: row.try_get("facilities")?,
            available_days: row.try_get("available_days")?,
            available_time_slots: row.try_get("available_time_slots")?,
            pricing_model: row.try_get("pricing_model")?,
            price: row.try_get("price")?,
            is_verified: row.try_get("is_verified")?,
            average_rating: row.try_get("average_rating")?,
            rating_count: row.try_get("rating_count")?,
            status: row.try_get("status")?,
            is_available: row.try_get("is_available")?,
        })
    }
}

impl TryFrom<ListingRow> for Listing {
    type Error = StoreError;

    fn try_from(row: ListingRow) -> Result<Self, Self::Error> {
        let location = match (row.latitude, row.longitude) {
            (Some(latitude), Some(longitude)) => Some(GeoPoint {
                latitude,
                longitude,
            }),
            _ => None,
        };

        // 未知の曜日区分は無視する
        let available_days = parse_string_array(row.available_days)
            .iter()
            .filter_map(|raw| parse_enum::<DayKind>("available_days", raw).ok())
            .collect();

        Ok(Listing {
            id: row.id,
            name: row.name.unwrap_or_default(),
            category: parse_enum("space_type", &row.space_type)?,
            city: row.city,
            district: row.district,
            street: row.street,
            location,
            capacity: non_negative_u32("capacity", row.capacity)?,
            facilities: parse_string_array(row.facilities),
            available_days,
            time_windows: parse_time_windows(row.available_time_slots),
            price_model: parse_enum("pricing_model", &row.pricing_model)?,
            price: row.price,
            is_verified: row.is_verified,
            average_rating: row.average_rating,
            rating_count: non_negative_u32("rating_count", row.rating_count)?,
            status: parse_enum("status", &row.status)?,
            is_available: row.is_available,
        })
    }
}

/// WHERE 句とパラメータを組み立てる（status と is_available は常に効く）
fn build_query(filter: &ListingFilter) -> (String, Vec<Box<dyn ToSql + Sync + Send>>) {
    let mut conditions = vec!["status = $1".to_string(), "is_available = true".to_string()];
    let mut params: Vec<Box<dyn ToSql + Sync + Send>> =
        vec![Box::new(filter.status.as_ref().to_string())];

    if let Some(city) = &filter.city {
        params.push(Box::new(city.clone()));
        conditions.push(format!("city = ${}", params.len()));
    }

    params.push(Box::new(filter.limit.max(0)));
    let query = format!(
        "{SELECT_LISTINGS} WHERE {} ORDER BY id LIMIT ${}",
        conditions.join(" AND "),
        params.len()
    );

    (query, params)
}

/// 条件に合う掲載を取得する。変換できない行は warn を出して読み飛ばす。
#[instrument(skip(pool))]
pub async fn query_listings(pool: &PgPool, filter: &ListingFilter) -> Result<Vec<Listing>, StoreError> {
    let client = pool.get().await?;
    let (query, params) = build_query(filter);
    let param_refs: Vec<&(dyn ToSql + Sync)> = params
        .iter()
        .map(|p| p.as_ref() as &(dyn ToSql + Sync))
        .collect();

    let rows = client
        .timed_query(query.as_str(), &param_refs, "query_listings")
        .await?;

    let mut listings = Vec::with_capacity(rows.len());
    for row in &rows {
        let mapped = ListingRow::from_row(row)
            .map_err(StoreError::from)
            .and_then(Listing::try_from);
        match mapped {
            Ok(listing) => listings.push(listing),
            Err(err) => warn!(error = %err, "skipping unreadable listing row"),
        }
    }

    Ok(listings)
}
