#![allow(async_fn_in_trait)]

use deadpool_postgres::PoolError;
use tokio_postgres::Error as PgError;

use crate::{Listing, Request, matching::MatchResult, model::ListingStatus};

/// 候補取得件数の上限（既定）
pub const DEFAULT_LISTING_LIMIT: i64 = 1000;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] PoolError),
    #[error("postgres error: {0}")]
    Postgres(#[from] PgError),
    #[error("failed to map row: {0}")]
    Mapping(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// 候補掲載の絞り込み条件（少なくとも status は必ず効く）
#[derive(Debug, Clone, PartialEq)]
pub struct ListingFilter {
    pub status: ListingStatus,
    pub city: Option<String>,
    pub limit: i64,
}

impl Default for ListingFilter {
    fn default() -> Self {
        Self {
            status: ListingStatus::Released,
            city: None,
            limit: DEFAULT_LISTING_LIMIT,
        }
    }
}

impl ListingFilter {
    /// 公開中 + 第一希望都市で絞り込む
    pub fn for_request(request: &Request) -> Self {
        Self {
            city: request
                .primary_region()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string),
            ..Self::default()
        }
    }

    pub fn matches(&self, listing: &Listing) -> bool {
        listing.status == self.status
            && listing.is_available
            && self
                .city
                .as_deref()
                .is_none_or(|city| listing.city.trim() == city)
    }
}

pub trait RequestSource {
    async fn get_request(&self, id: i64) -> Result<Option<Request>, StoreError>;
}

pub trait ListingSource {
    async fn query_listings(&self, filter: &ListingFilter) -> Result<Vec<Listing>, StoreError>;
}

pub trait ResultStore {
    /// (listing_id, request_id) をキーに upsert する。書き込んだ行数を返す。
    async fn upsert_results(&self, results: &[MatchResult]) -> Result<u64, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn filter_for_request_uses_primary_city() {
        let mut request = fixtures::request();
        request.target_regions = vec![" Shanghai ".into(), "Suzhou".into()];

        let filter = ListingFilter::for_request(&request);
        assert_eq!(filter.status, ListingStatus::Released);
        assert_eq!(filter.city.as_deref(), Some("Shanghai"));
        assert_eq!(filter.limit, DEFAULT_LISTING_LIMIT);
    }

    #[test]
    fn filter_matches_released_available_in_city() {
        let filter = ListingFilter::for_request(&fixtures::request());
        let mut listing = fixtures::listing();
        assert!(filter.matches(&listing));

        listing.city = "Beijing".into();
        assert!(!filter.matches(&listing));

        listing.city = "Shanghai".into();
        listing.is_available = false;
        assert!(!filter.matches(&listing));

        let any_city = ListingFilter::default();
        listing.is_available = true;
        listing.city = "Beijing".into();
        assert!(any_city.matches(&listing));
    }
}
