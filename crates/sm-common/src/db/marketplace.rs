use crate::{
    Listing, Request,
    db::{PgPool, fetch_request, query_listings, upsert_match_results},
    matching::MatchResult,
    store::{ListingFilter, ListingSource, RequestSource, ResultStore, StoreError},
};

/// Postgres 上の共有オフィステーブルを読み書きする
#[derive(Clone)]
pub struct PgMarketplace {
    pool: PgPool,
}

impl PgMarketplace {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl RequestSource for PgMarketplace {
    async fn get_request(&self, id: i64) -> Result<Option<Request>, StoreError> {
        fetch_request(&self.pool, id).await
    }
}

impl ListingSource for PgMarketplace {
    async fn query_listings(&self, filter: &ListingFilter) -> Result<Vec<Listing>, StoreError> {
        query_listings(&self.pool, filter).await
    }
}

impl ResultStore for PgMarketplace {
    async fn upsert_results(&self, results: &[MatchResult]) -> Result<u64, StoreError> {
        upsert_match_results(&self.pool, results).await
    }
}
