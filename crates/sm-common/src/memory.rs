use std::{
    collections::HashMap,
    sync::{
        Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use crate::{
    Listing, Request,
    matching::MatchResult,
    store::{ListingFilter, ListingSource, RequestSource, ResultStore, StoreError},
};

/// テスト・ローカル実行用のインメモリ実装
#[derive(Debug, Default)]
pub struct InMemoryMarketplace {
    requests: HashMap<i64, Request>,
    listings: Vec<Listing>,
    results: Mutex<HashMap<(i64, i64), MatchResult>>,
    fail_upserts: AtomicBool,
}

impl InMemoryMarketplace {
    pub fn new(requests: Vec<Request>, listings: Vec<Listing>) -> Self {
        Self {
            requests: requests.into_iter().map(|r| (r.id, r)).collect(),
            listings,
            ..Self::default()
        }
    }

    pub fn insert_request(&mut self, request: Request) {
        self.requests.insert(request.id, request);
    }

    pub fn push_listing(&mut self, listing: Listing) {
        self.listings.push(listing);
    }

    /// 以降の upsert を失敗させる
    pub fn set_fail_upserts(&self, fail: bool) {
        self.fail_upserts.store(fail, Ordering::SeqCst);
    }

    /// 保存済みの結果を (request_id, listing_id) 順で返す
    pub fn stored_results(&self) -> Vec<MatchResult> {
        let guard = match self.results.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let mut results: Vec<MatchResult> = guard.values().cloned().collect();
        results.sort_by_key(|r| (r.request_id, r.listing_id));
        results
    }
}

impl RequestSource for InMemoryMarketplace {
    async fn get_request(&self, id: i64) -> Result<Option<Request>, StoreError> {
        Ok(self.requests.get(&id).cloned())
    }
}

impl ListingSource for InMemoryMarketplace {
    async fn query_listings(&self, filter: &ListingFilter) -> Result<Vec<Listing>, StoreError> {
        let limit = usize::try_from(filter.limit).unwrap_or(0);
        let mut listings: Vec<Listing> = self
            .listings
            .iter()
            .filter(|l| filter.matches(l))
            .cloned()
            .collect();
        listings.sort_by_key(|l| l.id);
        listings.truncate(limit);
        Ok(listings)
    }
}

impl ResultStore for InMemoryMarketplace {
    async fn upsert_results(&self, results: &[MatchResult]) -> Result<u64, StoreError> {
        if self.fail_upserts.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("upserts disabled".into()));
        }

        let mut guard = self
            .results
            .lock()
            .map_err(|_| StoreError::Unavailable("result store lock poisoned".into()))?;

        for result in results {
            guard
                .entry(result.key())
                .and_modify(|existing| {
                    // ユーザー操作の状態は保持し、スコアのみ更新する
                    existing.total_score = result.total_score;
                    existing.breakdown = result.breakdown;
                    existing.auto_recommended = result.auto_recommended;
                })
                .or_insert_with(|| result.clone());
        }

        Ok(results.len() as u64)
    }
}
