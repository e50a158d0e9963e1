use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use tracing::{debug, info, instrument, warn};

use super::{
    ranking::{ScoredListing, rank},
    result::MatchResult,
    scoring::ScoringEngine,
};
use crate::{
    Listing, Request,
    config::{ConfigError, MatchingConfig},
    store::{ListingFilter, ListingSource, RequestSource, ResultStore, StoreError},
};

#[derive(Debug, thiserror::Error)]
pub enum MatchingError {
    #[error("request {0} not found")]
    NotFound(i64),
    #[error("request {id} cannot be matched: {reason}")]
    InvalidRequest { id: i64, reason: String },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// バッチ実行の結果。失敗はリクエスト単位で保持し、他のリクエストは継続する。
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub results: BTreeMap<i64, Vec<MatchResult>>,
    pub failures: BTreeMap<i64, MatchingError>,
    /// スコア計算は成功したが保存に失敗したリクエスト
    pub persist_failures: BTreeMap<i64, StoreError>,
}

/// 保存に失敗しても計算済みのランキングは返す
#[derive(Debug)]
pub struct PersistedMatch {
    pub results: Vec<MatchResult>,
    pub persist_error: Option<StoreError>,
}

pub struct MatchingService<S> {
    store: S,
    config: MatchingConfig,
}

impl<S> MatchingService<S> {
    /// 設定を検証してからサービスを構築する
    pub fn new(store: S, config: MatchingConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { store, config })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    /// 取得済みの候補をスコアリングして上位 top_n 件を返す
    pub fn rank_listings(&self, request: &Request, listings: &[Listing]) -> Vec<MatchResult> {
        self.rank_listings_at(request, listings, Utc::now())
    }

    pub fn rank_listings_at(
        &self,
        request: &Request,
        listings: &[Listing],
        now: DateTime<Utc>,
    ) -> Vec<MatchResult> {
        let engine = ScoringEngine::new(&self.config);

        let scored: Vec<ScoredListing<'_>> = listings
            .iter()
            .filter(|listing| {
                if !listing.is_candidate() {
                    return false;
                }
                match listing.check_invariants() {
                    Ok(()) => {
                        if listing.is_missing_price() {
                            debug!(
                                listing_id = listing.id,
                                "listing has no price, price scored as unknown"
                            );
                        }
                        true
                    }
                    Err(reason) => {
                        warn!(listing_id = listing.id, %reason, "skipping listing with invalid data");
                        false
                    }
                }
            })
            .map(|listing| {
                let score = engine.calculate_match_score(request, listing);
                debug!(
                    request_id = request.id,
                    listing_id = listing.id,
                    total = score.total,
                    location = %score.location.details,
                    time = %score.time.details,
                    category = %score.category.details,
                    capacity = %score.capacity.details,
                    price = %score.price.details,
                    facility = %score.facility.details,
                    "scored listing"
                );
                ScoredListing { listing, score }
            })
            .collect();

        let evaluated = scored.len();
        let ranked = rank(scored, self.config.top_n);

        info!(
            request_id = request.id,
            candidates = listings.len(),
            evaluated,
            returned = ranked.len(),
            "ranked listings"
        );

        ranked
            .iter()
            .map(|s| MatchResult::recommended(request.id, s, now))
            .collect()
    }
}

impl<S> MatchingService<S>
where
    S: RequestSource + ListingSource + ResultStore,
{
    /// リクエスト取得 → 候補取得（公開中 + 第一希望都市） → スコアリング → ランキング
    #[instrument(skip(self))]
    pub async fn match_request(&self, request_id: i64) -> Result<Vec<MatchResult>, MatchingError> {
        let request = self
            .store
            .get_request(request_id)
            .await?
            .ok_or(MatchingError::NotFound(request_id))?;

        request
            .validate_for_matching()
            .map_err(|reason| MatchingError::InvalidRequest {
                id: request_id,
                reason,
            })?;

        let filter = ListingFilter::for_request(&request);
        let listings = self.store.query_listings(&filter).await?;

        Ok(self.rank_listings(&request, &listings))
    }

    /// 重複IDは1回だけ評価し、最大 batch_concurrency 件を並行に処理する
    #[instrument(skip(self, request_ids), fields(requested = request_ids.len()))]
    pub async fn batch_match(&self, request_ids: &[i64]) -> BatchOutcome {
        self.run_batch(request_ids, false).await
    }

    #[instrument(skip(self, results), fields(count = results.len()))]
    pub async fn persist(&self, results: &[MatchResult]) -> Result<u64, StoreError> {
        if results.is_empty() {
            return Ok(0);
        }
        self.store.upsert_results(results).await
    }

    /// 保存の失敗はランキングを無効にしない
    #[instrument(skip(self))]
    pub async fn match_and_persist(&self, request_id: i64) -> Result<PersistedMatch, MatchingError> {
        let results = self.match_request(request_id).await?;
        let persist_error = match self.persist(&results).await {
            Ok(_) => None,
            Err(err) => {
                warn!(request_id, error = %err, "failed to persist match results");
                Some(err)
            }
        };

        Ok(PersistedMatch {
            results,
            persist_error,
        })
    }

    #[instrument(skip(self, request_ids), fields(requested = request_ids.len()))]
    pub async fn batch_match_and_persist(&self, request_ids: &[i64]) -> BatchOutcome {
        self.run_batch(request_ids, true).await
    }

    async fn run_batch(&self, request_ids: &[i64], persist: bool) -> BatchOutcome {
        let unique: BTreeSet<i64> = request_ids.iter().copied().collect();

        let runs: Vec<(i64, Result<PersistedMatch, MatchingError>)> = stream::iter(unique)
            .map(|request_id| async move {
                let run = if persist {
                    self.match_and_persist(request_id).await
                } else {
                    self.match_request(request_id)
                        .await
                        .map(|results| PersistedMatch {
                            results,
                            persist_error: None,
                        })
                };
                (request_id, run)
            })
            .buffer_unordered(self.config.batch_concurrency)
            .collect()
            .await;

        let mut outcome = BatchOutcome::default();
        for (request_id, run) in runs {
            match run {
                Ok(PersistedMatch {
                    results,
                    persist_error,
                }) => {
                    if let Some(err) = persist_error {
                        outcome.persist_failures.insert(request_id, err);
                    }
                    outcome.results.insert(request_id, results);
                }
                Err(err) => {
                    warn!(request_id, error = %err, "batch match failed for request");
                    outcome.failures.insert(request_id, err);
                }
            }
        }

        info!(
            succeeded = outcome.results.len(),
            failed = outcome.failures.len(),
            persist_failed = outcome.persist_failures.len(),
            "batch match finished"
        );

        outcome
    }
}
