use std::collections::BTreeMap;

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use sm_common::matching::{BatchOutcome, MatchResult};
use tracing::info;

use crate::SharedState;
use crate::error::ApiError;

pub const MAX_BATCH_REQUESTS: usize = 100;

#[derive(Debug, Deserialize, Default)]
pub struct MatchQuery {
    #[serde(default)]
    pub persist: bool,
}

#[derive(Debug, Serialize)]
pub struct MatchListResponse {
    pub request_id: i64,
    pub results: Vec<MatchResult>,
    pub persisted: bool,
    /// 保存に失敗した場合のエラーコード（ランキング自体は有効）
    pub persist_error: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
pub struct BatchMatchRequest {
    pub request_ids: Vec<i64>,
    #[serde(default)]
    pub persist: bool,
}

#[derive(Debug, Serialize)]
pub struct BatchFailure {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct BatchMatchResponse {
    pub results: BTreeMap<i64, Vec<MatchResult>>,
    pub failures: BTreeMap<i64, BatchFailure>,
    pub persist_failures: BTreeMap<i64, BatchFailure>,
}

impl From<BatchOutcome> for BatchMatchResponse {
    fn from(outcome: BatchOutcome) -> Self {
        let failures = outcome
            .failures
            .into_iter()
            .map(|(id, err)| (id, BatchFailure::from(ApiError::from(err))))
            .collect();
        let persist_failures = outcome
            .persist_failures
            .into_iter()
            .map(|(id, err)| (id, BatchFailure::from(ApiError::from(err))))
            .collect();

        Self {
            results: outcome.results,
            failures,
            persist_failures,
        }
    }
}

impl From<ApiError> for BatchFailure {
    fn from(err: ApiError) -> Self {
        Self {
            code: err.code(),
            message: err.public_message().into_owned(),
        }
    }
}

pub async fn match_request(
    State(state): State<SharedState>,
    Path(request_id): Path<i64>,
    Query(query): Query<MatchQuery>,
) -> Result<Json<MatchListResponse>, ApiError> {
    if !query.persist {
        let results = state.service.match_request(request_id).await?;
        return Ok(Json(MatchListResponse {
            request_id,
            results,
            persisted: false,
            persist_error: None,
        }));
    }

    let persisted = state.service.match_and_persist(request_id).await?;
    let persist_error = persisted
        .persist_error
        .map(|err| ApiError::from(err).code());

    Ok(Json(MatchListResponse {
        request_id,
        results: persisted.results,
        persisted: persist_error.is_none(),
        persist_error,
    }))
}

/// 空・上限超過のバッチは DB に触れる前に 400 を返す
pub fn validate_batch(request: &BatchMatchRequest) -> Result<(), ApiError> {
    if request.request_ids.is_empty() {
        return Err(ApiError::BadRequest("request_ids must not be empty".into()));
    }
    if request.request_ids.len() > MAX_BATCH_REQUESTS {
        return Err(ApiError::BadRequest(format!(
            "request_ids accepts at most {MAX_BATCH_REQUESTS} ids"
        )));
    }
    Ok(())
}

pub async fn batch_match(
    State(state): State<SharedState>,
    Json(request): Json<BatchMatchRequest>,
) -> Result<Json<BatchMatchResponse>, ApiError> {
    validate_batch(&request)?;

    let outcome = if request.persist {
        state
            .service
            .batch_match_and_persist(&request.request_ids)
            .await
    } else {
        state.service.batch_match(&request.request_ids).await
    };

    info!(
        requested = request.request_ids.len(),
        succeeded = outcome.results.len(),
        failed = outcome.failures.len(),
        persist = request.persist,
        "batch match request served"
    );

    Ok(Json(BatchMatchResponse::from(outcome)))
}
