#![allow(async_fn_in_trait)]

use std::{str::FromStr, sync::OnceLock, time::Instant};

use deadpool_postgres::GenericClient;
use serde_json::Value;
use tokio_postgres::{ToStatement, types::ToSql};
use tracing::warn;

use crate::{model::TimeWindow, store::StoreError};

fn slow_query_threshold_ms() -> Option<u64> {
    static CACHE: OnceLock<Option<u64>> = OnceLock::new();

    *CACHE.get_or_init(|| {
        std::env::var("SM_DB_LOG_MIN_DURATION_MS")
            .ok()
            .and_then(|raw| parse_threshold(&raw))
    })
}

fn parse_threshold(raw: &str) -> Option<u64> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .map(|v| v.max(0) as u64)
        .filter(|v| *v > 0)
}

fn maybe_log_slow_query(label: &str, started_at: Instant) {
    if let Some(threshold_ms) = slow_query_threshold_ms() {
        let elapsed_ms = started_at.elapsed().as_millis() as u64;
        if elapsed_ms >= threshold_ms {
            warn!(query = label, elapsed_ms, "slow_query_detected");
        }
    }
}

/// `SM_DB_LOG_MIN_DURATION_MS` 以上かかったクエリを warn で記録する
pub trait TimedClientExt: GenericClient {
    async fn timed_query<S>(
        &self,
        statement: &S,
        params: &[&(dyn ToSql + Sync)],
        label: &str,
    ) -> Result<Vec<tokio_postgres::Row>, tokio_postgres::Error>
    where
        S: ToStatement + Sync + Send + ?Sized,
    {
        let started = Instant::now();
        let result = self.query(statement, params).await;
        maybe_log_slow_query(label, started);
        result
    }

    async fn timed_query_opt<S>(
        &self,
        statement: &S,
        params: &[&(dyn ToSql + Sync)],
        label: &str,
    ) -> Result<Option<tokio_postgres::Row>, tokio_postgres::Error>
    where
        S: ToStatement + Sync + Send + ?Sized,
    {
        let started = Instant::now();
        let result = self.query_opt(statement, params).await;
        maybe_log_slow_query(label, started);
        result
    }

    async fn timed_execute<S>(
        &self,
        statement: &S,
        params: &[&(dyn ToSql + Sync)],
        label: &str,
    ) -> Result<u64, tokio_postgres::Error>
    where
        S: ToStatement + Sync + Send + ?Sized,
    {
        let started = Instant::now();
        let result = self.execute(statement, params).await;
        maybe_log_slow_query(label, started);
        result
    }
}

impl<T: GenericClient + ?Sized> TimedClientExt for T {}

/// jsonb / text[] どちらの列も `to_jsonb` 経由で受け取り、文字列配列に変換する。
/// 配列以外は空として扱う。
pub fn parse_string_array(value: Option<Value>) -> Vec<String> {
    match value {
        Some(Value::Array(values)) => values
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => vec![],
    }
}

/// `[{"start": "09:00", "end": "18:00"}, ...]` を時間枠に変換する。解釈できない要素は捨てる。
pub fn parse_time_windows(value: Option<Value>) -> Vec<TimeWindow> {
    match value {
        Some(Value::Array(values)) => values
            .iter()
            .filter_map(|slot| {
                let start = slot.get("start")?.as_str()?;
                let end = slot.get("end")?.as_str()?;
                TimeWindow::parse(start, end)
            })
            .collect(),
        _ => vec![],
    }
}

pub fn parse_enum<T: FromStr>(column: &str, raw: &str) -> Result<T, StoreError> {
    raw.trim()
        .parse()
        .map_err(|_| StoreError::Mapping(format!("unknown {column} value: {raw:?}")))
}

pub fn parse_optional_enum<T: FromStr>(column: &str, raw: Option<&str>) -> Result<Option<T>, StoreError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => parse_enum(column, raw).map(Some),
        None => Ok(None),
    }
}

pub fn non_negative_u32(column: &str, value: i64) -> Result<u32, StoreError> {
    u32::try_from(value)
        .map_err(|_| StoreError::Mapping(format!("{column} out of range: {value}")))
}
