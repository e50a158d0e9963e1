use tracing::{debug, instrument};

use crate::{
    db::{PgPool, util::TimedClientExt},
    matching::MatchResult,
    store::StoreError,
};

/// (space_id, request_id) で upsert する。status / viewed_at / applied_at は
/// ユーザー操作の結果なので既存行では更新しない。
const UPSERT_MATCH: &str = "INSERT INTO shared_office_matches (
        space_id,
        request_id,
        match_score,
        location_score,
        time_score,
        type_score,
        capacity_score,
        price_score,
        facility_score,
        status,
        is_auto_recommended,
        created_at
    ) VALUES (
        $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12
    )
    ON CONFLICT (space_id, request_id) DO UPDATE SET
        match_score = EXCLUDED.match_score,
        location_score = EXCLUDED.location_score,
        time_score = EXCLUDED.time_score,
        type_score = EXCLUDED.type_score,
        capacity_score = EXCLUDED.capacity_score,
        price_score = EXCLUDED.price_score,
        facility_score = EXCLUDED.facility_score,
        is_auto_recommended = EXCLUDED.is_auto_recommended";

/// 1トランザクションでまとめて upsert する
#[instrument(skip(pool, results), fields(count = results.len()))]
pub async fn upsert_match_results(pool: &PgPool, results: &[MatchResult]) -> Result<u64, StoreError> {
    if results.is_empty() {
        return Ok(0);
    }

    let mut client = pool.get().await?;
    let tx = client.transaction().await?;
    let stmt = tx.prepare_cached(UPSERT_MATCH).await?;

    let mut written = 0;
    for result in results {
        let status = result.status.as_ref();
        written += tx
            .timed_execute(
                &stmt,
                &[
                    &result.listing_id,
                    &result.request_id,
                    &result.total_score,
                    &result.breakdown.location,
                    &result.breakdown.time,
                    &result.breakdown.category,
                    &result.breakdown.capacity,
                    &result.breakdown.price,
                    &result.breakdown.facility,
                    &status,
                    &result.auto_recommended,
                    &result.created_at,
                ],
                "upsert_match_result",
            )
            .await?;
    }

    tx.commit().await?;
    debug!(written, "upserted match results");

    Ok(written)
}
