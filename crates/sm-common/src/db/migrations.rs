use deadpool_postgres::PoolError;
use thiserror::Error;
use tokio_postgres::Error as PgError;
use tracing::{info, instrument};

use crate::db::{DbPoolError, PgPool};

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] PoolError),
    #[error("failed to run migration: {0}")]
    Postgres(#[from] PgError),
    #[error("failed to build pool: {0}")]
    PoolBuild(#[from] DbPoolError),
}

struct Migration {
    id: i32,
    description: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        id: 1,
        description: "shared_office_matches with unique (space_id, request_id)",
        sql: r#"
CREATE TABLE IF NOT EXISTS shared_office_matches (
    id BIGSERIAL PRIMARY KEY,
    space_id BIGINT NOT NULL,
    request_id BIGINT NOT NULL,
    match_score DOUBLE PRECISION NOT NULL,
    location_score DOUBLE PRECISION NOT NULL DEFAULT 0,
    time_score DOUBLE PRECISION NOT NULL DEFAULT 0,
    type_score DOUBLE PRECISION NOT NULL DEFAULT 0,
    capacity_score DOUBLE PRECISION NOT NULL DEFAULT 0,
    price_score DOUBLE PRECISION NOT NULL DEFAULT 0,
    facility_score DOUBLE PRECISION NOT NULL DEFAULT 0,
    status TEXT NOT NULL DEFAULT 'recommended',
    is_auto_recommended BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    viewed_at TIMESTAMPTZ,
    applied_at TIMESTAMPTZ
);

DO $$
BEGIN
    IF NOT EXISTS (
        SELECT 1 FROM pg_constraint WHERE conname = 'uq_shared_office_matches_space_request'
    ) THEN
        ALTER TABLE shared_office_matches
            ADD CONSTRAINT uq_shared_office_matches_space_request
            UNIQUE (space_id, request_id);
    END IF;

    IF NOT EXISTS (
        SELECT 1 FROM pg_constraint WHERE conname = 'chk_match_score_range'
    ) THEN
        ALTER TABLE shared_office_matches
            ADD CONSTRAINT chk_match_score_range
            CHECK (match_score >= 0.0 AND match_score <= 100.0);
    END IF;
END $$;

CREATE INDEX IF NOT EXISTS idx_shared_office_matches_request_score
    ON shared_office_matches(request_id, match_score DESC);
"#,
    },
    Migration {
        id: 2,
        description: "request origin coordinates for distance scoring",
        sql: r#"
DO $$
BEGIN
    IF EXISTS (
        SELECT 1 FROM information_schema.tables
        WHERE table_name = 'shared_office_requests'
    ) THEN
        ALTER TABLE shared_office_requests
            ADD COLUMN IF NOT EXISTS origin_latitude DOUBLE PRECISION,
            ADD COLUMN IF NOT EXISTS origin_longitude DOUBLE PRECISION;
    END IF;

    IF EXISTS (
        SELECT 1 FROM information_schema.tables
        WHERE table_name = 'shared_office_spaces'
    ) THEN
        CREATE INDEX IF NOT EXISTS idx_shared_office_spaces_candidates
            ON shared_office_spaces(status, city, id)
            WHERE is_available = true;
    END IF;
END $$;
"#,
    },
];

#[instrument(skip(pool))]
pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrationError> {
    let mut client = pool.get().await?;
    client
        .batch_execute(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                id INTEGER PRIMARY KEY,
                description TEXT NOT NULL,
                applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
             );",
        )
        .await?;

    for migration in MIGRATIONS {
        let already_applied: bool = client
            .query_one(
                "SELECT EXISTS (SELECT 1 FROM schema_migrations WHERE id = $1)",
                &[&migration.id],
            )
            .await?
            .get(0);

        if already_applied {
            continue;
        }

        let tx = client.transaction().await?;
        tx.batch_execute(migration.sql).await?;
        tx.execute(
            "INSERT INTO schema_migrations (id, description) VALUES ($1, $2)",
            &[&migration.id, &migration.description],
        )
        .await?;
        tx.commit().await?;

        info!(
            id = migration.id,
            description = migration.description,
            "applied migration"
        );
    }

    Ok(())
}
