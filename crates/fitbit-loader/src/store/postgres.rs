//! PostgreSQL JSONB 기반 문서 저장소.
//!
//! 컬렉션 하나가 테이블 하나에 대응합니다:
//!
//! ```sql
//! CREATE TABLE "steps" (
//!     id          BIGSERIAL PRIMARY KEY,
//!     document    JSONB NOT NULL,
//!     inserted_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! CREATE UNIQUE INDEX "steps_uniq_..." ON "steps"
//!     ((COALESCE(document #>> '{activities-steps,0,dateTime}', '')));
//! ```
//!
//! 날짜 필드가 없는 문서는 모두 빈 문자열 키를 가지므로 컬렉션에 하나만 들어갑니다.
//! 다른 실행이 같은 테이블/인덱스를 먼저 만든 경우는 성공으로 처리합니다.
//!
//! DDL에는 바인드 파라미터를 쓸 수 없으므로 컬렉션 이름과 경로 세그먼트는
//! SQL에 넣기 전에 검증합니다.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use sha2::{Digest, Sha256};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use tracing::{debug, info, instrument};

use super::{DocumentStore, StoreResult};
use crate::category::FieldPath;
use crate::config::DatabaseConfig;
use crate::error::StoreError;

/// PostgreSQL 식별자 최대 길이
const MAX_IDENTIFIER_LEN: usize = 63;

/// PostgreSQL 문서 저장소.
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    /// 새로운 연결 풀을 생성합니다.
    pub async fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        info!("Connecting to database...");

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .acquire_timeout(Duration::from_secs(30))
            .connect(&config.url)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        info!("Database connection established");

        Ok(Self { pool })
    }

    /// 기존 연결 풀에서 저장소를 생성합니다.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 내부 연결 풀을 반환합니다.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// 연결 풀을 닫습니다.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn execute_ddl(&self, sql: &str) -> StoreResult<()> {
        let result = sqlx::query(sql)
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(StoreError::from);
        tolerate_existing(result)
    }
}

/// 이미 존재하는 스키마 객체는 성공으로 간주합니다.
fn tolerate_existing(result: StoreResult<()>) -> StoreResult<()> {
    match result {
        Err(StoreError::SchemaExists(detail)) => {
            debug!(detail = %detail, "Schema object created concurrently");
            Ok(())
        }
        other => other,
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn collection_exists(&self, collection: &str) -> StoreResult<bool> {
        validate_collection(collection)?;

        let (exists,): (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM information_schema.tables
                WHERE table_schema = current_schema() AND table_name = $1
            )
            "#,
        )
        .bind(collection)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    #[instrument(skip(self))]
    async fn create_collection(&self, collection: &str) -> StoreResult<()> {
        let sql = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id BIGSERIAL PRIMARY KEY,
                document JSONB NOT NULL,
                inserted_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
            quote_collection(collection)?
        );
        self.execute_ddl(&sql).await?;

        debug!("Created collection table");
        Ok(())
    }

    #[instrument(skip(self, path), fields(path = %path))]
    async fn create_unique_index(&self, collection: &str, path: &FieldPath) -> StoreResult<()> {
        let key = key_expression(path)?;
        let sql = format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS \"{}\" ON {} (({}))",
            index_name(collection, &key),
            quote_collection(collection)?,
            key
        );
        self.execute_ddl(&sql).await?;

        debug!("Unique index ensured");
        Ok(())
    }

    async fn count_matching(
        &self,
        collection: &str,
        path: &FieldPath,
        value: &str,
    ) -> StoreResult<u64> {
        // 인덱스 식과 같은 형태여야 인덱스를 탑니다.
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE {} = $1",
            quote_collection(collection)?,
            key_expression(path)?
        );
        let (count,): (i64,) = sqlx::query_as(&sql)
            .bind(value)
            .fetch_one(&self.pool)
            .await?;

        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn insert_one(&self, collection: &str, document: &Value) -> StoreResult<()> {
        let sql = format!(
            "INSERT INTO {} (document) VALUES ($1)",
            quote_collection(collection)?
        );
        sqlx::query(&sql)
            .bind(Json(document))
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// 컬렉션 이름 검증 (소문자, 숫자, 밑줄만 허용).
fn validate_collection(collection: &str) -> StoreResult<()> {
    let mut chars = collection.chars();
    let valid_start = matches!(chars.next(), Some(c) if c.is_ascii_lowercase() || c == '_');
    let valid_rest = chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');

    if valid_start && valid_rest && collection.len() <= MAX_IDENTIFIER_LEN {
        Ok(())
    } else {
        Err(StoreError::InvalidName(format!(
            "collection name '{}' is not a valid table name",
            collection
        )))
    }
}

fn quote_collection(collection: &str) -> StoreResult<String> {
    validate_collection(collection)?;
    Ok(format!("\"{}\"", collection))
}

/// `#>>` 연산자용 text[] 리터럴 (예: `'{activities-steps,0,dateTime}'`).
fn path_literal(path: &FieldPath) -> StoreResult<String> {
    let valid = !path.segments().is_empty()
        && path.segments().iter().all(|segment| {
            !segment.is_empty()
                && segment
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        });

    if !valid {
        return Err(StoreError::InvalidName(format!(
            "field path '{}' contains unsupported characters",
            path
        )));
    }

    Ok(format!("'{{{}}}'", path.segments().join(",")))
}

/// 유니크 인덱스와 중복 조회가 함께 쓰는 키 식 (값이 없으면 빈 문자열).
fn key_expression(path: &FieldPath) -> StoreResult<String> {
    Ok(format!("COALESCE(document #>> {}, '')", path_literal(path)?))
}

/// 키 식 해시 기반 인덱스 이름 (63자 제한 회피).
fn index_name(collection: &str, key: &str) -> String {
    let digest = Sha256::digest(key.as_bytes());
    format!("{}_uniq_{}", collection, &hex::encode(digest)[..12])
}
