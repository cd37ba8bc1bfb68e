//! 에러 타입 정의.

use thiserror::Error;

/// Fitbit API 호출 에러.
#[derive(Debug, Error)]
pub enum ApiError {
    /// 네트워크/연결 에러
    #[error("Network error: {0}")]
    Network(String),

    /// 요청 타임아웃
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// 인증/권한 에러 (토큰 만료 포함)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// 요청 한도 초과
    #[error("Rate limit exceeded")]
    RateLimited,

    /// 성공이 아닌 HTTP 응답
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// 응답 파싱 에러
    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout(err.to_string())
        } else if err.is_decode() {
            ApiError::Parse(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Parse(err.to_string())
    }
}

/// 문서 저장소 에러.
#[derive(Debug, Error)]
pub enum StoreError {
    /// 유니크 제약 조건 위반 (같은 날짜 문서가 이미 존재)
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    /// 테이블/인덱스가 이미 존재함 (동시에 실행된 DDL 포함)
    #[error("Schema object already exists: {0}")]
    SchemaExists(String),

    /// 컬렉션이 존재하지 않음
    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    /// 저장소에서 사용할 수 없는 이름
    #[error("Invalid name: {0}")]
    InvalidName(String),

    /// 데이터베이스 연결 에러
    #[error("Database connection error: {0}")]
    Connection(String),

    /// 쿼리 실행 에러
    #[error("Query error: {0}")]
    Query(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => StoreError::Connection(err.to_string()),
            sqlx::Error::Database(db_err) => classify_database_error(
                db_err.code().as_deref(),
                db_err.constraint(),
                db_err.message(),
            ),
            _ => StoreError::Query(err.to_string()),
        }
    }
}

/// SQLSTATE와 제약 조건 이름으로 데이터베이스 에러를 분류합니다.
///
/// 시스템 카탈로그(`pg_*`) 인덱스의 유니크 위반은 문서 중복이 아니라
/// 같은 이름의 테이블/인덱스를 다른 세션이 먼저 만든 경우입니다.
pub(crate) fn classify_database_error(
    code: Option<&str>,
    constraint: Option<&str>,
    message: &str,
) -> StoreError {
    match code {
        // duplicate_table, duplicate_object
        Some("42P07") | Some("42710") => StoreError::SchemaExists(message.to_string()),
        Some("23505") if constraint.is_some_and(|c| c.starts_with("pg_")) => {
            StoreError::SchemaExists(message.to_string())
        }
        // PostgreSQL 고유 제약 조건 위반
        Some("23505") => StoreError::DuplicateKey(message.to_string()),
        _ => StoreError::Query(message.to_string()),
    }
}

/// Loader 에러 타입
#[derive(Debug, Error)]
pub enum LoaderError {
    /// 설정 에러 (환경변수 누락 등)
    #[error("Configuration error: {0}")]
    Config(String),

    /// 잘못 구성된 카테고리 디스크립터
    #[error("Invalid descriptor: {0}")]
    InvalidDescriptor(String),

    /// 잘못된 인자
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// 같은 날짜 문서가 2개 이상 존재 (유니크 인덱스 누락)
    #[error(
        "Duplicate entry detected: {count} documents in '{collection}' for {date}, \
         the collection is missing its uniqueness constrained index"
    )]
    DuplicateRecords {
        collection: String,
        date: String,
        count: u64,
    },

    /// 기존 중복 문서 때문에 유니크 인덱스를 만들 수 없음
    #[error(
        "Cannot build unique index on '{collection}' ({path}): \
         existing duplicate documents must be removed first ({detail})"
    )]
    UnindexableCollection {
        collection: String,
        path: String,
        detail: String,
    },

    /// Fitbit API 에러
    #[error("Fitbit API error: {0}")]
    Api(#[from] ApiError),

    /// 저장소 에러
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, LoaderError>;
