//! 문서 저장소 추상화.
//!
//! 컬렉션 단위로 JSON 문서를 저장하며, 중첩 필드 경로에 대한 유니크 인덱스를
//! 지원해야 합니다. 유니크 제약 위반은 반드시 `StoreError::DuplicateKey`로
//! 구분되어야 오케스트레이터가 동시 실행 충돌을 경고로 처리할 수 있습니다.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgDocumentStore;

use async_trait::async_trait;
use serde_json::Value;

use crate::category::FieldPath;
use crate::error::StoreError;

/// 저장소 작업 Result 타입.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// 문서 저장소 인터페이스.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// 컬렉션 존재 여부 확인.
    async fn collection_exists(&self, collection: &str) -> StoreResult<bool>;

    /// 컬렉션 생성.
    async fn create_collection(&self, collection: &str) -> StoreResult<()>;

    /// 필드 경로에 유니크 인덱스 생성 (이미 있으면 무시).
    async fn create_unique_index(&self, collection: &str, path: &FieldPath) -> StoreResult<()>;

    /// 필드 경로 값이 `value`와 같은 문서 수.
    async fn count_matching(
        &self,
        collection: &str,
        path: &FieldPath,
        value: &str,
    ) -> StoreResult<u64>;

    /// 문서 하나 저장.
    ///
    /// # Errors
    /// 유니크 인덱스 위반 시 `StoreError::DuplicateKey`.
    async fn insert_one(&self, collection: &str, document: &Value) -> StoreResult<()>;
}
