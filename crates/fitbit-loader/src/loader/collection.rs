//! 컬렉션 및 유니크 인덱스 초기화.

use crate::category::{CategoryDescriptor, FieldPath};
use crate::error::{LoaderError, Result, StoreError};
use crate::store::DocumentStore;

/// 컬렉션이 존재하고 날짜 경로에 유니크 인덱스가 걸려 있도록 보장합니다.
///
/// 매 실행마다 호출해도 안전하며, 이후 중복 확인에 사용할 날짜 경로를 반환합니다.
/// 동시 실행 시 중복 저장을 막는 것은 이 인덱스입니다.
///
/// # Errors
/// - 디스크립터 키가 비어 있으면 `LoaderError::InvalidDescriptor`
/// - 기존 문서 중복으로 인덱스를 만들 수 없으면 `LoaderError::UnindexableCollection`
pub async fn ensure_collection<S>(store: &S, descriptor: &CategoryDescriptor) -> Result<FieldPath>
where
    S: DocumentStore + ?Sized,
{
    let path = descriptor.date_path()?;
    let collection = descriptor.collection_name;
    if collection.trim().is_empty() {
        return Err(LoaderError::InvalidDescriptor(
            "collection_name must not be empty".to_string(),
        ));
    }

    if !store.collection_exists(collection).await? {
        tracing::info!(collection, "컬렉션 생성");
        store.create_collection(collection).await?;
    }

    match store.create_unique_index(collection, &path).await {
        Ok(()) => {}
        Err(StoreError::DuplicateKey(detail)) => {
            return Err(LoaderError::UnindexableCollection {
                collection: collection.to_string(),
                path: path.dotted(),
                detail,
            });
        }
        Err(e) => return Err(e.into()),
    }
    tracing::debug!(collection, index = %path, "유니크 인덱스 확인 완료");

    Ok(path)
}
