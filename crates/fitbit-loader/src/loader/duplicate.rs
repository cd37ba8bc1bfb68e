//! 날짜별 기존 문서 확인.

use crate::category::FieldPath;
use crate::error::Result;
use crate::store::DocumentStore;

/// `collection`에서 날짜 경로 값이 `date`인 문서 수를 반환합니다.
///
/// 이 확인은 불필요한 API 호출을 줄이기 위한 것이며 저장과 원자적이지 않습니다.
pub async fn count_existing<S>(
    store: &S,
    collection: &str,
    path: &FieldPath,
    date: &str,
) -> Result<u64>
where
    S: DocumentStore + ?Sized,
{
    let count = store.count_matching(collection, path, date).await?;
    tracing::debug!(collection, query = %path, date, count, "기존 문서 조회");
    Ok(count)
}
