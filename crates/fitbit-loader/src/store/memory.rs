//! 메모리 기반 문서 저장소.
//!
//! 유니크 인덱스 의미를 그대로 지키며, 테스트에서 인덱스가 없는 저장소를
//! 흉내 내기 위한 `seed_unchecked`를 제공합니다.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use super::{DocumentStore, StoreResult};
use crate::category::FieldPath;
use crate::error::StoreError;

#[derive(Debug, Default)]
struct MemoryCollection {
    documents: Vec<Value>,
    unique_paths: Vec<FieldPath>,
}

impl MemoryCollection {
    fn count(&self, path: &FieldPath, value: &str) -> usize {
        self.documents
            .iter()
            .filter(|doc| index_key(path, doc) == value)
            .count()
    }
}

/// 인덱스 키. 경로에 값이 없는 문서는 모두 빈 문자열 키 하나로 취급합니다.
fn index_key<'a>(path: &FieldPath, document: &'a Value) -> &'a str {
    path.extract(document).unwrap_or_default()
}

/// 메모리 문서 저장소.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<String, MemoryCollection>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 제약 조건을 무시하고 문서를 넣습니다 (컬렉션이 없으면 생성).
    pub async fn seed_unchecked(&self, collection: &str, document: Value) {
        let mut collections = self.collections.lock().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .documents
            .push(document);
    }

    /// 컬렉션의 모든 문서 (없으면 빈 목록).
    pub async fn documents(&self, collection: &str) -> Vec<Value> {
        let collections = self.collections.lock().await;
        collections
            .get(collection)
            .map(|c| c.documents.clone())
            .unwrap_or_default()
    }

    /// 존재하는 컬렉션 이름 (정렬됨).
    pub async fn collection_names(&self) -> Vec<String> {
        let collections = self.collections.lock().await;
        let mut names: Vec<String> = collections.keys().cloned().collect();
        names.sort();
        names
    }

    /// 유니크 인덱스 존재 여부.
    pub async fn has_unique_index(&self, collection: &str, path: &FieldPath) -> bool {
        let collections = self.collections.lock().await;
        collections
            .get(collection)
            .map(|c| c.unique_paths.contains(path))
            .unwrap_or(false)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn collection_exists(&self, collection: &str) -> StoreResult<bool> {
        Ok(self.collections.lock().await.contains_key(collection))
    }

    async fn create_collection(&self, collection: &str) -> StoreResult<()> {
        self.collections
            .lock()
            .await
            .entry(collection.to_string())
            .or_default();
        Ok(())
    }

    async fn create_unique_index(&self, collection: &str, path: &FieldPath) -> StoreResult<()> {
        let mut collections = self.collections.lock().await;
        let target = collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::CollectionNotFound(collection.to_string()))?;

        if target.unique_paths.contains(path) {
            return Ok(());
        }

        // 기존 문서에 중복이 있으면 인덱스를 만들 수 없습니다.
        for doc in &target.documents {
            let value = index_key(path, doc);
            if target.count(path, value) > 1 {
                return Err(StoreError::DuplicateKey(format!(
                    "cannot build unique index on {}.{}: duplicate value '{}'",
                    collection, path, value
                )));
            }
        }

        target.unique_paths.push(path.clone());
        Ok(())
    }

    async fn count_matching(
        &self,
        collection: &str,
        path: &FieldPath,
        value: &str,
    ) -> StoreResult<u64> {
        let collections = self.collections.lock().await;
        Ok(collections
            .get(collection)
            .map(|c| c.count(path, value) as u64)
            .unwrap_or(0))
    }

    async fn insert_one(&self, collection: &str, document: &Value) -> StoreResult<()> {
        let mut collections = self.collections.lock().await;
        let target = collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::CollectionNotFound(collection.to_string()))?;

        for path in &target.unique_paths {
            let value = index_key(path, document);
            if target.count(path, value) > 0 {
                return Err(StoreError::DuplicateKey(format!(
                    "{}.{} = '{}'",
                    collection, path, value
                )));
            }
        }

        target.documents.push(document.clone());
        Ok(())
    }
}
