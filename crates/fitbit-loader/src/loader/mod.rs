//! 적재 파이프라인.
//!
//! 카테고리의 디스크립터마다 순서대로:
//! 1. 컬렉션/유니크 인덱스 초기화
//! 2. 날짜별로 기존 문서 확인 → (없으면) Fitbit 조회 → 저장
//!
//! 날짜별 상태 전이:
//!
//! ```text
//! PENDING → CHECKED ─┬─ count == 1 → SKIPPED
//!                    ├─ count  > 1 → 실행 중단 (인덱스 누락)
//!                    └─ count == 0 → FETCHING → INSERTING ─┬─ DONE
//!                                                         └─ CONFLICT (유니크 제약)
//! ```
//!
//! 확인과 저장은 원자적이지 않습니다. 동시에 실행된 다른 프로세스가 그 사이에
//! 같은 날짜를 저장하면 유니크 인덱스가 두 번째 저장을 거부하고, 이는 경고로만
//! 기록됩니다. 응답에 날짜 필드가 없는 문서(예: 수면 기록이 없는 밤)는 모두 같은
//! 빈 키로 인덱싱되므로, 다시 실행해도 두 번째 문서부터는 CONFLICT가 됩니다.

mod collection;
mod duplicate;
mod fetch;

pub use collection::ensure_collection;
pub use duplicate::count_existing;
pub use fetch::fetch_day;

use std::time::{Duration, Instant};

use chrono::NaiveDate;

use crate::api::FitnessApi;
use crate::category::{descriptors, Category, CategoryDescriptor, FieldPath};
use crate::dates::{date_range, format_date};
use crate::error::{LoaderError, Result, StoreError};
use crate::stats::LoadStats;
use crate::store::DocumentStore;

/// 날짜 하나의 처리 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DayOutcome {
    /// 새 문서 저장 (문서 안에 기록된 실제 날짜)
    Inserted { stored_date: Option<String> },
    /// 이미 문서가 있어 조회/저장하지 않음
    Skipped,
    /// 저장 시 유니크 제약 위반 (다른 실행이 먼저 저장)
    Conflict,
}

/// 적재 오케스트레이터.
///
/// API 클라이언트와 저장소 연결은 실행 동안 한 번 열어 모든 날짜에 재사용합니다.
pub struct Loader<A, S> {
    api: A,
    store: S,
    request_delay: Duration,
}

impl<A, S> Loader<A, S>
where
    A: FitnessApi,
    S: DocumentStore,
{
    pub fn new(api: A, store: S) -> Self {
        Self {
            api,
            store,
            request_delay: Duration::ZERO,
        }
    }

    /// API 호출 후 대기 시간 설정
    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// `today` 이전 `days`일을 카테고리의 모든 디스크립터에 대해 적재합니다.
    ///
    /// 디스크립터는 하나씩 끝까지 처리하며, 치명적 에러가 나면 남은 디스크립터도
    /// 처리하지 않고 즉시 반환합니다.
    pub async fn run(
        &self,
        category: Category,
        today: NaiveDate,
        days: u32,
    ) -> Result<Vec<(&'static str, LoadStats)>> {
        let dates = date_range(today, days)?;
        tracing::info!(
            category = %category,
            dates = ?dates.iter().map(|d| format_date(*d)).collect::<Vec<_>>(),
            "적재 날짜 준비"
        );

        let mut results = Vec::new();
        for descriptor in descriptors(category) {
            let stats = self.load_descriptor(descriptor, &dates).await?;
            stats.log_summary(descriptor.collection_name);
            results.push((descriptor.collection_name, stats));
        }

        Ok(results)
    }

    /// 디스크립터 하나에 대해 모든 날짜를 적재합니다.
    pub async fn load_descriptor(
        &self,
        descriptor: &CategoryDescriptor,
        dates: &[NaiveDate],
    ) -> Result<LoadStats> {
        let start = Instant::now();
        let mut stats = LoadStats::new();

        let path = ensure_collection(&self.store, descriptor).await?;

        for (idx, date) in dates.iter().enumerate() {
            tracing::debug!(
                collection = descriptor.collection_name,
                progress = format!("{}/{}", idx + 1, dates.len()),
                "날짜 처리 시작"
            );
            let outcome = self.load_day(descriptor, &path, *date).await?;
            stats.record(&outcome);
        }

        stats.elapsed = start.elapsed();
        Ok(stats)
    }

    /// 날짜 하나에 대해 확인 → 조회 → 저장을 수행합니다.
    ///
    /// # Errors
    /// - 같은 날짜 문서가 2개 이상이면 `LoaderError::DuplicateRecords`
    /// - API/저장소 에러는 그대로 전파 (재시도 없음)
    pub async fn load_day(
        &self,
        descriptor: &CategoryDescriptor,
        path: &FieldPath,
        date: NaiveDate,
    ) -> Result<DayOutcome> {
        let collection = descriptor.collection_name;
        let base_date = format_date(date);

        match count_existing(&self.store, collection, path, &base_date).await? {
            0 => {}
            1 => {
                tracing::warn!(
                    collection,
                    date = %base_date,
                    "이미 해당 날짜 문서가 존재하여 건너뜀"
                );
                return Ok(DayOutcome::Skipped);
            }
            count => {
                return Err(LoaderError::DuplicateRecords {
                    collection: collection.to_string(),
                    date: base_date,
                    count,
                });
            }
        }

        tracing::info!(collection, date = %base_date, "Fitbit API 연결 중...");
        let payload = fetch_day(&self.api, &descriptor.strategy, date).await?;

        if !self.request_delay.is_zero() {
            tokio::time::sleep(self.request_delay).await;
        }

        match self.store.insert_one(collection, &payload).await {
            Ok(()) => {
                let stored_date = path.extract(&payload).map(str::to_string);
                match &stored_date {
                    Some(actual) => {
                        tracing::info!(collection, date = %actual, "문서 저장 완료");
                    }
                    None => {
                        tracing::warn!(
                            collection,
                            requested = %base_date,
                            path = %path,
                            "문서 저장 완료 (응답에 날짜 필드 없음)"
                        );
                    }
                }
                Ok(DayOutcome::Inserted { stored_date })
            }
            Err(StoreError::DuplicateKey(detail)) => {
                tracing::warn!(
                    collection,
                    date = %base_date,
                    detail = %detail,
                    "이미 존재하는 문서, 저장하지 않음"
                );
                Ok(DayOutcome::Conflict)
            }
            Err(e) => Err(e.into()),
        }
    }
}
