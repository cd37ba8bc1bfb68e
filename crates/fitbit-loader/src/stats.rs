//! 적재 통계 구조체.

use std::time::Duration;

use crate::loader::DayOutcome;

/// 컬렉션 하나에 대한 적재 통계
#[derive(Debug, Clone, Default)]
pub struct LoadStats {
    /// 처리한 날짜 수
    pub total: usize,
    /// 새로 저장한 문서 수
    pub inserted: usize,
    /// 이미 존재해서 건너뛴 날짜 수
    pub skipped: usize,
    /// 저장 시 유니크 제약에 걸린 날짜 수
    pub conflicts: usize,
    /// 소요 시간
    pub elapsed: Duration,
}

impl LoadStats {
    /// 새 통계 객체 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 날짜 하나의 처리 결과 반영
    pub fn record(&mut self, outcome: &DayOutcome) {
        self.total += 1;
        match outcome {
            DayOutcome::Inserted { .. } => self.inserted += 1,
            DayOutcome::Skipped => self.skipped += 1,
            DayOutcome::Conflict => self.conflicts += 1,
        }
    }

    /// 통계 요약 로그 출력
    pub fn log_summary(&self, collection: &str) {
        tracing::info!(
            collection = collection,
            total = self.total,
            inserted = self.inserted,
            skipped = self.skipped,
            conflicts = self.conflicts,
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "적재 완료"
        );
    }
}
