//! Fitbit API 추상화.
//!
//! 오케스트레이터는 `FitnessApi` trait만 알고 있으며, 실제 HTTP 구현은
//! `FitbitClient`가 제공합니다. 인증 토큰은 외부에서 발급되어 주입됩니다.

mod client;

pub use client::FitbitClient;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;

use crate::category::{DetailLevel, Period};
use crate::error::ApiError;

/// API 호출 Result 타입.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// 업스트림 피트니스 API 인터페이스.
///
/// 모든 메서드는 응답 문서를 가공하지 않고 그대로 반환합니다.
#[async_trait]
pub trait FitnessApi: Send + Sync {
    /// 일반 시계열 조회 (resource, 기준일, 기간).
    async fn time_series(
        &self,
        resource: &str,
        base_date: NaiveDate,
        period: Period,
    ) -> ApiResult<Value>;

    /// intraday 시계열 조회 (resource, 기준일, 해상도).
    async fn intraday_time_series(
        &self,
        resource: &str,
        base_date: NaiveDate,
        detail_level: DetailLevel,
    ) -> ApiResult<Value>;

    /// 특정 날짜의 수면 기록 조회.
    async fn sleep(&self, date: NaiveDate) -> ApiResult<Value>;
}
