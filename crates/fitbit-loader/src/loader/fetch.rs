//! 조회 방식별 Fitbit 데이터 조회.

use chrono::NaiveDate;
use serde_json::Value;

use crate::api::{ApiResult, FitnessApi};
use crate::category::FetchStrategy;

/// 디스크립터의 조회 방식으로 하루치 문서를 가져옵니다.
pub async fn fetch_day<A>(api: &A, strategy: &FetchStrategy, date: NaiveDate) -> ApiResult<Value>
where
    A: FitnessApi + ?Sized,
{
    match *strategy {
        FetchStrategy::TimeSeries { resource, period } => {
            api.time_series(resource, date, period).await
        }
        FetchStrategy::Intraday {
            resource,
            detail_level,
        } => api.intraday_time_series(resource, date, detail_level).await,
        FetchStrategy::Sleep => api.sleep(date).await,
    }
}
