//! Fitbit Web API HTTP 클라이언트.
//!
//! 사용 엔드포인트:
//! - 시계열: GET /1/user/-/{resource}/date/{date}/{period}.json
//! - intraday: GET /1/user/-/{resource}/date/{date}/1d/{detail}.json
//! - 수면: GET /1.2/user/-/sleep/date/{date}.json

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, error};

use super::{ApiResult, FitnessApi};
use crate::category::{DetailLevel, Period};
use crate::config::FitbitConfig;
use crate::dates::format_date;
use crate::error::ApiError;

/// 수면 API 버전
const SLEEP_API_VERSION: &str = "1.2";

/// 일반 API 버전
const API_VERSION: &str = "1";

/// Fitbit Web API 클라이언트.
pub struct FitbitClient {
    client: Client,
    base_url: String,
    access_token: SecretString,
}

impl FitbitClient {
    /// 설정으로부터 클라이언트 생성.
    ///
    /// # Errors
    /// HTTP 클라이언트 생성에 실패하면 `ApiError::Network`를 반환합니다.
    pub fn new(config: &FitbitConfig) -> ApiResult<Self> {
        Self::with_base_url(
            config.base_url.clone(),
            SecretString::new(config.credentials.access_token.expose_secret().into()),
            config.timeout(),
        )
    }

    /// 임의의 API 주소로 클라이언트 생성.
    pub fn with_base_url(
        base_url: impl Into<String>,
        access_token: SecretString,
        timeout: Duration,
    ) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Network(format!("HTTP client 생성 실패: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token,
        })
    }

    async fn get_json(&self, path: &str) -> ApiResult<Value> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "Fitbit API 요청");

        let response = self
            .client
            .get(&url)
            .bearer_auth(self.access_token.expose_secret())
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            error!(status = %status, body = %body, "Fitbit API 요청 실패");
            return Err(match status {
                StatusCode::UNAUTHORIZED => ApiError::Unauthorized(body),
                StatusCode::TOO_MANY_REQUESTS => ApiError::RateLimited,
                _ => ApiError::Http {
                    status: status.as_u16(),
                    body,
                },
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl FitnessApi for FitbitClient {
    async fn time_series(
        &self,
        resource: &str,
        base_date: NaiveDate,
        period: Period,
    ) -> ApiResult<Value> {
        let path = format!(
            "/{}/user/-/{}/date/{}/{}.json",
            API_VERSION,
            resource,
            format_date(base_date),
            period.as_str()
        );
        self.get_json(&path).await
    }

    async fn intraday_time_series(
        &self,
        resource: &str,
        base_date: NaiveDate,
        detail_level: DetailLevel,
    ) -> ApiResult<Value> {
        let path = format!(
            "/{}/user/-/{}/date/{}/1d/{}.json",
            API_VERSION,
            resource,
            format_date(base_date),
            detail_level.as_str()
        );
        self.get_json(&path).await
    }

    async fn sleep(&self, date: NaiveDate) -> ApiResult<Value> {
        let path = format!(
            "/{}/user/-/sleep/date/{}.json",
            SLEEP_API_VERSION,
            format_date(date)
        );
        self.get_json(&path).await
    }
}
