//! 환경변수 기반 설정 모듈.

use crate::error::LoaderError;
use crate::Result;
use secrecy::SecretString;
use std::time::Duration;

/// 기본 데이터베이스 URL (로컬 `fitbit` DB)
pub const DEFAULT_DATABASE_URL: &str = "postgres://localhost:5432/fitbit";

/// 기본 Fitbit API 주소
pub const DEFAULT_API_BASE_URL: &str = "https://api.fitbit.com";

/// Loader 전체 설정
#[derive(Debug)]
pub struct LoaderConfig {
    /// 문서 저장소 설정
    pub database: DatabaseConfig,
    /// Fitbit API 설정
    pub fitbit: FitbitConfig,
}

/// 문서 저장소(PostgreSQL) 설정
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// 데이터베이스 URL
    pub url: String,
    /// 풀의 최대 연결 수
    pub max_connections: u32,
}

/// Fitbit API 설정
#[derive(Debug)]
pub struct FitbitConfig {
    /// API 주소
    pub base_url: String,
    /// 사전 발급된 자격증명
    pub credentials: FitbitCredentials,
    /// 요청 타임아웃 (초)
    pub timeout_secs: u64,
    /// API 호출 후 대기 시간 (밀리초)
    pub request_delay_ms: u64,
}

/// Fitbit 자격증명 (토큰 갱신은 외부에서 처리)
#[derive(Debug)]
pub struct FitbitCredentials {
    pub client_key: SecretString,
    pub client_secret: SecretString,
    pub access_token: SecretString,
    pub refresh_token: SecretString,
}

impl LoaderConfig {
    /// 환경변수에서 설정 로드
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 키 조회 함수로부터 설정 로드.
    ///
    /// # Errors
    /// 자격증명 4개 중 하나라도 없거나 비어 있으면 `LoaderError::Config`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let credentials = FitbitCredentials {
            client_key: required_secret(&lookup, "FITBIT_KEY")?,
            client_secret: required_secret(&lookup, "FITBIT_SECRET")?,
            access_token: required_secret(&lookup, "FITBIT_ACCESS_TOKEN")?,
            refresh_token: required_secret(&lookup, "FITBIT_REFRESH_TOKEN")?,
        };

        Ok(Self {
            database: DatabaseConfig {
                url: lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
                max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 2),
            },
            fitbit: FitbitConfig {
                base_url: lookup("FITBIT_API_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
                credentials,
                timeout_secs: parse_or(&lookup, "FITBIT_TIMEOUT_SECS", 30),
                request_delay_ms: parse_or(&lookup, "FITBIT_REQUEST_DELAY_MS", 0),
            },
        })
    }
}

impl FitbitConfig {
    /// API 호출 후 대기 시간을 Duration으로 반환
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    /// 요청 타임아웃을 Duration으로 반환
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn required_secret<F>(lookup: &F, key: &str) -> Result<SecretString>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) if !value.trim().is_empty() => Ok(SecretString::new(value.into())),
        _ => Err(LoaderError::Config(format!(
            "{} 환경변수가 설정되지 않았습니다",
            key
        ))),
    }
}

/// 값을 파싱 (실패 시 기본값 사용)
fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
