//! Fitbit 일별 시계열 데이터를 문서 저장소로 적재하는 backfill 도구.
//!
//! 이 crate는 다음을 제공합니다:
//! - 카테고리별 정적 디스크립터 (heart, sleep, steps, floors, distance, calories, activity)
//! - 컬렉션/유니크 인덱스 초기화
//! - 날짜별 중복 확인 → 조회 → 저장 파이프라인 (재실행 안전)
//! - Fitbit Web API 클라이언트와 PostgreSQL(JSONB) 문서 저장소

pub mod api;
pub mod category;
pub mod cli;
pub mod config;
pub mod dates;
pub mod error;
pub mod loader;
pub mod stats;
pub mod store;

pub use api::{FitbitClient, FitnessApi};
pub use category::{descriptors, Category, CategoryDescriptor, FetchStrategy, FieldPath};
pub use config::LoaderConfig;
pub use error::{LoaderError, Result};
pub use loader::{DayOutcome, Loader};
pub use stats::LoadStats;
pub use store::{DocumentStore, MemoryStore, PgDocumentStore};
