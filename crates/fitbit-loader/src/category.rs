//! 카테고리 디스크립터 정의.
//!
//! 각 데이터 카테고리는 저장 컬렉션, 응답 문서 안의 날짜 위치, 그리고
//! Fitbit 조회 방식(`FetchStrategy`)을 정적으로 가지고 있습니다.
//! 오케스트레이터는 디스크립터만 보고 동작하므로 카테고리별 분기가 없습니다.

use std::fmt;

use serde_json::Value;

use crate::error::{LoaderError, Result};

/// 적재 대상 데이터 카테고리 (CLI `--type` 값)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Category {
    /// 심박수 (intraday)
    Heart,
    /// 수면
    Sleep,
    /// 걸음 수
    Steps,
    /// 오른 층수
    Floors,
    /// 이동 거리
    Distance,
    /// 활동 시간 (4개 하위 카테고리)
    Activity,
    /// 소모 칼로리
    Calories,
}

impl Category {
    /// 모든 카테고리
    pub const ALL: [Category; 7] = [
        Category::Heart,
        Category::Sleep,
        Category::Steps,
        Category::Floors,
        Category::Distance,
        Category::Activity,
        Category::Calories,
    ];

    /// 문자열로 변환
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Heart => "heart",
            Self::Sleep => "sleep",
            Self::Steps => "steps",
            Self::Floors => "floors",
            Self::Distance => "distance",
            Self::Activity => "activity",
            Self::Calories => "calories",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 시계열 조회 기간
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    OneDay,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneDay => "1d",
        }
    }
}

/// intraday 조회 해상도
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailLevel {
    OneSecond,
}

impl DetailLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneSecond => "1sec",
        }
    }
}

/// 카테고리별 Fitbit 조회 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStrategy {
    /// 일반 시계열 조회 (resource + period)
    TimeSeries {
        resource: &'static str,
        period: Period,
    },
    /// 고해상도 intraday 조회 (resource + detail level)
    Intraday {
        resource: &'static str,
        detail_level: DetailLevel,
    },
    /// 날짜만 받는 수면 전용 조회
    Sleep,
}

/// 카테고리 디스크립터 (불변)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryDescriptor {
    /// 소속 카테고리
    pub category: Category,
    /// 저장 컬렉션 이름
    pub collection_name: &'static str,
    /// 응답 문서의 최상위 배열 필드 이름
    pub document_key: &'static str,
    /// 배열 첫 원소 안의 날짜 필드 이름
    pub timestamp_key: &'static str,
    /// 조회 방식
    pub strategy: FetchStrategy,
}

impl CategoryDescriptor {
    /// 날짜 필드 경로 `{document_key}.0.{timestamp_key}`.
    ///
    /// 컬렉션 초기화, 중복 확인, 저장된 날짜 추출이 모두 이 경로를 사용합니다.
    ///
    /// # Errors
    /// `document_key` 또는 `timestamp_key`가 비어 있으면 `LoaderError::InvalidDescriptor`.
    pub fn date_path(&self) -> Result<FieldPath> {
        if self.document_key.trim().is_empty() {
            return Err(LoaderError::InvalidDescriptor(format!(
                "document_key must not be empty (collection '{}')",
                self.collection_name
            )));
        }
        if self.timestamp_key.trim().is_empty() {
            return Err(LoaderError::InvalidDescriptor(format!(
                "timestamp_key must not be empty (collection '{}')",
                self.collection_name
            )));
        }
        Ok(FieldPath::new([self.document_key, "0", self.timestamp_key]))
    }
}

/// 문서 안의 중첩 필드 경로 (숫자 세그먼트는 배열 인덱스)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// 점 표기 경로 (예: `activities-heart.0.dateTime`)
    pub fn dotted(&self) -> String {
        self.segments.join(".")
    }

    /// 문서에서 경로가 가리키는 문자열 값을 꺼냅니다.
    pub fn extract<'a>(&self, document: &'a Value) -> Option<&'a str> {
        let mut current = document;
        for segment in &self.segments {
            current = match current {
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                Value::Object(map) => map.get(segment.as_str())?,
                _ => return None,
            };
        }
        current.as_str()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dotted())
    }
}

const fn time_series(
    category: Category,
    collection_name: &'static str,
    document_key: &'static str,
    resource: &'static str,
) -> CategoryDescriptor {
    CategoryDescriptor {
        category,
        collection_name,
        document_key,
        timestamp_key: "dateTime",
        strategy: FetchStrategy::TimeSeries {
            resource,
            period: Period::OneDay,
        },
    }
}

static HEART: [CategoryDescriptor; 1] = [CategoryDescriptor {
    category: Category::Heart,
    collection_name: "heart",
    document_key: "activities-heart",
    timestamp_key: "dateTime",
    strategy: FetchStrategy::Intraday {
        resource: "activities/heart",
        detail_level: DetailLevel::OneSecond,
    },
}];

static SLEEP: [CategoryDescriptor; 1] = [CategoryDescriptor {
    category: Category::Sleep,
    collection_name: "sleep",
    document_key: "sleep",
    timestamp_key: "dateOfSleep",
    strategy: FetchStrategy::Sleep,
}];

static STEPS: [CategoryDescriptor; 1] = [time_series(
    Category::Steps,
    "steps",
    "activities-steps",
    "activities/steps",
)];

static FLOORS: [CategoryDescriptor; 1] = [time_series(
    Category::Floors,
    "floors",
    "activities-floors",
    "activities/floors",
)];

static DISTANCE: [CategoryDescriptor; 1] = [time_series(
    Category::Distance,
    "distance",
    "activities-distance",
    "activities/distance",
)];

static CALORIES: [CategoryDescriptor; 1] = [time_series(
    Category::Calories,
    "calories",
    "activities-calories",
    "activities/calories",
)];

// 하위 카테고리 순서대로 하나씩 끝까지 적재합니다.
static ACTIVITY: [CategoryDescriptor; 4] = [
    time_series(
        Category::Activity,
        "activity_sedentary",
        "activities-minutesSedentary",
        "activities/minutesSedentary",
    ),
    time_series(
        Category::Activity,
        "activity_lightly_active",
        "activities-minutesLightlyActive",
        "activities/minutesLightlyActive",
    ),
    time_series(
        Category::Activity,
        "activity_fairly_active",
        "activities-minutesFairlyActive",
        "activities/minutesFairlyActive",
    ),
    time_series(
        Category::Activity,
        "activity_very_active",
        "activities-minutesVeryActive",
        "activities/minutesVeryActive",
    ),
];

/// 카테고리에 해당하는 디스크립터 목록.
///
/// `Activity`만 4개의 하위 디스크립터를 가지며 나머지는 1개입니다.
pub fn descriptors(category: Category) -> &'static [CategoryDescriptor] {
    match category {
        Category::Heart => &HEART,
        Category::Sleep => &SLEEP,
        Category::Steps => &STEPS,
        Category::Floors => &FLOORS,
        Category::Distance => &DISTANCE,
        Category::Activity => &ACTIVITY,
        Category::Calories => &CALORIES,
    }
}
