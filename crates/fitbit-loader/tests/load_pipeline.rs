//! 적재 파이프라인 시나리오 테스트 (메모리 저장소 + 기록용 API).

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use clap::Parser;
use serde_json::{json, Value};

use fitbit_loader::api::ApiResult;
use fitbit_loader::category::{DetailLevel, Period};
use fitbit_loader::cli::Cli;
use fitbit_loader::error::{ApiError, StoreError};
use fitbit_loader::store::StoreResult;
use fitbit_loader::{
    descriptors, Category, DayOutcome, DocumentStore, FieldPath, FitnessApi, Loader, LoaderError,
    MemoryStore,
};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    TimeSeries(String, String),
    Intraday(String, String, &'static str),
    Sleep(String),
}

/// 호출을 기록하고 요청 날짜로 응답 문서를 만들어 주는 API.
#[derive(Default)]
struct RecordingApi {
    calls: Mutex<Vec<Call>>,
    /// 응답 문서의 날짜를 요청 날짜보다 며칠 앞당김 (시간대 차이 흉내)
    shift_days: u64,
    fail_on: Option<NaiveDate>,
    /// 수면 기록이 없는 밤처럼 빈 `sleep` 배열로 응답
    no_sleep_log: bool,
}

impl RecordingApi {
    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn respond(&self, date: NaiveDate) -> ApiResult<String> {
        if self.fail_on == Some(date) {
            return Err(ApiError::Network("connection reset".to_string()));
        }
        let actual = date.checked_sub_days(Days::new(self.shift_days)).unwrap();
        Ok(actual.format("%Y-%m-%d").to_string())
    }
}

#[async_trait]
impl FitnessApi for RecordingApi {
    async fn time_series(
        &self,
        resource: &str,
        base_date: NaiveDate,
        period: Period,
    ) -> ApiResult<Value> {
        assert_eq!(period, Period::OneDay);
        self.calls
            .lock()
            .unwrap()
            .push(Call::TimeSeries(resource.to_string(), base_date.to_string()));
        let date = self.respond(base_date)?;
        let mut payload = serde_json::Map::new();
        payload.insert(
            resource.replace('/', "-"),
            json!([{ "dateTime": date, "value": "42" }]),
        );
        Ok(Value::Object(payload))
    }

    async fn intraday_time_series(
        &self,
        resource: &str,
        base_date: NaiveDate,
        detail_level: DetailLevel,
    ) -> ApiResult<Value> {
        self.calls.lock().unwrap().push(Call::Intraday(
            resource.to_string(),
            base_date.to_string(),
            detail_level.as_str(),
        ));
        let date = self.respond(base_date)?;
        Ok(json!({
            "activities-heart": [{ "dateTime": date, "value": { "restingHeartRate": 58 } }],
            "activities-heart-intraday": { "dataset": [], "datasetInterval": 1 }
        }))
    }

    async fn sleep(&self, date: NaiveDate) -> ApiResult<Value> {
        self.calls.lock().unwrap().push(Call::Sleep(date.to_string()));
        let actual = self.respond(date)?;
        if self.no_sleep_log {
            return Ok(json!({
                "sleep": [],
                "summary": { "totalMinutesAsleep": 0, "totalSleepRecords": 0, "totalTimeInBed": 0 }
            }));
        }
        Ok(json!({ "sleep": [{ "dateOfSleep": actual, "minutesAsleep": 420 }], "summary": {} }))
    }
}

/// 유니크 인덱스 생성을 무시하는 저장소 (인덱스 누락 상황).
#[derive(Default)]
struct IndexlessStore {
    inner: MemoryStore,
}

#[async_trait]
impl DocumentStore for IndexlessStore {
    async fn collection_exists(&self, collection: &str) -> StoreResult<bool> {
        self.inner.collection_exists(collection).await
    }

    async fn create_collection(&self, collection: &str) -> StoreResult<()> {
        self.inner.create_collection(collection).await
    }

    async fn create_unique_index(&self, _collection: &str, _path: &FieldPath) -> StoreResult<()> {
        Ok(())
    }

    async fn count_matching(
        &self,
        collection: &str,
        path: &FieldPath,
        value: &str,
    ) -> StoreResult<u64> {
        self.inner.count_matching(collection, path, value).await
    }

    async fn insert_one(&self, collection: &str, document: &Value) -> StoreResult<()> {
        self.inner.insert_one(collection, document).await
    }
}

/// 확인 시점에는 비어 있다고 답하는 저장소 (확인과 저장 사이에 다른 실행이 끼어든 상황).
#[derive(Default)]
struct RacingStore {
    inner: MemoryStore,
}

#[async_trait]
impl DocumentStore for RacingStore {
    async fn collection_exists(&self, collection: &str) -> StoreResult<bool> {
        self.inner.collection_exists(collection).await
    }

    async fn create_collection(&self, collection: &str) -> StoreResult<()> {
        self.inner.create_collection(collection).await
    }

    async fn create_unique_index(&self, collection: &str, path: &FieldPath) -> StoreResult<()> {
        self.inner.create_unique_index(collection, path).await
    }

    async fn count_matching(
        &self,
        _collection: &str,
        _path: &FieldPath,
        _value: &str,
    ) -> StoreResult<u64> {
        Ok(0)
    }

    async fn insert_one(&self, collection: &str, document: &Value) -> StoreResult<()> {
        self.inner.insert_one(collection, document).await
    }
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn today() -> NaiveDate {
    date("2024-03-01")
}

fn steps_doc(day: &str) -> Value {
    json!({ "activities-steps": [{ "dateTime": day, "value": "1000" }] })
}

fn stored_dates(docs: &[Value], path: &FieldPath) -> Vec<String> {
    let mut dates: Vec<String> = docs
        .iter()
        .filter_map(|d| path.extract(d).map(str::to_string))
        .collect();
    dates.sort();
    dates
}

#[tokio::test]
async fn heart_two_days_into_empty_store() {
    let loader = Loader::new(RecordingApi::default(), MemoryStore::new());

    let results = loader.run(Category::Heart, today(), 2).await.unwrap();

    assert_eq!(results.len(), 1);
    let (collection, stats) = &results[0];
    assert_eq!(*collection, "heart");
    assert_eq!(stats.total, 2);
    assert_eq!(stats.inserted, 2);
    assert_eq!(stats.skipped, 0);

    assert_eq!(
        loader.api().calls(),
        vec![
            Call::Intraday("activities/heart".into(), "2024-02-28".into(), "1sec"),
            Call::Intraday("activities/heart".into(), "2024-02-29".into(), "1sec"),
        ]
    );

    let path = descriptors(Category::Heart)[0].date_path().unwrap();
    let docs = loader.store().documents("heart").await;
    assert_eq!(stored_dates(&docs, &path), vec!["2024-02-28", "2024-02-29"]);
    assert!(loader.store().has_unique_index("heart", &path).await);
}

#[tokio::test]
async fn sleep_existing_record_is_skipped_without_fetch() {
    let store = MemoryStore::new();
    store
        .seed_unchecked(
            "sleep",
            json!({ "sleep": [{ "dateOfSleep": "2024-02-29", "minutesAsleep": 400 }] }),
        )
        .await;
    let loader = Loader::new(RecordingApi::default(), store);

    let results = loader.run(Category::Sleep, today(), 1).await.unwrap();

    let stats = &results[0].1;
    assert_eq!(stats.skipped, 1);
    assert_eq!(stats.inserted, 0);
    assert!(loader.api().calls().is_empty());
    assert_eq!(loader.store().documents("sleep").await.len(), 1);
}

#[tokio::test]
async fn activity_runs_four_independent_cycles() {
    let loader = Loader::new(RecordingApi::default(), MemoryStore::new());

    let results = loader.run(Category::Activity, today(), 1).await.unwrap();

    let collections: Vec<&str> = results.iter().map(|(c, _)| *c).collect();
    assert_eq!(
        collections,
        vec![
            "activity_sedentary",
            "activity_lightly_active",
            "activity_fairly_active",
            "activity_very_active",
        ]
    );
    assert!(results.iter().all(|(_, s)| s.inserted == 1));

    assert_eq!(
        loader.api().calls(),
        vec![
            Call::TimeSeries("activities/minutesSedentary".into(), "2024-02-29".into()),
            Call::TimeSeries("activities/minutesLightlyActive".into(), "2024-02-29".into()),
            Call::TimeSeries("activities/minutesFairlyActive".into(), "2024-02-29".into()),
            Call::TimeSeries("activities/minutesVeryActive".into(), "2024-02-29".into()),
        ]
    );

    for descriptor in descriptors(Category::Activity) {
        let path = descriptor.date_path().unwrap();
        let docs = loader.store().documents(descriptor.collection_name).await;
        assert_eq!(stored_dates(&docs, &path), vec!["2024-02-29"]);
        assert!(loader.store().has_unique_index(descriptor.collection_name, &path).await);
    }
}

#[tokio::test]
async fn second_run_adds_nothing() {
    let loader = Loader::new(RecordingApi::default(), MemoryStore::new());

    let first = loader.run(Category::Steps, today(), 3).await.unwrap();
    assert_eq!(first[0].1.inserted, 3);

    let second = loader.run(Category::Steps, today(), 3).await.unwrap();
    assert_eq!(second[0].1.inserted, 0);
    assert_eq!(second[0].1.skipped, 3);

    assert_eq!(loader.api().calls().len(), 3);
    assert_eq!(loader.store().documents("steps").await.len(), 3);
}

#[tokio::test]
async fn dateless_payload_is_stored_once_across_runs() {
    let api = RecordingApi {
        no_sleep_log: true,
        ..Default::default()
    };
    let loader = Loader::new(api, MemoryStore::new());

    let first = loader.run(Category::Sleep, today(), 1).await.unwrap();
    assert_eq!(first[0].1.inserted, 1);

    for _ in 0..2 {
        let again = loader.run(Category::Sleep, today(), 1).await.unwrap();
        assert_eq!(again[0].1.inserted, 0);
        assert_eq!(again[0].1.conflicts, 1);
    }

    assert_eq!(loader.api().calls().len(), 3);
    assert_eq!(loader.store().documents("sleep").await.len(), 1);
}

#[tokio::test]
async fn dateless_payloads_for_different_days_conflict() {
    let api = RecordingApi {
        no_sleep_log: true,
        ..Default::default()
    };
    let loader = Loader::new(api, MemoryStore::new());
    let descriptor = &descriptors(Category::Sleep)[0];
    let path = fitbit_loader::loader::ensure_collection(loader.store(), descriptor)
        .await
        .unwrap();

    let first = loader.load_day(descriptor, &path, date("2024-02-27")).await.unwrap();
    assert_eq!(first, DayOutcome::Inserted { stored_date: None });

    let second = loader.load_day(descriptor, &path, date("2024-02-28")).await.unwrap();
    assert_eq!(second, DayOutcome::Conflict);
}

#[tokio::test]
async fn overlapping_ranges_only_fetch_new_days() {
    let loader = Loader::new(RecordingApi::default(), MemoryStore::new());

    loader.run(Category::Floors, today(), 2).await.unwrap();
    let results = loader.run(Category::Floors, today(), 5).await.unwrap();

    assert_eq!(results[0].1.inserted, 3);
    assert_eq!(results[0].1.skipped, 2);
    assert_eq!(loader.store().documents("floors").await.len(), 5);
}

#[tokio::test]
async fn duplicate_records_abort_the_run() {
    let store = IndexlessStore::default();
    store.inner.seed_unchecked("steps", steps_doc("2024-02-28")).await;
    store.inner.seed_unchecked("steps", steps_doc("2024-02-28")).await;
    let loader = Loader::new(RecordingApi::default(), store);

    let err = loader.run(Category::Steps, today(), 3).await.unwrap_err();

    match err {
        LoaderError::DuplicateRecords {
            collection,
            date,
            count,
        } => {
            assert_eq!(collection, "steps");
            assert_eq!(date, "2024-02-28");
            assert_eq!(count, 2);
        }
        other => panic!("unexpected error: {other}"),
    }

    // 2024-02-27만 처리되고 2024-02-28에서 중단, 2024-02-29는 손대지 않음
    assert_eq!(
        loader.api().calls(),
        vec![Call::TimeSeries("activities/steps".into(), "2024-02-27".into())]
    );
    assert_eq!(loader.store().inner.documents("steps").await.len(), 3);
}

#[tokio::test]
async fn existing_duplicates_prevent_indexing_before_any_fetch() {
    let store = MemoryStore::new();
    store.seed_unchecked("steps", steps_doc("2024-02-28")).await;
    store.seed_unchecked("steps", steps_doc("2024-02-28")).await;
    let loader = Loader::new(RecordingApi::default(), store);

    let err = loader.run(Category::Steps, today(), 3).await.unwrap_err();

    match err {
        LoaderError::UnindexableCollection {
            collection, path, ..
        } => {
            assert_eq!(collection, "steps");
            assert_eq!(path, "activities-steps.0.dateTime");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(loader.api().calls().is_empty());
    assert_eq!(loader.store().documents("steps").await.len(), 2);
}

#[tokio::test]
async fn duplicate_records_stop_remaining_activity_types() {
    let store = IndexlessStore::default();
    let doc = json!({
        "activities-minutesSedentary": [{ "dateTime": "2024-02-29", "value": "600" }]
    });
    store.inner.seed_unchecked("activity_sedentary", doc.clone()).await;
    store.inner.seed_unchecked("activity_sedentary", doc).await;
    let loader = Loader::new(RecordingApi::default(), store);

    let err = loader.run(Category::Activity, today(), 1).await.unwrap_err();

    assert!(matches!(err, LoaderError::DuplicateRecords { count: 2, .. }));
    assert!(loader.api().calls().is_empty());
    assert_eq!(
        loader.store().inner.collection_names().await,
        vec!["activity_sedentary".to_string()]
    );
}

#[tokio::test]
async fn insert_conflict_is_a_warning_and_processing_continues() {
    let store = RacingStore::default();
    let path = descriptors(Category::Steps)[0].date_path().unwrap();
    store.inner.create_collection("steps").await.unwrap();
    store.inner.create_unique_index("steps", &path).await.unwrap();
    store.inner.insert_one("steps", &steps_doc("2024-02-28")).await.unwrap();
    let loader = Loader::new(RecordingApi::default(), store);

    let results = loader.run(Category::Steps, today(), 2).await.unwrap();

    let stats = &results[0].1;
    assert_eq!(stats.conflicts, 1);
    assert_eq!(stats.inserted, 1);
    assert_eq!(loader.api().calls().len(), 2);

    let docs = loader.store().inner.documents("steps").await;
    assert_eq!(stored_dates(&docs, &path), vec!["2024-02-28", "2024-02-29"]);
}

#[tokio::test]
async fn load_day_reports_each_outcome() {
    let store = RacingStore::default();
    let descriptor = &descriptors(Category::Calories)[0];
    let loader = Loader::new(RecordingApi::default(), store);
    let path = fitbit_loader::loader::ensure_collection(loader.store(), descriptor)
        .await
        .unwrap();

    let first = loader.load_day(descriptor, &path, date("2024-02-10")).await.unwrap();
    assert_eq!(
        first,
        DayOutcome::Inserted {
            stored_date: Some("2024-02-10".to_string())
        }
    );

    let second = loader.load_day(descriptor, &path, date("2024-02-10")).await.unwrap();
    assert_eq!(second, DayOutcome::Conflict);
}

#[tokio::test]
async fn stored_date_comes_from_payload() {
    let api = RecordingApi {
        shift_days: 1,
        ..Default::default()
    };
    let loader = Loader::new(api, MemoryStore::new());
    let descriptor = &descriptors(Category::Sleep)[0];
    let path = fitbit_loader::loader::ensure_collection(loader.store(), descriptor)
        .await
        .unwrap();

    let outcome = loader.load_day(descriptor, &path, date("2024-02-29")).await.unwrap();

    assert_eq!(loader.api().calls(), vec![Call::Sleep("2024-02-29".into())]);
    assert_eq!(
        outcome,
        DayOutcome::Inserted {
            stored_date: Some("2024-02-28".to_string())
        }
    );
}

#[tokio::test]
async fn api_failure_is_fatal() {
    let api = RecordingApi {
        fail_on: Some(date("2024-02-29")),
        ..Default::default()
    };
    let loader = Loader::new(api, MemoryStore::new());

    let err = loader.run(Category::Distance, today(), 3).await.unwrap_err();

    assert!(matches!(err, LoaderError::Api(ApiError::Network(_))));
    assert_eq!(loader.store().documents("distance").await.len(), 2);
}

#[tokio::test]
async fn store_failure_is_fatal() {
    struct BrokenStore;

    #[async_trait]
    impl DocumentStore for BrokenStore {
        async fn collection_exists(&self, _: &str) -> StoreResult<bool> {
            Err(StoreError::Connection("connection refused".to_string()))
        }
        async fn create_collection(&self, _: &str) -> StoreResult<()> {
            unreachable!()
        }
        async fn create_unique_index(&self, _: &str, _: &FieldPath) -> StoreResult<()> {
            unreachable!()
        }
        async fn count_matching(&self, _: &str, _: &FieldPath, _: &str) -> StoreResult<u64> {
            unreachable!()
        }
        async fn insert_one(&self, _: &str, _: &Value) -> StoreResult<()> {
            unreachable!()
        }
    }

    let loader = Loader::new(RecordingApi::default(), BrokenStore);
    let err = loader.run(Category::Steps, today(), 1).await.unwrap_err();

    assert!(matches!(err, LoaderError::Store(StoreError::Connection(_))));
    assert!(loader.api().calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn request_delay_follows_each_fetch() {
    let loader = Loader::new(RecordingApi::default(), MemoryStore::new())
        .with_request_delay(Duration::from_secs(2));
    let start = tokio::time::Instant::now();

    loader.run(Category::Steps, today(), 3).await.unwrap();
    assert!(start.elapsed() >= Duration::from_secs(6));

    // 건너뛴 날짜는 API를 호출하지 않으므로 대기하지 않습니다.
    let start = tokio::time::Instant::now();
    loader.run(Category::Steps, today(), 3).await.unwrap();
    assert!(start.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn zero_days_is_rejected_before_any_call() {
    assert!(Cli::try_parse_from(["fitbit-loader", "--type", "heart", "--days", "0"]).is_err());

    let loader = Loader::new(RecordingApi::default(), MemoryStore::new());
    let err = loader.run(Category::Heart, today(), 0).await.unwrap_err();

    assert!(matches!(err, LoaderError::InvalidArgument(_)));
    assert!(loader.api().calls().is_empty());
    assert!(loader.store().collection_names().await.is_empty());
}
