//! 적재 날짜 범위 계산.

use chrono::{Days, NaiveDate};

use crate::error::{LoaderError, Result};

/// Fitbit/저장소에서 사용하는 날짜 형식
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// `today` 이전의 완전한 `days`일을 오래된 날짜부터 반환합니다.
///
/// `today` 자체는 아직 끝나지 않은 날이므로 포함하지 않습니다.
///
/// # Errors
/// `days`가 0이면 `LoaderError::InvalidArgument`.
pub fn date_range(today: NaiveDate, days: u32) -> Result<Vec<NaiveDate>> {
    if days < 1 {
        return Err(LoaderError::InvalidArgument(
            "Minimum days is 1".to_string(),
        ));
    }

    (1..=u64::from(days))
        .rev()
        .map(|back| {
            today.checked_sub_days(Days::new(back)).ok_or_else(|| {
                LoaderError::InvalidArgument(format!(
                    "{} days before {} is out of range",
                    back, today
                ))
            })
        })
        .collect()
}

/// 날짜를 `YYYY-MM-DD` 문자열로 변환
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}
