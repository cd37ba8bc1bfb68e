//! 명령행 인자 정의.

use clap::Parser;

use crate::category::Category;

#[derive(Debug, Parser)]
#[command(name = "fitbit-loader")]
#[command(about = "Load FitBit data into a document store", long_about = None)]
#[command(version)]
pub struct Cli {
    /// 적재할 데이터 카테고리
    #[arg(long = "type", value_enum)]
    pub category: Category,

    /// 오늘 이전 며칠을 적재할지 (최소 1)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub days: u32,

    /// 디버그 로그 출력
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// 기본 로그 필터 (`RUST_LOG`가 없을 때 사용)
    pub fn default_log_filter(&self) -> String {
        let level = if self.verbose { "debug" } else { "info" };
        format!("fitbit_loader={}", level)
    }
}
