//! Fitbit → 문서 저장소 적재 CLI.
//!
//! # 사용 예시
//!
//! ```bash
//! # 어제 하루치 심박수
//! fitbit-loader --type heart --days 1
//!
//! # 지난 30일 활동 시간 (4개 컬렉션)
//! fitbit-loader --type activity --days 30 -v
//! ```

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fitbit_loader::cli::Cli;
use fitbit_loader::{FitbitClient, Loader, LoaderConfig, PgDocumentStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // 로깅 초기화 (프로세스당 한 번)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.default_log_filter().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run(&cli).await {
        tracing::error!(error = %e, "적재 실패");
        return Err(e.into());
    }

    Ok(())
}

async fn run(cli: &Cli) -> fitbit_loader::Result<()> {
    tracing::info!(category = %cli.category, days = cli.days, "Fitbit Loader 시작");

    // 설정 로드
    let config = LoaderConfig::from_env()?;
    tracing::debug!(api = %config.fitbit.base_url, "설정 로드 완료");

    let api = FitbitClient::new(&config.fitbit)?;
    let store = PgDocumentStore::connect(&config.database).await?;

    let loader = Loader::new(api, store).with_request_delay(config.fitbit.request_delay());
    let today = chrono::Local::now().date_naive();
    let result = loader.run(cli.category, today, cli.days).await;

    loader.store().close().await;

    let inserted: usize = result?.iter().map(|(_, stats)| stats.inserted).sum();

    tracing::info!(inserted, "Fitbit Loader 종료");
    Ok(())
}
