//! Standalone market indicator collector CLI.

use clap::{Parser, Subcommand};
use std::sync::Arc;

use market_collector::{modules, CollectorConfig, CollectorError};
use market_core::logging::{init_logging, LogConfig};
use market_core::IndicatorKind;
use market_data::{
    DashboardAggregator, IndicatorResolver, LiveMarketSource, PgSnapshotStore, SnapshotReader,
};

#[derive(Parser)]
#[command(name = "market-collector")]
#[command(about = "Market indicator snapshot collector", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 로그 레벨 (trace, debug, info, warn, error). 지정하지 않으면 설정 파일 값 사용
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// 스냅샷 1회 수집
    Collect,

    /// 데몬 모드: 주기적으로 스냅샷 수집
    Daemon,

    /// 대시보드 전체 조회 (스냅샷 → 실시간 → 대체값)
    Dashboard,

    /// 지표 차트 시계열 조회
    History {
        /// 지표 (btc_dominance, kimchi_premium, dollar_index)
        #[arg(long)]
        indicator: IndicatorKind,

        /// 조회 기간 (일)
        #[arg(long, default_value_t = 7)]
        days: i64,
    },

    /// 가장 최근 스냅샷 행
    Latest,

    /// 스냅샷 행 페이지 조회 (최신 순)
    Rows {
        #[arg(long, default_value_t = 24)]
        limit: i64,

        #[arg(long, default_value_t = 0)]
        offset: i64,
    },

    /// 지표 통계 (평균/최소/최대)
    Stats {
        #[arg(long)]
        indicator: IndicatorKind,

        /// 조회 기간 (시간)
        #[arg(long, default_value_t = 24)]
        hours: i64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // 설정 로드
    let config = CollectorConfig::from_env()?;

    // 로깅 초기화
    let mut log_config = LogConfig::from_settings(&config.app.logging);
    if let Some(level) = cli.log_level {
        log_config.level = level;
    }
    init_logging(log_config)?;

    tracing::info!("Market Collector 시작");

    let source = Arc::new(LiveMarketSource::from_config(&config.app)?);

    // 명령 실행
    match cli.command {
        Commands::Collect => {
            let store = connect_store(&config).await?;
            let stats = modules::collect_snapshot(source.as_ref(), &store, &config).await?;
            stats.log_summary("스냅샷 수집");
            store.pool().close().await;
        }
        Commands::Daemon => {
            let store = connect_store(&config).await?;
            run_daemon(source.as_ref(), &store, &config).await;
            store.pool().close().await;
        }
        Commands::Dashboard => {
            let resolver = resolver(source, &config).await;
            let view = modules::dashboard(&DashboardAggregator::new(resolver)).await?;
            print_json(&view)?;
        }
        Commands::History { indicator, days } => {
            let resolver = resolver(source, &config).await;
            let series = modules::history(&resolver, indicator, days).await?;
            print_json(&series)?;
        }
        Commands::Latest => {
            let store = connect_store(&config).await?;
            match modules::latest(&store).await? {
                Some(row) => print_json(&row)?,
                None => tracing::warn!("저장된 스냅샷이 없습니다"),
            }
        }
        Commands::Rows { limit, offset } => {
            let store = connect_store(&config).await?;
            print_json(&modules::rows(&store, limit, offset).await?)?;
        }
        Commands::Stats { indicator, hours } => {
            let store = connect_store(&config).await?;
            match modules::stats(&store, indicator, hours).await? {
                Some(view) => print_json(&view)?,
                None => tracing::warn!(indicator = %indicator, hours, "기간 내 값이 없습니다"),
            }
        }
    }

    tracing::info!("Market Collector 종료");

    Ok(())
}

/// DB 연결 및 마이그레이션
async fn connect_store(config: &CollectorConfig) -> Result<PgSnapshotStore, CollectorError> {
    config.database_url()?;
    let store = PgSnapshotStore::connect(&config.app.database).await?;
    store.migrate().await?;
    tracing::info!("데이터베이스 연결 성공");
    Ok(store)
}

/// 해석기 구성. DB가 없거나 연결에 실패하면 스냅샷 단계 없이 동작합니다.
async fn resolver(source: Arc<LiveMarketSource>, config: &CollectorConfig) -> IndicatorResolver {
    let resolver = IndicatorResolver::new(source, config.app.resolver.clone());

    if config.database_url().is_err() {
        tracing::info!("DATABASE_URL 없음, 실시간 조회만 사용");
        return resolver;
    }

    match PgSnapshotStore::connect(&config.app.database).await {
        Ok(store) => {
            let store: Arc<dyn SnapshotReader> = Arc::new(store);
            resolver.with_store(store)
        }
        Err(e) => {
            tracing::warn!(error = %e, "데이터베이스 연결 실패, 실시간 조회만 사용");
            resolver
        }
    }
}

async fn run_daemon(source: &LiveMarketSource, store: &PgSnapshotStore, config: &CollectorConfig) {
    tracing::info!(
        "=== 데몬 모드 시작 (주기: {}분) ===",
        config.daemon.interval_minutes
    );

    let mut interval = tokio::time::interval(config.daemon.interval());
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("종료 신호 수신, 데몬 종료 중...");
                break;
            }
            _ = interval.tick() => {
                match modules::collect_snapshot(source, store, config).await {
                    Ok(stats) => stats.log_summary("스냅샷 수집"),
                    Err(e) => tracing::error!("스냅샷 수집 실패: {}", e),
                }

                tracing::info!(
                    "=== 수집 완료, 다음 실행: {}분 후 ===",
                    config.daemon.interval_minutes
                );
            }
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), CollectorError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
