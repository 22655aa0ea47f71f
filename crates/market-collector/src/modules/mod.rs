//! 수집 및 조회 모듈.

pub mod collect;
pub mod query;

pub use collect::collect_snapshot;
pub use query::{dashboard, history, latest, rows, stats, DashboardView, StatsView};
