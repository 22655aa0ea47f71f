//! 대시보드 도메인 모델.
//!
//! 이 모듈은 데이터 수집 계층에서 사용하는 핵심 도메인 모델을 정의합니다.

pub mod indicator;
pub mod market;
pub mod premium;
pub mod snapshot;

pub use indicator::*;
pub use market::*;
pub use premium::*;
pub use snapshot::*;
