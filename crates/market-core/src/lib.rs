//! # Market Core
//!
//! 마켓 지표 대시보드의 핵심 도메인 모델 및 타입을 제공합니다.
//!
//! 이 크레이트는 데이터 수집 계층 전반에서 사용되는 기본 타입을 제공합니다:
//! - 지표 값 및 출처(스냅샷/실시간/대체값) 타입
//! - 암호화폐 시세 항목
//! - 스냅샷 및 히스토리 포인트
//! - 김치 프리미엄 계산기
//! - 설정 관리
//! - 로깅 인프라
//! - 표시 계층용 반올림 포맷터

pub mod config;
pub mod domain;
pub mod error;
pub mod format;
pub mod logging;

pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
