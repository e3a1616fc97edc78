//! # Clinic Core
//!
//! 진료 기록 API의 핵심 도메인 모델과 공통 인프라를 제공합니다.
//!
//! - 의사 계정 / 환자 기록 도메인 모델
//! - 설정 관리 (`config` 크레이트 기반 계층형 로딩)
//! - 로깅 인프라

pub mod config;
pub mod domain;
pub mod logging;

pub use self::config::*;
pub use domain::*;
pub use logging::*;
