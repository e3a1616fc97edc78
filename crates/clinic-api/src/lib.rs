//! 의사 계정 및 환자 기록 REST API 서버.
//!
//! # 모듈 구성
//!
//! - [`auth`]: 비밀번호 해싱, 세션 토큰, 인증 관문
//! - [`repository`]: 의사/환자 저장소 (PostgreSQL, 인메모리)
//! - [`storage`]: 환자 사진 저장소
//! - [`routes`]: REST API 엔드포인트
//! - [`state`]: 애플리케이션 공유 상태 (AppState)
//! - [`error`]: HTTP 경계 에러 변환
//! - [`metrics`], [`middleware`]: Prometheus 메트릭
//! - [`openapi`]: OpenAPI 문서 및 Swagger UI

pub mod app;
pub mod auth;
pub mod error;
pub mod extract;
pub mod metrics;
pub mod middleware;
pub mod openapi;
pub mod repository;
pub mod routes;
pub mod state;
pub mod storage;

pub use app::{cors_layer, create_router};
pub use auth::{AuthGate, Claims, CredentialHasher, CurrentDoctor, TokenCodec};
pub use error::{ApiError, ApiErrorResponse, ApiResult};
pub use metrics::setup_metrics_recorder;
pub use middleware::metrics_layer;
pub use routes::*;
pub use state::{AppState, StateError};

#[cfg(any(test, feature = "test-utils"))]
pub use state::{create_test_state, seed_test_doctor};
