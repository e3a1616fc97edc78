//! API 라우트.
//!
//! # 라우트 구조
//!
//! - `/` - 환영 메시지
//! - `/health`, `/health/ready` - 헬스 체크
//! - `/register/doctor`, `/login/doctor` - 계정 등록/로그인
//! - `/doctors/me` - 현재 의사 프로필 (인증 필요)
//! - `/patients` - 환자 기록 (인증 필요)

pub mod doctors;
pub mod health;
pub mod patients;

pub use doctors::{
    doctors_router, DoctorOut, DoctorProfile, LoginRequest, RegisterDoctorRequest, TokenResponse,
};
pub use health::{health_router, ComponentHealth, ComponentStatus, HealthResponse};
pub use patients::{patients_router, CreatePatientForm, ListPatientsQuery, PatientOut};

use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::state::AppState;

/// 루트 응답.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WelcomeResponse {
    pub message: String,
}

/// 환영 메시지.
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "환영 메시지", body = WelcomeResponse)),
    tag = "root"
)]
pub async fn read_root() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: "Bienvenido a la API de Prevenia".to_string(),
    })
}

/// 전체 API 라우터 생성.
pub fn create_api_router(max_photo_bytes: usize) -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(read_root))
        .nest("/health", health_router())
        .merge(doctors_router())
        .merge(patients_router(max_photo_bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::create_test_state;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_root_welcome() {
        let app = create_api_router(1024).with_state(Arc::new(create_test_state()));
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let welcome: WelcomeResponse = serde_json::from_slice(&body).unwrap();
        assert!(welcome.message.starts_with("Bienvenido"));
    }
}
