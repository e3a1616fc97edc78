//! Axum용 인증 추출기.

use std::sync::Arc;

use axum::{extract::FromRequestParts, http::request::Parts};
use clinic_core::Doctor;

use crate::error::ApiError;
use crate::state::AppState;

/// 현재 인증된 의사 추출기.
///
/// 요청마다 [`AuthGate`](super::AuthGate)를 호출합니다. 실패하면 401과
/// `WWW-Authenticate: Bearer` 헤더로 응답합니다.
///
/// ```rust,ignore
/// async fn read_current_doctor(CurrentDoctor(doctor): CurrentDoctor) -> Json<DoctorProfile> {
///     Json(DoctorProfile::from(&doctor))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentDoctor(pub Doctor);

impl FromRequestParts<Arc<AppState>> for CurrentDoctor {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let doctor = state
            .auth_gate
            .current_doctor_from_headers(&parts.headers)
            .await?;

        Ok(CurrentDoctor(doctor))
    }
}
