//! 인증 관문.
//!
//! 보호된 모든 작업은 환자 데이터에 접근하기 전에 이 관문을 거칩니다.
//! 요청마다 호출되며 신원을 캐싱하지 않습니다(토큰이 세션 중간에 만료될 수 있음).

use std::sync::Arc;

use axum::http::HeaderMap;
use clinic_core::Doctor;
use tracing::{debug, warn};

use super::{bearer_token, resolve_subject, AuthError, AuthFailure, TokenCodec};
use crate::metrics::record_auth_failure;
use crate::repository::DoctorRepository;

/// 세션 해석기와 계정 조회를 묶은 "현재 의사" 해석기.
#[derive(Clone)]
pub struct AuthGate {
    tokens: Arc<TokenCodec>,
    doctors: Arc<dyn DoctorRepository>,
}

impl AuthGate {
    pub fn new(tokens: Arc<TokenCodec>, doctors: Arc<dyn DoctorRepository>) -> Self {
        Self { tokens, doctors }
    }

    /// 원시 bearer 토큰으로 현재 의사 계정 조회.
    ///
    /// 토큰 검증 실패와 계정 없음은 모두 `Unauthenticated`입니다.
    /// 등록된 이메일을 보호된 경로로 탐색하지 못하도록 둘을 구분하지 않습니다.
    pub async fn current_doctor(&self, raw_token: &str) -> Result<Doctor, AuthError> {
        let result = self.load(raw_token).await;
        if let Err(e) = &result {
            match e.failure() {
                Some(reason) => {
                    debug!(reason = reason.as_str(), "Authentication rejected");
                    record_auth_failure(reason.as_str());
                }
                None => warn!(error = %e, "Identity lookup failed"),
            }
        }
        result
    }

    /// 요청 헤더에서 토큰을 꺼내 현재 의사 계정 조회.
    pub async fn current_doctor_from_headers(&self, headers: &HeaderMap) -> Result<Doctor, AuthError> {
        match bearer_token(headers) {
            Ok(token) => self.current_doctor(token).await,
            Err(e) => {
                if let Some(reason) = e.failure() {
                    debug!(reason = reason.as_str(), "Authentication rejected");
                    record_auth_failure(reason.as_str());
                }
                Err(e)
            }
        }
    }

    async fn load(&self, raw_token: &str) -> Result<Doctor, AuthError> {
        let subject = resolve_subject(&self.tokens, raw_token)?;

        self.doctors
            .find_by_correo(&subject)
            .await?
            .ok_or(AuthError::Unauthenticated(AuthFailure::UnknownAccount))
    }
}
