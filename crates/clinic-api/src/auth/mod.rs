//! 인증 및 권한 부여.
//!
//! 비밀번호 해싱, 세션 토큰 발급/검증, 요청 → "현재 의사" 해석을 제공합니다.
//!
//! # 구성 요소
//!
//! - [`CredentialHasher`]: Argon2id 비밀번호 해싱/검증
//! - [`TokenCodec`]: HS256 세션 토큰 발급/디코딩
//! - [`resolve_subject`]: 토큰 → subject(correo) 해석
//! - [`AuthGate`]: 세션 해석 + 계정 조회를 묶은 단일 관문
//! - [`CurrentDoctor`]: Axum 핸들러용 추출기
//!
//! # 사용 예시
//!
//! ```rust,ignore
//! async fn protected_handler(
//!     CurrentDoctor(doctor): CurrentDoctor,
//! ) -> impl IntoResponse {
//!     format!("Hola, {}!", doctor.nombre)
//! }
//! ```

mod gate;
mod jwt;
mod middleware;
mod password;
mod session;

pub use gate::AuthGate;
pub use jwt::{Claims, TokenCodec, TokenError, MAX_TOKEN_TTL_MINUTES, TOKEN_ALGORITHM};
pub use middleware::CurrentDoctor;
pub use password::{CredentialHasher, PasswordError};
pub use session::{bearer_token, resolve_subject};

use crate::repository::RepositoryError;

/// 인증 실패 사유.
///
/// 로그와 메트릭에만 사용되며, 클라이언트 응답은 사유와 관계없이 동일합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    /// Authorization 헤더 없음
    MissingToken,
    /// Bearer 형식이 아닌 헤더
    MalformedHeader,
    /// 서명 불일치, 형식 오류, 만료
    InvalidToken,
    /// `sub` 클레임 없음
    MissingSubject,
    /// 토큰은 유효하나 계정이 없음
    UnknownAccount,
    /// 로그인 시 이메일 또는 비밀번호 불일치
    BadCredentials,
}

impl AuthFailure {
    /// 메트릭 라벨용 문자열.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthFailure::MissingToken => "missing_token",
            AuthFailure::MalformedHeader => "malformed_header",
            AuthFailure::InvalidToken => "invalid_token",
            AuthFailure::MissingSubject => "missing_subject",
            AuthFailure::UnknownAccount => "unknown_account",
            AuthFailure::BadCredentials => "bad_credentials",
        }
    }
}

/// 인증 에러.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("자격 증명을 확인할 수 없습니다")]
    Unauthenticated(AuthFailure),
    #[error("계정 조회 실패: {0}")]
    Lookup(#[from] RepositoryError),
}

impl AuthError {
    /// 인증 실패 사유 (조회 에러면 `None`).
    pub fn failure(&self) -> Option<AuthFailure> {
        match self {
            AuthError::Unauthenticated(reason) => Some(*reason),
            AuthError::Lookup(_) => None,
        }
    }
}
