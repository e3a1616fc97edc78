//! API 에러 타입.
//!
//! 핵심 계층의 타입화된 에러를 HTTP 경계에서 상태 코드와 JSON 에러 본문으로
//! 변환합니다. 내부 에러의 상세 정보는 로그에만 남기고 응답에는 일반적인
//! 메시지만 담습니다.

use axum::{
    extract::multipart::MultipartError,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::error;
use utoipa::ToSchema;

use crate::auth::{AuthError, PasswordError, TokenError};
use crate::repository::RepositoryError;
use crate::storage::StorageError;

/// 인증 실패 시 모든 경로에서 동일하게 사용하는 메시지.
pub const UNAUTHENTICATED_MESSAGE: &str = "자격 증명을 확인할 수 없습니다";

/// API 에러 응답 본문.
///
/// ```json
/// {
///   "code": "CONFLICT",
///   "message": "이미 등록된 correo입니다",
///   "timestamp": 1738300800
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiErrorResponse {
    /// 에러 코드 (예: "CONFLICT", "UNAUTHENTICATED", "NOT_FOUND")
    pub code: String,
    /// 사람이 읽을 수 있는 에러 메시지
    pub message: String,
    /// 추가 에러 상세 정보 (선택적)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    /// 에러 발생 타임스탬프 (Unix timestamp)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl ApiErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            timestamp: Some(chrono::Utc::now().timestamp()),
        }
    }

    /// 상세 정보 포함 에러 생성.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: Value,
    ) -> Self {
        Self {
            details: Some(details),
            ..Self::new(code, message)
        }
    }
}

impl std::fmt::Display for ApiErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

/// HTTP 경계의 에러 종류.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// 유일 필드 중복 (400)
    #[error("{0}")]
    Conflict(String),
    /// 인증 실패 (401, 사유와 관계없이 동일한 응답)
    #[error("자격 증명을 확인할 수 없습니다")]
    Unauthenticated,
    /// 요청 본문 형식/검증 실패 (422)
    #[error("{message}")]
    MalformedInput {
        message: String,
        details: Option<Value>,
    },
    /// 리소스 없음 또는 소유하지 않음 (404)
    #[error("{0}")]
    NotFound(String),
    /// 업로드 크기 초과 (413)
    #[error("{0}")]
    PayloadTooLarge(String),
    /// 저장소/데이터베이스 실패 (500, 상세는 로그에만 기록)
    #[error("내부 에러: {0}")]
    Internal(String),
}

/// API 핸들러 Result 타입 별칭.
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn malformed(message: impl Into<String>) -> Self {
        ApiError::MalformedInput {
            message: message.into(),
            details: None,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::MalformedInput { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::Unauthenticated => "UNAUTHENTICATED",
            ApiError::MalformedInput { .. } => "MALFORMED_INPUT",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        let body = match self {
            ApiError::Internal(detail) => {
                error!(detail = %detail, "Internal error");
                ApiErrorResponse::new(code, "내부 서버 에러가 발생했습니다")
            }
            ApiError::MalformedInput {
                message,
                details: Some(details),
            } => ApiErrorResponse::with_details(code, message, details),
            other => ApiErrorResponse::new(code, other.to_string()),
        };

        if status == StatusCode::UNAUTHORIZED {
            (status, [(header::WWW_AUTHENTICATE, "Bearer")], Json(body)).into_response()
        } else {
            (status, Json(body)).into_response()
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Unauthenticated(_) => ApiError::Unauthenticated,
            AuthError::Lookup(e) => ApiError::from(e),
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Conflict { field } => {
                ApiError::Conflict(format!("이미 등록된 {field}입니다"))
            }
            RepositoryError::Database(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        let message = err.to_string();
        match err {
            StorageError::UnsupportedType(_) => ApiError::malformed(message),
            StorageError::TooLarge { .. } => ApiError::PayloadTooLarge(message),
            StorageError::InvalidName | StorageError::Io(_) => ApiError::Internal(message),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::MalformedInput {
            message: "입력값 검증 실패".to_string(),
            details: serde_json::to_value(&errors).ok(),
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(err.body_text())
        } else {
            ApiError::malformed(err.body_text())
        }
    }
}
