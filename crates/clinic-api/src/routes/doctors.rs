//! 의사 계정 endpoint.
//!
//! - `POST /register/doctor` - 계정 등록
//! - `POST /login/doctor` - 로그인 (bearer 토큰 발급)
//! - `GET /doctors/me` - 현재 의사 프로필 (인증 필요)

use std::sync::Arc;

use axum::{extract::State, routing::{get, post}, Json, Router};
use chrono::{DateTime, Utc};
use clinic_core::{Doctor, NewDoctor};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::auth::{AuthError, AuthFailure, CurrentDoctor};
use crate::error::{ApiError, ApiErrorResponse, ApiResult};
use crate::extract::ValidatedJson;
use crate::metrics::{record_auth_failure, record_login, record_registration};
use crate::state::AppState;

// ==================== 요청/응답 타입 ====================

/// 공백만 있는 문자열 거부.
fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message("비어 있을 수 없습니다".into()));
    }
    Ok(())
}

/// 의사 등록 요청.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterDoctorRequest {
    #[validate(custom(function = "validate_not_blank"))]
    pub nombre: String,
    #[validate(custom(function = "validate_not_blank"))]
    pub especialidad: String,
    #[validate(email(message = "올바른 이메일 형식이 아닙니다"))]
    pub correo: String,
    /// 평문 비밀번호 (최소 8자, 해시만 저장됨)
    #[validate(length(min = 8, message = "비밀번호는 최소 8자 이상이어야 합니다"))]
    pub password: String,
    #[validate(custom(function = "validate_not_blank"))]
    pub clinic_name: String,
}

/// 등록된 의사 계정 (비밀번호 해시 제외).
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DoctorOut {
    pub id: i64,
    pub nombre: String,
    pub especialidad: String,
    pub correo: String,
    pub creado_el: DateTime<Utc>,
    pub clinic_name: String,
}

impl From<&Doctor> for DoctorOut {
    fn from(doctor: &Doctor) -> Self {
        Self {
            id: doctor.id,
            nombre: doctor.nombre.clone(),
            especialidad: doctor.especialidad.clone(),
            correo: doctor.correo.clone(),
            creado_el: doctor.creado_el,
            clinic_name: doctor.clinic_name.clone(),
        }
    }
}

/// 로그인 요청.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "올바른 이메일 형식이 아닙니다"))]
    pub correo: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// 로그인 응답.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    /// 항상 "bearer"
    pub token_type: String,
}

impl TokenResponse {
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
        }
    }
}

/// 현재 의사 프로필.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DoctorProfile {
    pub nombre: String,
    pub clinic_name: String,
}

impl From<&Doctor> for DoctorProfile {
    fn from(doctor: &Doctor) -> Self {
        Self {
            nombre: doctor.nombre.clone(),
            clinic_name: doctor.clinic_name.clone(),
        }
    }
}

/// 이메일 정규화 (앞뒤 공백 제거, 소문자).
pub fn normalize_correo(correo: &str) -> String {
    correo.trim().to_lowercase()
}

// ==================== 핸들러 ====================

/// 의사 계정 등록.
///
/// 이미 등록된 correo면 400. 비밀번호는 해시로만 저장됩니다.
#[utoipa::path(
    post,
    path = "/register/doctor",
    request_body = RegisterDoctorRequest,
    responses(
        (status = 200, description = "등록 성공", body = DoctorOut),
        (status = 400, description = "중복된 correo", body = ApiErrorResponse),
        (status = 422, description = "입력값 검증 실패", body = ApiErrorResponse)
    ),
    tag = "doctors"
)]
pub async fn register_doctor(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<RegisterDoctorRequest>,
) -> ApiResult<Json<DoctorOut>> {
    let correo = normalize_correo(&req.correo);

    // 해싱 비용을 치르기 전에 중복 확인 (저장소 제약이 최종 보장)
    if state.doctors.find_by_correo(&correo).await?.is_some() {
        debug!("Registration rejected: correo already registered");
        return Err(ApiError::Conflict("이미 등록된 correo입니다".to_string()));
    }

    let hashed_pw = state.hasher.hash_blocking(req.password).await?;

    let doctor = state
        .doctors
        .create(NewDoctor {
            nombre: req.nombre.trim().to_string(),
            especialidad: req.especialidad.trim().to_string(),
            correo,
            hashed_pw,
            clinic_name: req.clinic_name.trim().to_string(),
        })
        .await?;

    record_registration();
    info!(doctor_id = doctor.id, "Doctor registered");

    Ok(Json(DoctorOut::from(&doctor)))
}

/// 로그인.
///
/// 존재하지 않는 이메일과 잘못된 비밀번호는 같은 401로 응답합니다.
/// 계정이 없어도 더미 해시 검증으로 같은 비용을 소모합니다.
#[utoipa::path(
    post,
    path = "/login/doctor",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "로그인 성공", body = TokenResponse),
        (status = 401, description = "자격 증명 불일치", body = ApiErrorResponse),
        (status = 422, description = "입력값 검증 실패", body = ApiErrorResponse)
    ),
    tag = "doctors"
)]
pub async fn login_doctor(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let correo = normalize_correo(&req.correo);
    let doctor = state.doctors.find_by_correo(&correo).await?;

    let verified = state
        .hasher
        .verify_blocking(req.password, doctor.as_ref().map(|d| d.hashed_pw.clone()))
        .await;

    let doctor = match doctor {
        Some(doctor) if verified => doctor,
        found => {
            let reason = if found.is_some() {
                AuthFailure::BadCredentials
            } else {
                AuthFailure::UnknownAccount
            };
            debug!(reason = reason.as_str(), "Login rejected");
            record_auth_failure(reason.as_str());
            record_login("failure");
            return Err(AuthError::Unauthenticated(reason).into());
        }
    };

    let access_token = state.tokens.issue_default(&doctor.correo)?;

    record_login("success");
    info!(doctor_id = doctor.id, "Doctor logged in");

    Ok(Json(TokenResponse::bearer(access_token)))
}

/// 현재 인증된 의사의 프로필.
#[utoipa::path(
    get,
    path = "/doctors/me",
    responses(
        (status = 200, description = "조회 성공", body = DoctorProfile),
        (status = 401, description = "인증 실패", body = ApiErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "doctors"
)]
pub async fn read_current_doctor(CurrentDoctor(doctor): CurrentDoctor) -> Json<DoctorProfile> {
    Json(DoctorProfile::from(&doctor))
}

/// 의사 계정 라우터 생성.
pub fn doctors_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register/doctor", post(register_doctor))
        .route("/login/doctor", post(login_doctor))
        .route("/doctors/me", get(read_current_doctor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{create_test_state, seed_test_doctor};
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app(state: Arc<AppState>) -> Router {
        doctors_router().with_state(state)
    }

    async fn post_json(app: Router, uri: &str, body: Value) -> Response {
        app.oneshot(
            Request::builder()
                .method(Method::POST)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn registration(correo: &str) -> Value {
        json!({
            "nombre": "Ana Torres",
            "especialidad": "Pediatría",
            "correo": correo,
            "password": "secret123",
            "clinic_name": "Clínica Prevenia"
        })
    }

    #[tokio::test]
    async fn test_register_returns_projection_without_hash() {
        let state = Arc::new(create_test_state());
        let response = post_json(app(state.clone()), "/register/doctor", registration("a@x.com")).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["correo"], "a@x.com");
        assert_eq!(body["clinic_name"], "Clínica Prevenia");
        assert!(body.get("hashed_pw").is_none());
        assert!(body.get("password").is_none());

        let stored = state.doctors.find_by_correo("a@x.com").await.unwrap().unwrap();
        assert_ne!(stored.hashed_pw, "secret123");
        assert!(state.hasher.verify("secret123", &stored.hashed_pw));
    }

    #[tokio::test]
    async fn test_register_duplicate_is_conflict() {
        let state = Arc::new(create_test_state());
        seed_test_doctor(&state, "a@x.com", "secret123").await;

        // 대소문자만 다른 이메일도 같은 계정
        let response = post_json(app(state), "/register/doctor", registration("A@X.com")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn test_register_validation() {
        let state = Arc::new(create_test_state());

        let response =
            post_json(app(state.clone()), "/register/doctor", registration("not-an-email")).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let mut short_pw = registration("b@x.com");
        short_pw["password"] = json!("short");
        let response = post_json(app(state.clone()), "/register/doctor", short_pw).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let response = post_json(app(state), "/register/doctor", json!({"correo": "c@x.com"})).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_register_rejects_blank_fields() {
        let state = Arc::new(create_test_state());

        for field in ["nombre", "especialidad", "clinic_name"] {
            let mut body = registration("blank@x.com");
            body[field] = json!("   ");
            let response = post_json(app(state.clone()), "/register/doctor", body).await;
            assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY, "{field}");
        }

        assert!(state.doctors.find_by_correo("blank@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_register_stores_trimmed_fields() {
        let state = Arc::new(create_test_state());
        let mut body = registration("trim@x.com");
        body["nombre"] = json!("  Ana Torres ");

        let response = post_json(app(state.clone()), "/register/doctor", body).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["nombre"], "Ana Torres");
    }

    #[tokio::test]
    async fn test_login_rejects_malformed_correo() {
        let state = Arc::new(create_test_state());
        seed_test_doctor(&state, "a@x.com", "secret123").await;

        let response = post_json(
            app(state),
            "/login/doctor",
            json!({"correo": "not-an-email", "password": "x"}),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(response.headers().get(header::WWW_AUTHENTICATE).is_none());
    }

    #[tokio::test]
    async fn test_login_issues_bearer_token() {
        let state = Arc::new(create_test_state());
        seed_test_doctor(&state, "a@x.com", "secret123").await;

        let response = post_json(
            app(state.clone()),
            "/login/doctor",
            json!({"correo": "a@x.com", "password": "secret123"}),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["token_type"], "bearer");
        let token = body["access_token"].as_str().unwrap();
        assert_eq!(state.tokens.decode(token).unwrap().sub, "a@x.com");
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let state = Arc::new(create_test_state());
        seed_test_doctor(&state, "a@x.com", "secret123").await;

        let wrong_password = post_json(
            app(state.clone()),
            "/login/doctor",
            json!({"correo": "a@x.com", "password": "wrong-password"}),
        )
        .await;
        let unknown_email = post_json(
            app(state),
            "/login/doctor",
            json!({"correo": "ghost@x.com", "password": "secret123"}),
        )
        .await;

        assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(unknown_email.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            wrong_password.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );

        let a = body_json(wrong_password).await;
        let b = body_json(unknown_email).await;
        assert_eq!(a["code"], b["code"]);
        assert_eq!(a["message"], b["message"]);
    }

    #[tokio::test]
    async fn test_me_returns_profile() {
        let state = Arc::new(create_test_state());
        let doctor = seed_test_doctor(&state, "a@x.com", "secret123").await;
        let token = state.tokens.issue_default(&doctor.correo).unwrap();

        let response = app(state)
            .oneshot(
                Request::builder()
                    .uri("/doctors/me")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body, json!({"nombre": "Ana Torres", "clinic_name": "Clínica Prevenia"}));
    }

    #[tokio::test]
    async fn test_me_requires_token() {
        let state = Arc::new(create_test_state());
        let response = app(state)
            .oneshot(Request::builder().uri("/doctors/me").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
