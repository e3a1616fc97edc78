//! OpenAPI 문서 및 Swagger UI.
//!
//! 새 엔드포인트를 추가할 때는 핸들러에 `#[utoipa::path(...)]`를 달고
//! 이 파일의 `paths(...)`와 `components(schemas(...))`에 등록합니다.

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::error::ApiErrorResponse;
use crate::routes::{
    ComponentHealth, ComponentStatus, CreatePatientForm, DoctorOut, DoctorProfile, HealthResponse,
    LoginRequest, PatientOut, RegisterDoctorRequest, TokenResponse, WelcomeResponse,
};

/// Clinic Records API 문서.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Clinic Records API",
        description = r#"
의사 계정과 환자 기록 관리 REST API입니다.

## 인증

`POST /login/doctor`로 발급받은 토큰을 `Authorization: Bearer <token>` 헤더로
보냅니다. 토큰은 상태 없는 HS256 JWT이며 만료 시각이 지나면 무효가 됩니다.
"#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:8000", description = "로컬 개발 서버"),
    ),
    tags(
        (name = "root", description = "환영 메시지"),
        (name = "health", description = "헬스 체크 - 서버 상태 확인"),
        (name = "doctors", description = "의사 계정 - 등록, 로그인, 프로필"),
        (name = "patients", description = "환자 기록 - 현재 의사 소유 환자만 접근")
    ),
    components(
        schemas(
            ApiErrorResponse,
            WelcomeResponse,
            HealthResponse,
            ComponentHealth,
            ComponentStatus,
            RegisterDoctorRequest,
            DoctorOut,
            LoginRequest,
            TokenResponse,
            DoctorProfile,
            CreatePatientForm,
            PatientOut,
        )
    ),
    paths(
        crate::routes::read_root,
        crate::routes::health::health_check,
        crate::routes::health::health_ready,
        crate::routes::doctors::register_doctor,
        crate::routes::doctors::login_doctor,
        crate::routes::doctors::read_current_doctor,
        crate::routes::patients::create_patient,
        crate::routes::patients::list_patients,
        crate::routes::patients::get_patient,
        crate::routes::patients::get_patient_foto,
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// `bearer_auth` 보안 스키마 등록.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Swagger UI 라우터 생성.
///
/// - `/swagger-ui` - Swagger UI 대화형 문서
/// - `/api-docs/openapi.json` - OpenAPI JSON 스펙
pub fn swagger_ui_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .into()
}
