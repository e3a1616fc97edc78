//! 환자 기록 endpoint.
//!
//! 모든 경로는 인증이 필요하며, 현재 의사가 소유한 환자만 다룹니다.
//! 다른 의사의 환자는 존재 여부를 드러내지 않도록 404로 응답합니다.
//!
//! - `POST /patients` - 환자 등록 (multipart, 선택적 사진)
//! - `GET /patients` - 환자 목록 (최신순, 페이지네이션)
//! - `GET /patients/{id}` - 환자 상세
//! - `GET /patients/{id}/foto` - 환자 사진

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{
        rejection::{PathRejection, QueryRejection},
        DefaultBodyLimit, Multipart, Path, Query, State,
    },
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use clinic_core::{NewPatient, Patient};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::auth::CurrentDoctor;
use crate::error::{ApiError, ApiErrorResponse, ApiResult};
use crate::routes::doctors::normalize_correo;
use crate::storage::StorageError;
use crate::state::AppState;

/// 기본 페이지 크기.
pub const DEFAULT_PAGE_SIZE: i64 = 20;
/// 최대 페이지 크기.
pub const MAX_PAGE_SIZE: i64 = 100;

/// multipart 텍스트 필드 여유분 (사진 외 필드와 경계 문자열).
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

// ==================== 요청/응답 타입 ====================

/// 환자 응답.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PatientOut {
    pub id: i64,
    pub doctor_id: i64,
    pub nombre: String,
    pub dni: String,
    pub correo: String,
    pub telefono: Option<String>,
    pub fecha_nacimiento: Option<NaiveDate>,
    pub creado_el: DateTime<Utc>,
    /// 사진 조회 경로 (사진이 없으면 `null`)
    pub foto_url: Option<String>,
}

impl From<&Patient> for PatientOut {
    fn from(patient: &Patient) -> Self {
        Self {
            id: patient.id,
            doctor_id: patient.doctor_id,
            nombre: patient.nombre.clone(),
            dni: patient.dni.clone(),
            correo: patient.correo.clone(),
            telefono: patient.telefono.clone(),
            fecha_nacimiento: patient.fecha_nacimiento,
            creado_el: patient.creado_el,
            foto_url: patient
                .has_foto()
                .then(|| format!("/patients/{}/foto", patient.id)),
        }
    }
}

/// 환자 등록 폼 (multipart/form-data).
///
/// OpenAPI 문서용 스키마이며, 실제 파싱은 [`PatientForm`]이 담당합니다.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct CreatePatientForm {
    pub nombre: String,
    pub dni: String,
    pub correo: String,
    pub telefono: Option<String>,
    /// YYYY-MM-DD
    pub fecha_nacimiento: Option<String>,
    /// image/jpeg, image/png, image/webp
    #[schema(value_type = Option<String>, format = Binary)]
    pub foto: Option<Vec<u8>>,
}

/// 목록 쿼리.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListPatientsQuery {
    /// 건너뛸 개수 (기본 0)
    pub skip: Option<i64>,
    /// 페이지 크기 (기본 20, 1..=100으로 제한)
    pub limit: Option<i64>,
}

impl ListPatientsQuery {
    /// (skip, limit) 정규화.
    pub fn window(&self) -> (i64, i64) {
        let skip = self.skip.unwrap_or(0).max(0);
        let limit = self
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        (skip, limit)
    }
}

/// 업로드된 사진.
#[derive(Debug)]
struct UploadedPhoto {
    bytes: Bytes,
    content_type: String,
}

/// multipart에서 읽은 원시 필드.
#[derive(Debug, Default)]
struct PatientForm {
    nombre: Option<String>,
    dni: Option<String>,
    correo: Option<String>,
    telefono: Option<String>,
    fecha_nacimiento: Option<String>,
    foto: Option<UploadedPhoto>,
}

/// 검증 대상 텍스트 필드.
#[derive(Debug, Validate)]
struct PatientFields {
    #[validate(length(min = 1, message = "nombre는 비어 있을 수 없습니다"))]
    nombre: String,
    #[validate(length(min = 1, max = 32, message = "dni 길이가 올바르지 않습니다"))]
    dni: String,
    #[validate(email(message = "올바른 이메일 형식이 아닙니다"))]
    correo: String,
    #[validate(length(max = 32))]
    telefono: Option<String>,
}

impl PatientForm {
    async fn read(mut multipart: Multipart, max_photo_bytes: usize) -> ApiResult<Self> {
        let mut form = PatientForm::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();

            if name == "foto" {
                let content_type = field.content_type().unwrap_or_default().to_string();
                let bytes = field.bytes().await?;
                // 파일을 고르지 않은 폼은 빈 파트를 보냄
                if bytes.is_empty() {
                    continue;
                }
                if bytes.len() > max_photo_bytes {
                    return Err(StorageError::TooLarge {
                        limit: max_photo_bytes,
                    }
                    .into());
                }
                form.foto = Some(UploadedPhoto {
                    bytes,
                    content_type,
                });
                continue;
            }

            let value = field.text().await?.trim().to_string();
            let slot = match name.as_str() {
                "nombre" => &mut form.nombre,
                "dni" => &mut form.dni,
                "correo" => &mut form.correo,
                "telefono" => &mut form.telefono,
                "fecha_nacimiento" => &mut form.fecha_nacimiento,
                other => {
                    debug!(field = other, "Ignoring unknown form field");
                    continue;
                }
            };
            *slot = Some(value).filter(|v| !v.is_empty());
        }

        Ok(form)
    }

    /// 필드 검증 후 저장 입력으로 변환 (사진 경로는 비어 있음).
    fn into_new_patient(self, doctor_id: i64) -> ApiResult<(NewPatient, Option<UploadedPhoto>)> {
        let fields = PatientFields {
            nombre: required(self.nombre, "nombre")?,
            dni: required(self.dni, "dni")?,
            correo: normalize_correo(&required(self.correo, "correo")?),
            telefono: self.telefono,
        };
        fields.validate()?;

        let fecha_nacimiento = self
            .fecha_nacimiento
            .map(|raw| {
                NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|_| {
                    ApiError::malformed("fecha_nacimiento는 YYYY-MM-DD 형식이어야 합니다")
                })
            })
            .transpose()?;

        let patient = NewPatient {
            doctor_id,
            nombre: fields.nombre,
            dni: fields.dni,
            correo: fields.correo,
            telefono: fields.telefono,
            fecha_nacimiento,
            foto_path: None,
            foto_content_type: None,
        };

        Ok((patient, self.foto))
    }
}

fn required(value: Option<String>, field: &str) -> ApiResult<String> {
    value.ok_or_else(|| ApiError::malformed(format!("{field} 필드가 필요합니다")))
}

// ==================== 핸들러 ====================

/// 환자 등록.
///
/// 사진은 환자 저장 전에 디스크에 기록되며, 저장이 실패하면 삭제됩니다.
#[utoipa::path(
    post,
    path = "/patients",
    request_body(content = CreatePatientForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "등록 성공", body = PatientOut),
        (status = 400, description = "중복된 dni/correo", body = ApiErrorResponse),
        (status = 401, description = "인증 실패", body = ApiErrorResponse),
        (status = 413, description = "사진 크기 초과", body = ApiErrorResponse),
        (status = 422, description = "입력값 검증 실패", body = ApiErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "patients"
)]
pub async fn create_patient(
    State(state): State<Arc<AppState>>,
    CurrentDoctor(doctor): CurrentDoctor,
    multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let form = PatientForm::read(multipart, state.photos.max_bytes()).await?;
    let (mut new_patient, foto) = form.into_new_patient(doctor.id)?;

    if let Some(photo) = &foto {
        let name = state.photos.save(&photo.bytes, &photo.content_type).await?;
        new_patient.foto_path = Some(name);
        new_patient.foto_content_type = Some(photo.content_type.to_ascii_lowercase());
    }

    let patient = match state.patients.create(new_patient.clone()).await {
        Ok(patient) => patient,
        Err(e) => {
            if let Some(name) = &new_patient.foto_path {
                state.photos.remove(name).await;
            }
            return Err(e.into());
        }
    };

    info!(
        patient_id = patient.id,
        doctor_id = doctor.id,
        has_foto = patient.has_foto(),
        "Patient created"
    );

    Ok((StatusCode::CREATED, Json(PatientOut::from(&patient))))
}

/// 현재 의사의 환자 목록 (최신순).
#[utoipa::path(
    get,
    path = "/patients",
    params(ListPatientsQuery),
    responses(
        (status = 200, description = "조회 성공", body = Vec<PatientOut>),
        (status = 401, description = "인증 실패", body = ApiErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "patients"
)]
pub async fn list_patients(
    State(state): State<Arc<AppState>>,
    CurrentDoctor(doctor): CurrentDoctor,
    query: Result<Query<ListPatientsQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<PatientOut>>> {
    let Query(query) = query.map_err(|e| ApiError::malformed(e.body_text()))?;
    let (skip, limit) = query.window();

    let patients = state.patients.list_by_doctor(doctor.id, skip, limit).await?;

    Ok(Json(patients.iter().map(PatientOut::from).collect()))
}

/// 환자 상세.
#[utoipa::path(
    get,
    path = "/patients/{id}",
    params(("id" = i64, Path, description = "환자 id")),
    responses(
        (status = 200, description = "조회 성공", body = PatientOut),
        (status = 401, description = "인증 실패", body = ApiErrorResponse),
        (status = 404, description = "환자 없음", body = ApiErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "patients"
)]
pub async fn get_patient(
    State(state): State<Arc<AppState>>,
    CurrentDoctor(doctor): CurrentDoctor,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<PatientOut>> {
    let patient = find_owned(&state, doctor.id, id).await?;
    Ok(Json(PatientOut::from(&patient)))
}

/// 환자 사진.
#[utoipa::path(
    get,
    path = "/patients/{id}/foto",
    params(("id" = i64, Path, description = "환자 id")),
    responses(
        (status = 200, description = "사진 바이트", body = [u8], content_type = "application/octet-stream"),
        (status = 401, description = "인증 실패", body = ApiErrorResponse),
        (status = 404, description = "환자 또는 사진 없음", body = ApiErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "patients"
)]
pub async fn get_patient_foto(
    State(state): State<Arc<AppState>>,
    CurrentDoctor(doctor): CurrentDoctor,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<impl IntoResponse> {
    let patient = find_owned(&state, doctor.id, id).await?;

    let name = patient
        .foto_path
        .as_deref()
        .ok_or_else(|| ApiError::NotFound("사진이 없습니다".to_string()))?;

    let bytes = match state.photos.load(name).await {
        Ok(bytes) => bytes,
        Err(StorageError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ApiError::NotFound("사진이 없습니다".to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    let content_type = patient
        .foto_content_type
        .unwrap_or_else(|| "application/octet-stream".to_string());

    Ok(([(header::CONTENT_TYPE, content_type)], bytes))
}

async fn find_owned(
    state: &AppState,
    doctor_id: i64,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Patient> {
    let Path(patient_id) = id.map_err(|e| ApiError::malformed(e.body_text()))?;

    state
        .patients
        .find_for_doctor(doctor_id, patient_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("환자를 찾을 수 없습니다".to_string()))
}

/// 환자 라우터 생성.
///
/// 사진 업로드를 위해 요청 본문 제한을 `max_photo_bytes`에 맞춥니다.
pub fn patients_router(max_photo_bytes: usize) -> Router<Arc<AppState>> {
    Router::new()
        .route("/patients", get(list_patients).post(create_patient))
        .route("/patients/{id}", get(get_patient))
        .route("/patients/{id}/foto", get(get_patient_foto))
        .layer(DefaultBodyLimit::max(max_photo_bytes + FORM_OVERHEAD_BYTES))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{create_test_state, seed_test_doctor};
    use axum::{
        body::Body,
        http::{Method, Request},
        response::Response,
    };
    use serde_json::Value;
    use tower::ServiceExt;

    const BOUNDARY: &str = "clinic-test-boundary";

    enum Part<'a> {
        Text(&'a str, &'a str),
        File(&'a str, &'a str, &'a [u8]),
    }

    fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match part {
                Part::Text(name, value) => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                            .as_bytes(),
                    );
                }
                Part::File(name, content_type, bytes) => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{name}\"; filename=\"photo\"\r\n\
                             Content-Type: {content_type}\r\n\r\n"
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(bytes);
                    body.extend_from_slice(b"\r\n");
                }
            }
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    struct Fixture {
        state: Arc<AppState>,
        token: String,
    }

    async fn fixture(correo: &str) -> Fixture {
        let state = Arc::new(create_test_state());
        let doctor = seed_test_doctor(&state, correo, "secret123").await;
        let token = state.tokens.issue_default(&doctor.correo).unwrap();
        Fixture { state, token }
    }

    fn app(state: &Arc<AppState>) -> Router {
        patients_router(state.photos.max_bytes()).with_state(state.clone())
    }

    async fn create(state: &Arc<AppState>, token: &str, parts: &[Part<'_>]) -> Response {
        app(state)
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/patients")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .header(
                        header::CONTENT_TYPE,
                        format!("multipart/form-data; boundary={BOUNDARY}"),
                    )
                    .body(Body::from(multipart_body(parts)))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn get_with(state: &Arc<AppState>, token: &str, uri: &str) -> Response {
        app(state)
            .oneshot(
                Request::builder()
                    .uri(uri)
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
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

    fn basic_parts<'a>(dni: &'a str, correo: &'a str) -> Vec<Part<'a>> {
        vec![
            Part::Text("nombre", "Luis Pérez"),
            Part::Text("dni", dni),
            Part::Text("correo", correo),
            Part::Text("fecha_nacimiento", "1990-05-01"),
        ]
    }

    #[test]
    fn test_window_clamps() {
        assert_eq!(ListPatientsQuery::default().window(), (0, 20));
        let q = ListPatientsQuery {
            skip: Some(-5),
            limit: Some(1000),
        };
        assert_eq!(q.window(), (0, 100));
        let q = ListPatientsQuery {
            skip: Some(3),
            limit: Some(0),
        };
        assert_eq!(q.window(), (3, 1));
    }

    #[tokio::test]
    async fn test_create_and_get_patient() {
        let f = fixture("a@x.com").await;
        let response = create(&f.state, &f.token, &basic_parts("111", "luis@x.com")).await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let created = body_json(response).await;
        assert_eq!(created["nombre"], "Luis Pérez");
        assert_eq!(created["fecha_nacimiento"], "1990-05-01");
        assert!(created["foto_url"].is_null());

        let id = created["id"].as_i64().unwrap();
        let response = get_with(&f.state, &f.token, &format!("/patients/{id}")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["dni"], "111");
    }

    #[tokio::test]
    async fn test_create_with_photo_and_fetch_it() {
        let f = fixture("a@x.com").await;
        let mut parts = basic_parts("111", "luis@x.com");
        parts.push(Part::File("foto", "image/png", b"\x89PNG\r\n\x1a\nfake"));

        let response = create(&f.state, &f.token, &parts).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = body_json(response).await;
        let foto_url = created["foto_url"].as_str().unwrap().to_string();

        let response = get_with(&f.state, &f.token, &foto_url).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get(header::CONTENT_TYPE).unwrap(), "image/png");
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"\x89PNG\r\n\x1a\nfake");

        let _ = std::fs::remove_dir_all(f.state.photos.root());
    }

    #[tokio::test]
    async fn test_create_rejects_bad_input() {
        let f = fixture("a@x.com").await;

        // 필수 필드 누락
        let response = create(&f.state, &f.token, &[Part::Text("nombre", "Luis")]).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        // 잘못된 날짜
        let mut parts = basic_parts("111", "luis@x.com");
        parts.push(Part::Text("fecha_nacimiento", "01/05/1990"));
        let response = create(&f.state, &f.token, &parts).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        // 지원하지 않는 사진 형식
        let mut parts = basic_parts("222", "ana@x.com");
        parts.push(Part::File("foto", "image/gif", b"GIF89a"));
        let response = create(&f.state, &f.token, &parts).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_oversized_photo_is_payload_too_large() {
        let f = fixture("a@x.com").await;
        let oversized = vec![0u8; f.state.photos.max_bytes() + 1];
        let mut parts = basic_parts("111", "luis@x.com");
        parts.push(Part::File("foto", "image/png", &oversized[..]));

        let response = create(&f.state, &f.token, &parts).await;
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body_json(response).await["code"], "PAYLOAD_TOO_LARGE");

        // 환자 기록도 생성되지 않음
        let response = get_with(&f.state, &f.token, "/patients").await;
        assert_eq!(body_json(response).await, serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_duplicate_dni_is_conflict() {
        let f = fixture("a@x.com").await;
        create(&f.state, &f.token, &basic_parts("111", "luis@x.com")).await;

        let response = create(&f.state, &f.token, &basic_parts("111", "otro@x.com")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(response).await["message"]
            .as_str()
            .unwrap()
            .contains("dni"));
    }

    #[tokio::test]
    async fn test_other_doctors_patients_are_hidden() {
        let f = fixture("a@x.com").await;
        let other = seed_test_doctor(&f.state, "b@x.com", "secret123").await;
        let other_token = f.state.tokens.issue_default(&other.correo).unwrap();

        let response = create(&f.state, &f.token, &basic_parts("111", "luis@x.com")).await;
        let id = body_json(response).await["id"].as_i64().unwrap();

        let response = get_with(&f.state, &other_token, &format!("/patients/{id}")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = get_with(&f.state, &other_token, "/patients").await;
        assert_eq!(body_json(response).await, serde_json::json!([]));

        let response = get_with(&f.state, &f.token, "/patients?limit=5").await;
        assert_eq!(body_json(response).await.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_requires_authentication() {
        let state = Arc::new(create_test_state());
        let response = app(&state)
            .oneshot(Request::builder().uri("/patients").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_photo_missing_is_not_found() {
        let f = fixture("a@x.com").await;
        let response = create(&f.state, &f.token, &basic_parts("111", "luis@x.com")).await;
        let id = body_json(response).await["id"].as_i64().unwrap();

        let response = get_with(&f.state, &f.token, &format!("/patients/{id}/foto")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
