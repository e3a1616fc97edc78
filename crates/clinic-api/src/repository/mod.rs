//! 저장소 계층.
//!
//! 인증 관문과 라우트는 트레이트를 통해서만 저장소에 접근합니다.
//! PostgreSQL 구현(`sqlx`)과 DB 미설정/테스트용 인메모리 구현이 있습니다.

mod doctors;
mod memory;
mod patients;

pub use doctors::PgDoctorRepository;
pub use memory::{InMemoryDoctorRepository, InMemoryPatientRepository};
pub use patients::PgPatientRepository;

use async_trait::async_trait;
use clinic_core::{Doctor, NewDoctor, NewPatient, Patient};

/// 저장소 에러.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// 유일 제약 위반 (필드 이름 포함)
    #[error("중복된 값: {field}")]
    Conflict { field: &'static str },
    #[error("데이터베이스 에러: {0}")]
    Database(#[from] sqlx::Error),
}

/// 의사 계정 저장소.
///
/// `find_by_correo`는 세션 subject → 계정 매핑의 유일한 근거입니다.
#[async_trait]
pub trait DoctorRepository: Send + Sync {
    /// correo로 계정 조회.
    async fn find_by_correo(&self, correo: &str) -> Result<Option<Doctor>, RepositoryError>;

    /// 계정 생성. correo가 이미 있으면 `Conflict { field: "correo" }`.
    async fn create(&self, doctor: NewDoctor) -> Result<Doctor, RepositoryError>;
}

/// 환자 기록 저장소.
#[async_trait]
pub trait PatientRepository: Send + Sync {
    /// 환자 생성. dni/correo가 전체 환자 중 중복이면 `Conflict`.
    async fn create(&self, patient: NewPatient) -> Result<Patient, RepositoryError>;

    /// 의사 소유 환자 목록 (최신순).
    async fn list_by_doctor(
        &self,
        doctor_id: i64,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<Patient>, RepositoryError>;

    /// 의사 소유 환자 단건 조회. 다른 의사의 환자는 `None`.
    async fn find_for_doctor(
        &self,
        doctor_id: i64,
        patient_id: i64,
    ) -> Result<Option<Patient>, RepositoryError>;
}

/// 유일 제약 위반을 `Conflict`로 변환.
///
/// 제약 이름은 `migrations/`의 스키마 정의와 일치해야 합니다.
pub(crate) fn map_unique_violation(err: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            let field = match db_err.constraint() {
                Some("uq_doctor_correo") | Some("uq_patient_correo") => "correo",
                Some("uq_patient_dni") => "dni",
                _ => "unknown",
            };
            return RepositoryError::Conflict { field };
        }
    }
    RepositoryError::Database(err)
}
