//! 인메모리 저장소.
//!
//! `DATABASE_URL`이 설정되지 않았을 때와 테스트에서 사용합니다.
//! PostgreSQL 스키마와 같은 유일 제약을 적용합니다.

use async_trait::async_trait;
use chrono::Utc;
use clinic_core::{Doctor, NewDoctor, NewPatient, Patient};
use tokio::sync::RwLock;

use super::{DoctorRepository, PatientRepository, RepositoryError};

#[derive(Debug)]
struct Table<T> {
    rows: Vec<T>,
    next_id: i64,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            next_id: 0,
        }
    }
}

impl<T> Table<T> {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// 인메모리 의사 계정 저장소.
#[derive(Debug, Default)]
pub struct InMemoryDoctorRepository {
    table: RwLock<Table<Doctor>>,
}

impl InMemoryDoctorRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DoctorRepository for InMemoryDoctorRepository {
    async fn find_by_correo(&self, correo: &str) -> Result<Option<Doctor>, RepositoryError> {
        let table = self.table.read().await;
        Ok(table.rows.iter().find(|d| d.correo == correo).cloned())
    }

    async fn create(&self, doctor: NewDoctor) -> Result<Doctor, RepositoryError> {
        let mut table = self.table.write().await;

        if table.rows.iter().any(|d| d.correo == doctor.correo) {
            return Err(RepositoryError::Conflict { field: "correo" });
        }

        let id = table.allocate_id();
        let created = doctor.into_doctor(id, Utc::now());
        table.rows.push(created.clone());
        Ok(created)
    }
}

/// 인메모리 환자 기록 저장소.
#[derive(Debug, Default)]
pub struct InMemoryPatientRepository {
    table: RwLock<Table<Patient>>,
}

impl InMemoryPatientRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PatientRepository for InMemoryPatientRepository {
    async fn create(&self, patient: NewPatient) -> Result<Patient, RepositoryError> {
        let mut table = self.table.write().await;

        if table.rows.iter().any(|p| p.dni == patient.dni) {
            return Err(RepositoryError::Conflict { field: "dni" });
        }
        if table.rows.iter().any(|p| p.correo == patient.correo) {
            return Err(RepositoryError::Conflict { field: "correo" });
        }

        let id = table.allocate_id();
        let created = patient.into_patient(id, Utc::now());
        table.rows.push(created.clone());
        Ok(created)
    }

    async fn list_by_doctor(
        &self,
        doctor_id: i64,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<Patient>, RepositoryError> {
        let table = self.table.read().await;

        let mut owned: Vec<&Patient> = table
            .rows
            .iter()
            .filter(|p| p.is_owned_by(doctor_id))
            .collect();
        owned.sort_by(|a, b| b.creado_el.cmp(&a.creado_el).then(b.id.cmp(&a.id)));

        Ok(owned
            .into_iter()
            .skip(skip.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn find_for_doctor(
        &self,
        doctor_id: i64,
        patient_id: i64,
    ) -> Result<Option<Patient>, RepositoryError> {
        let table = self.table.read().await;
        Ok(table
            .rows
            .iter()
            .find(|p| p.id == patient_id && p.is_owned_by(doctor_id))
            .cloned())
    }
}
