//! 환자 기록 Repository (PostgreSQL)

use async_trait::async_trait;
use clinic_core::{NewPatient, Patient};
use sqlx::PgPool;
use tracing::debug;

use super::{map_unique_violation, PatientRepository, RepositoryError};

const PATIENT_COLUMNS: &str = "id, doctor_id, nombre, dni, correo, telefono, \
     fecha_nacimiento, foto_path, foto_content_type, creado_el";

/// PostgreSQL 환자 기록 저장소.
#[derive(Debug, Clone)]
pub struct PgPatientRepository {
    pool: PgPool,
}

impl PgPatientRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PatientRepository for PgPatientRepository {
    async fn create(&self, patient: NewPatient) -> Result<Patient, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, Patient>(&format!(
            r#"
            INSERT INTO patient
                (doctor_id, nombre, dni, correo, telefono, fecha_nacimiento,
                 foto_path, foto_content_type)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {PATIENT_COLUMNS}
            "#
        ))
        .bind(patient.doctor_id)
        .bind(&patient.nombre)
        .bind(&patient.dni)
        .bind(&patient.correo)
        .bind(&patient.telefono)
        .bind(patient.fecha_nacimiento)
        .bind(&patient.foto_path)
        .bind(&patient.foto_content_type)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_unique_violation)?;

        tx.commit().await?;

        debug!(patient_id = created.id, doctor_id = created.doctor_id, "Patient row inserted");
        Ok(created)
    }

    async fn list_by_doctor(
        &self,
        doctor_id: i64,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<Patient>, RepositoryError> {
        let patients = sqlx::query_as::<_, Patient>(&format!(
            r#"
            SELECT {PATIENT_COLUMNS}
            FROM patient
            WHERE doctor_id = $1
            ORDER BY creado_el DESC, id DESC
            OFFSET $2
            LIMIT $3
            "#
        ))
        .bind(doctor_id)
        .bind(skip)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(patients)
    }

    async fn find_for_doctor(
        &self,
        doctor_id: i64,
        patient_id: i64,
    ) -> Result<Option<Patient>, RepositoryError> {
        let patient = sqlx::query_as::<_, Patient>(&format!(
            "SELECT {PATIENT_COLUMNS} FROM patient WHERE id = $1 AND doctor_id = $2"
        ))
        .bind(patient_id)
        .bind(doctor_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(patient)
    }
}
