//! 의사 계정 Repository (PostgreSQL)

use async_trait::async_trait;
use clinic_core::{Doctor, NewDoctor};
use sqlx::PgPool;
use tracing::debug;

use super::{map_unique_violation, DoctorRepository, RepositoryError};

const DOCTOR_COLUMNS: &str =
    "id, nombre, especialidad, correo, hashed_pw, clinic_name, creado_el";

/// PostgreSQL 의사 계정 저장소.
#[derive(Debug, Clone)]
pub struct PgDoctorRepository {
    pool: PgPool,
}

impl PgDoctorRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DoctorRepository for PgDoctorRepository {
    async fn find_by_correo(&self, correo: &str) -> Result<Option<Doctor>, RepositoryError> {
        let doctor = sqlx::query_as::<_, Doctor>(&format!(
            "SELECT {DOCTOR_COLUMNS} FROM doctor WHERE correo = $1"
        ))
        .bind(correo)
        .fetch_optional(&self.pool)
        .await?;

        Ok(doctor)
    }

    async fn create(&self, doctor: NewDoctor) -> Result<Doctor, RepositoryError> {
        // 트랜잭션은 commit 전에 drop되면 rollback됩니다.
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, Doctor>(&format!(
            r#"
            INSERT INTO doctor (nombre, especialidad, correo, hashed_pw, clinic_name)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {DOCTOR_COLUMNS}
            "#
        ))
        .bind(&doctor.nombre)
        .bind(&doctor.especialidad)
        .bind(&doctor.correo)
        .bind(&doctor.hashed_pw)
        .bind(&doctor.clinic_name)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_unique_violation)?;

        tx.commit().await?;

        debug!(doctor_id = created.id, "Doctor row inserted");
        Ok(created)
    }
}
