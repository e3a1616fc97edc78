//! 환자 기록.
//!
//! 환자는 정확히 한 명의 의사에게 속합니다. `dni`와 `correo`는 의사별이
//! 아니라 전체 환자 집합에서 유일해야 합니다.

use chrono::{DateTime, NaiveDate, Utc};

/// 저장된 환자 기록.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::FromRow))]
pub struct Patient {
    pub id: i64,
    /// 소유 의사 id
    pub doctor_id: i64,
    pub nombre: String,
    pub dni: String,
    pub correo: String,
    pub telefono: Option<String>,
    pub fecha_nacimiento: Option<NaiveDate>,
    /// 업로드 디렉토리 기준 사진 파일 이름
    pub foto_path: Option<String>,
    pub foto_content_type: Option<String>,
    pub creado_el: DateTime<Utc>,
}

impl Patient {
    /// 해당 의사가 이 환자의 소유자인지 확인.
    pub fn is_owned_by(&self, doctor_id: i64) -> bool {
        self.doctor_id == doctor_id
    }

    /// 사진이 첨부되어 있는지 확인.
    pub fn has_foto(&self) -> bool {
        self.foto_path.is_some()
    }
}

/// 새 환자 입력.
#[derive(Debug, Clone)]
pub struct NewPatient {
    pub doctor_id: i64,
    pub nombre: String,
    pub dni: String,
    pub correo: String,
    pub telefono: Option<String>,
    pub fecha_nacimiento: Option<NaiveDate>,
    pub foto_path: Option<String>,
    pub foto_content_type: Option<String>,
}

impl NewPatient {
    pub fn into_patient(self, id: i64, creado_el: DateTime<Utc>) -> Patient {
        Patient {
            id,
            doctor_id: self.doctor_id,
            nombre: self.nombre,
            dni: self.dni,
            correo: self.correo,
            telefono: self.telefono,
            fecha_nacimiento: self.fecha_nacimiento,
            foto_path: self.foto_path,
            foto_content_type: self.foto_content_type,
            creado_el,
        }
    }
}
