//! 의사 계정.
//!
//! 의사는 `correo`(이메일)로 유일하게 식별되며, 세션 토큰의 subject로
//! 사용됩니다. 등록 이후에는 변경되지 않습니다.

use chrono::{DateTime, Utc};
use std::fmt;

/// 저장된 의사 계정.
///
/// `hashed_pw`는 PHC 형식의 해시 문자열이며 평문 비밀번호는 어디에도
/// 저장되지 않습니다. 응답으로 직접 직렬화하지 않고 API 계층의
/// 프로젝션 타입을 통해서만 노출합니다.
#[derive(Clone, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::FromRow))]
pub struct Doctor {
    pub id: i64,
    pub nombre: String,
    pub especialidad: String,
    pub correo: String,
    pub hashed_pw: String,
    pub clinic_name: String,
    pub creado_el: DateTime<Utc>,
}

impl fmt::Debug for Doctor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Doctor")
            .field("id", &self.id)
            .field("nombre", &self.nombre)
            .field("especialidad", &self.especialidad)
            .field("correo", &self.correo)
            .field("hashed_pw", &"[REDACTED]")
            .field("clinic_name", &self.clinic_name)
            .field("creado_el", &self.creado_el)
            .finish()
    }
}

/// 새 의사 계정 입력 (비밀번호는 이미 해싱된 상태).
#[derive(Clone)]
pub struct NewDoctor {
    pub nombre: String,
    pub especialidad: String,
    pub correo: String,
    pub hashed_pw: String,
    pub clinic_name: String,
}

impl fmt::Debug for NewDoctor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewDoctor")
            .field("nombre", &self.nombre)
            .field("especialidad", &self.especialidad)
            .field("correo", &self.correo)
            .field("clinic_name", &self.clinic_name)
            .finish_non_exhaustive()
    }
}

impl NewDoctor {
    /// 주어진 id와 생성 시각으로 저장 레코드를 만듭니다.
    pub fn into_doctor(self, id: i64, creado_el: DateTime<Utc>) -> Doctor {
        Doctor {
            id,
            nombre: self.nombre,
            especialidad: self.especialidad,
            correo: self.correo,
            hashed_pw: self.hashed_pw,
            clinic_name: self.clinic_name,
            creado_el,
        }
    }
}
