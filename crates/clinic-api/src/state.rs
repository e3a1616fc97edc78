//! 모든 핸들러에서 공유되는 애플리케이션 상태.
//!
//! `Arc<AppState>`로 래핑되어 Axum의 State extractor를 통해 주입됩니다.
//! 서명 키와 해싱 비용은 생성 시 한 번 주입되며 이후 변경되지 않습니다.

use std::sync::Arc;

use clinic_core::{AuthConfig, StorageConfig};
use sqlx::PgPool;

use crate::auth::{AuthGate, CredentialHasher, PasswordError, TokenCodec, TokenError};
use crate::repository::{
    DoctorRepository, InMemoryDoctorRepository, InMemoryPatientRepository, PatientRepository,
    PgDoctorRepository, PgPatientRepository,
};
use crate::storage::PhotoStore;

/// 상태 초기화 에러 (잘못된 인증 설정).
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error(transparent)]
    Password(#[from] PasswordError),
    #[error(transparent)]
    Token(#[from] TokenError),
}

/// 애플리케이션 공유 상태.
#[derive(Clone)]
pub struct AppState {
    /// 비밀번호 해셔 (Argon2id)
    pub hasher: Arc<CredentialHasher>,

    /// 세션 토큰 코덱 (HS256)
    pub tokens: Arc<TokenCodec>,

    /// 요청 → 현재 의사 해석기
    pub auth_gate: AuthGate,

    /// 의사 계정 저장소
    pub doctors: Arc<dyn DoctorRepository>,

    /// 환자 기록 저장소
    pub patients: Arc<dyn PatientRepository>,

    /// 환자 사진 저장소
    pub photos: PhotoStore,

    /// 데이터베이스 연결 풀 (없으면 인메모리 저장소 사용 중)
    pub db_pool: Option<PgPool>,

    /// 서버 시작 시간 (업타임 계산용)
    pub started_at: chrono::DateTime<chrono::Utc>,

    /// API 버전
    pub version: String,
}

impl AppState {
    /// 주어진 저장소로 상태 생성.
    ///
    /// # Errors
    ///
    /// Argon2 비용 파라미터가 잘못되었으면 `StateError::Password`,
    /// 토큰 유효 시간이 범위 밖이면 `StateError::Token`.
    pub fn new(
        auth: &AuthConfig,
        storage: &StorageConfig,
        doctors: Arc<dyn DoctorRepository>,
        patients: Arc<dyn PatientRepository>,
    ) -> Result<Self, StateError> {
        let hasher = Arc::new(CredentialHasher::new(auth)?);
        let tokens = Arc::new(TokenCodec::new(auth)?);
        let auth_gate = AuthGate::new(tokens.clone(), doctors.clone());

        Ok(Self {
            hasher,
            tokens,
            auth_gate,
            doctors,
            patients,
            photos: PhotoStore::new(storage),
            db_pool: None,
            started_at: chrono::Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        })
    }

    /// 인메모리 저장소로 상태 생성 (DB 미설정 시, 테스트용).
    pub fn in_memory(auth: &AuthConfig, storage: &StorageConfig) -> Result<Self, StateError> {
        Self::new(
            auth,
            storage,
            Arc::new(InMemoryDoctorRepository::new()),
            Arc::new(InMemoryPatientRepository::new()),
        )
    }

    /// PostgreSQL 저장소로 상태 생성.
    pub fn postgres(
        auth: &AuthConfig,
        storage: &StorageConfig,
        pool: PgPool,
    ) -> Result<Self, StateError> {
        let mut state = Self::new(
            auth,
            storage,
            Arc::new(PgDoctorRepository::new(pool.clone())),
            Arc::new(PgPatientRepository::new(pool.clone())),
        )?;
        state.db_pool = Some(pool);
        Ok(state)
    }

    /// 서버 업타임(초) 반환.
    pub fn uptime_secs(&self) -> i64 {
        chrono::Utc::now()
            .signed_duration_since(self.started_at)
            .num_seconds()
    }

    /// 데이터베이스 연결 상태 확인.
    pub async fn is_db_healthy(&self) -> bool {
        if let Some(pool) = &self.db_pool {
            sqlx::query("SELECT 1").fetch_one(pool).await.is_ok()
        } else {
            false
        }
    }
}

/// 테스트용 AppState 생성 헬퍼.
///
/// 저비용 Argon2 파라미터, 인메모리 저장소, 임시 업로드 디렉토리를 사용합니다.
#[cfg(any(test, feature = "test-utils"))]
pub fn create_test_state() -> AppState {
    let auth = AuthConfig::with_secret("test-secret-key-for-handlers-minimum-32-chars")
        .with_argon2_cost(1024, 1, 1);
    let storage = StorageConfig {
        upload_dir: std::env::temp_dir()
            .join(format!("clinic-test-uploads-{}", uuid::Uuid::new_v4()))
            .to_string_lossy()
            .into_owned(),
        ..StorageConfig::default()
    };

    AppState::in_memory(&auth, &storage).expect("test auth config is valid")
}

/// 테스트용 의사 계정 등록 헬퍼.
#[cfg(any(test, feature = "test-utils"))]
pub async fn seed_test_doctor(state: &AppState, correo: &str, password: &str) -> clinic_core::Doctor {
    let hashed_pw = state.hasher.hash(password).expect("hashing succeeds");
    state
        .doctors
        .create(clinic_core::NewDoctor {
            nombre: "Ana Torres".to_string(),
            especialidad: "Medicina General".to_string(),
            correo: correo.to_string(),
            hashed_pw,
            clinic_name: "Clínica Prevenia".to_string(),
        })
        .await
        .expect("seed doctor is unique")
}
