//! 환자 사진 저장소.
//!
//! 사진은 `upload_dir` 아래에 서버가 생성한 UUID 파일 이름으로 저장됩니다.
//! 클라이언트가 보낸 파일 이름은 경로로 사용하지 않습니다.

use std::path::{Path, PathBuf};

use clinic_core::StorageConfig;
use tracing::{debug, warn};
use uuid::Uuid;

/// 허용된 사진 형식 (content type, 확장자).
const ALLOWED_TYPES: &[(&str, &str)] = &[
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/webp", "webp"),
];

/// 사진 저장 에러.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("지원하지 않는 사진 형식: {0}")]
    UnsupportedType(String),
    #[error("사진이 너무 큽니다 (최대 {limit} 바이트)")]
    TooLarge { limit: usize },
    #[error("잘못된 파일 이름")]
    InvalidName,
    #[error("파일 I/O 에러: {0}")]
    Io(#[from] std::io::Error),
}

/// content type에 대응하는 확장자 (허용되지 않으면 `None`).
pub fn extension_for(content_type: &str) -> Option<&'static str> {
    ALLOWED_TYPES
        .iter()
        .find(|(ty, _)| ty.eq_ignore_ascii_case(content_type))
        .map(|(_, ext)| *ext)
}

/// 로컬 디스크 사진 저장소.
#[derive(Debug, Clone)]
pub struct PhotoStore {
    root: PathBuf,
    max_bytes: usize,
}

impl PhotoStore {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            root: PathBuf::from(&config.upload_dir),
            max_bytes: config.max_photo_bytes,
        }
    }

    /// 사진 최대 크기 (바이트).
    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 사진 저장 후 생성된 파일 이름 반환.
    pub async fn save(&self, bytes: &[u8], content_type: &str) -> Result<String, StorageError> {
        let ext = extension_for(content_type)
            .ok_or_else(|| StorageError::UnsupportedType(content_type.to_string()))?;

        if bytes.len() > self.max_bytes {
            return Err(StorageError::TooLarge {
                limit: self.max_bytes,
            });
        }

        tokio::fs::create_dir_all(&self.root).await?;

        let name = format!("{}.{}", Uuid::new_v4(), ext);
        tokio::fs::write(self.root.join(&name), bytes).await?;

        debug!(file = %name, size = bytes.len(), "Photo stored");
        Ok(name)
    }

    /// 저장된 사진 읽기.
    pub async fn load(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.resolve(name)?;
        Ok(tokio::fs::read(path).await?)
    }

    /// 저장된 사진 삭제. 실패는 경고 로그만 남깁니다.
    pub async fn remove(&self, name: &str) {
        let path = match self.resolve(name) {
            Ok(path) => path,
            Err(_) => return,
        };
        if let Err(e) = tokio::fs::remove_file(&path).await {
            warn!(file = %name, error = %e, "Failed to remove photo");
        }
    }

    fn resolve(&self, name: &str) -> Result<PathBuf, StorageError> {
        let valid = !name.is_empty()
            && !name.starts_with('.')
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.');
        if !valid {
            return Err(StorageError::InvalidName);
        }
        Ok(self.root.join(name))
    }
}
