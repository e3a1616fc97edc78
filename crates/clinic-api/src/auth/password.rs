//! 비밀번호 해싱.
//!
//! Argon2id 기반 해싱 및 검증. 해시는 PHC 형식 문자열로, 알고리즘 id와
//! 비용 파라미터, 솔트를 함께 담고 있어 검증 시 별도 파라미터가 필요 없습니다.
//!
//! 해싱은 의도적으로 느리므로(수백 ms) 요청 처리 경로에서는
//! [`CredentialHasher::hash_blocking`] / [`CredentialHasher::verify_blocking`]으로
//! blocking 스레드 풀에서 실행합니다.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use clinic_core::AuthConfig;

/// 비밀번호 처리 에러.
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("잘못된 Argon2 파라미터: {0}")]
    InvalidParams(String),
    #[error("비밀번호 해싱 실패")]
    HashingFailed,
    #[error("해싱 작업이 중단되었습니다")]
    TaskAborted,
}

/// 비밀번호 해셔.
///
/// 비용 파라미터는 설정에서 한 번 결정되어 프로세스 수명 동안 고정됩니다.
#[derive(Debug, Clone)]
pub struct CredentialHasher {
    params: Params,
    /// 존재하지 않는 계정 로그인 시 비교용 해시
    dummy_hash: String,
}

impl CredentialHasher {
    /// 인증 설정으로 해셔 생성.
    ///
    /// # Errors
    ///
    /// 비용 파라미터가 Argon2 허용 범위를 벗어나면 `InvalidParams`.
    pub fn new(config: &AuthConfig) -> Result<Self, PasswordError> {
        let params = Params::new(
            config.argon2_memory_kib,
            config.argon2_iterations,
            config.argon2_parallelism,
            None,
        )
        .map_err(|e| PasswordError::InvalidParams(e.to_string()))?;

        let mut hasher = Self {
            params,
            dummy_hash: String::new(),
        };
        hasher.dummy_hash = hasher.hash("dummy-password-for-timing")?;
        Ok(hasher)
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// 비밀번호 해싱.
    ///
    /// 매 호출마다 새 솔트를 생성하므로 같은 비밀번호라도 결과가 다릅니다.
    ///
    /// ```rust,ignore
    /// let hash = hasher.hash("secret123")?;
    /// // "$argon2id$v=19$m=19456,t=2,p=1$..."
    /// ```
    pub fn hash(&self, plaintext: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);

        let hash = self
            .argon2()
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|_| PasswordError::HashingFailed)?;

        Ok(hash.to_string())
    }

    /// 비밀번호 검증.
    ///
    /// 해시에 포함된 파라미터로 다시 계산하여 비교합니다(상수 시간 비교).
    /// 해시 형식이 잘못되었으면 에러 대신 `false`를 반환합니다.
    pub fn verify(&self, plaintext: &str, hashed: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hashed) else {
            return false;
        };

        self.argon2()
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }

    /// 계정이 없을 때도 실제 검증과 같은 비용을 소모합니다. 항상 `false`.
    pub fn verify_dummy(&self, plaintext: &str) -> bool {
        let _ = self.verify(plaintext, &self.dummy_hash);
        false
    }

    /// blocking 스레드 풀에서 해싱.
    pub async fn hash_blocking(&self, plaintext: String) -> Result<String, PasswordError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&plaintext))
            .await
            .map_err(|_| PasswordError::TaskAborted)?
    }

    /// blocking 스레드 풀에서 검증. `hashed`가 없으면 더미 해시로 비용만 소모합니다.
    pub async fn verify_blocking(&self, plaintext: String, hashed: Option<String>) -> bool {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || match hashed {
            Some(hashed) => hasher.verify(&plaintext, &hashed),
            None => hasher.verify_dummy(&plaintext),
        })
        .await
        .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// 테스트용 저비용 해셔
    fn test_hasher() -> CredentialHasher {
        let config = AuthConfig::with_secret("test").with_argon2_cost(1024, 1, 1);
        CredentialHasher::new(&config).unwrap()
    }

    #[test]
    fn test_hash_and_verify_password() {
        let hasher = test_hasher();
        let hash = hasher.hash("secret123").unwrap();

        assert!(hash.starts_with("$argon2id$v=19$m=1024,t=1,p=1$"));
        assert_ne!(hash, "secret123");
        assert!(hasher.verify("secret123", &hash));
        assert!(!hasher.verify("secret124", &hash));
    }

    #[test]
    fn test_same_password_different_hashes() {
        let hasher = test_hasher();
        let hash1 = hasher.hash("Password1").unwrap();
        let hash2 = hasher.hash("Password1").unwrap();

        // 솔트가 다르므로 해시가 다름
        assert_ne!(hash1, hash2);
        assert!(hasher.verify("Password1", &hash1));
        assert!(hasher.verify("Password1", &hash2));
    }

    #[test]
    fn test_malformed_hash_returns_false() {
        let hasher = test_hasher();
        assert!(!hasher.verify("password", "not-a-valid-hash"));
        assert!(!hasher.verify("password", ""));
        assert!(!hasher.verify("password", "$argon2id$v=19$broken"));
    }

    #[test]
    fn test_verify_uses_embedded_params() {
        // 다른 비용으로 만든 해시도 검증 가능해야 함
        let strong = CredentialHasher::new(
            &AuthConfig::with_secret("test").with_argon2_cost(2048, 2, 1),
        )
        .unwrap();
        let hash = strong.hash("secret123").unwrap();

        assert!(test_hasher().verify("secret123", &hash));
    }

    #[test]
    fn test_invalid_params_rejected() {
        let config = AuthConfig::with_secret("test").with_argon2_cost(1, 0, 0);
        assert!(matches!(
            CredentialHasher::new(&config),
            Err(PasswordError::InvalidParams(_))
        ));
    }

    #[test]
    fn test_verify_dummy_always_false() {
        let hasher = test_hasher();
        assert!(!hasher.verify_dummy("dummy-password-for-timing"));
    }

    #[test]
    fn test_unicode_password() {
        let hasher = test_hasher();
        let hash = hasher.hash("contraseña-ñandú").unwrap();
        assert!(hasher.verify("contraseña-ñandú", &hash));
    }

    #[tokio::test]
    async fn test_blocking_variants() {
        let hasher = test_hasher();
        let hash = hasher.hash_blocking("secret123".to_string()).await.unwrap();

        assert!(
            hasher
                .verify_blocking("secret123".to_string(), Some(hash.clone()))
                .await
        );
        assert!(
            !hasher
                .verify_blocking("wrong".to_string(), Some(hash))
                .await
        );
        assert!(!hasher.verify_blocking("secret123".to_string(), None).await);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(8))]

        #[test]
        fn prop_hash_verifies_only_its_password(p1 in ".{0,32}", p2 in ".{0,32}") {
            let hasher = test_hasher();
            let hash = hasher.hash(&p1).unwrap();

            prop_assert!(hasher.verify(&p1, &hash));
            if p1 != p2 {
                prop_assert!(!hasher.verify(&p2, &hash));
            }
        }
    }
}
