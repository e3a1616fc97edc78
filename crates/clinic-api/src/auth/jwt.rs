//! JWT 세션 토큰 처리.
//!
//! HS256으로 서명된 상태 없는(stateless) access token을 발급하고 검증합니다.
//! 서버에는 토큰이 저장되지 않으며, 만료 시각이 지나면 자연히 무효가 됩니다.
//! 클레임은 암호화되지 않으므로 비밀 정보를 담지 않습니다.

use std::fmt;

use chrono::{Duration, Utc};
use clinic_core::AuthConfig;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// 토큰 서명 알고리즘.
pub const TOKEN_ALGORITHM: Algorithm = Algorithm::HS256;

/// 허용되는 최대 토큰 유효 시간 (1년, 분 단위).
pub const MAX_TOKEN_TTL_MINUTES: i64 = 365 * 24 * 60;

/// JWT Access Token 페이로드.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - 의사 계정 이메일(correo)
    ///
    /// 클레임이 없으면 빈 문자열로 디코딩되며, 세션 해석 단계에서 거부됩니다.
    #[serde(default)]
    pub sub: String,
    /// Issued At (Unix timestamp)
    #[serde(default)]
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// 현재 시각 기준으로 `ttl` 후 만료되는 클레임 생성.
    ///
    /// 음수 `ttl`은 이미 만료된 클레임을 만듭니다.
    pub fn new(subject: impl Into<String>, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: subject.into(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        }
    }
}

/// 토큰 처리 에러.
///
/// 디코딩 실패는 원인(서명 불일치, 형식 오류, 만료)을 구분하지 않습니다.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("토큰 인코딩 실패: {0}")]
    Encoding(#[from] jsonwebtoken::errors::Error),
    #[error("유효하지 않은 토큰")]
    InvalidToken,
    #[error("토큰 유효 시간은 1분 이상 1년 이하여야 합니다 (설정값: {0}분)")]
    InvalidTtl(i64),
}

/// 세션 토큰 코덱.
///
/// 서명 키와 알고리즘은 시작 시 [`AuthConfig`]에서 한 번 주입됩니다.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    default_ttl: Duration,
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &TOKEN_ALGORITHM)
            .field("default_ttl", &self.default_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    /// 인증 설정으로 코덱 생성.
    ///
    /// # Errors
    ///
    /// `token_ttl_minutes`가 1..=[`MAX_TOKEN_TTL_MINUTES`] 범위 밖이면 `TokenError::InvalidTtl`.
    pub fn new(config: &AuthConfig) -> Result<Self, TokenError> {
        let minutes = config.token_ttl_minutes;
        if !(1..=MAX_TOKEN_TTL_MINUTES).contains(&minutes) {
            return Err(TokenError::InvalidTtl(minutes));
        }
        let default_ttl = Duration::minutes(minutes);

        let secret = config.jwt_secret.expose_secret().as_bytes();

        let mut validation = Validation::new(TOKEN_ALGORITHM);
        validation.validate_exp = true;
        // 만료 판정에 유예 시간을 두지 않음
        validation.leeway = 0;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            default_ttl,
        })
    }

    /// 기본 유효 시간.
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// `subject`에 대한 토큰 발급.
    pub fn issue(&self, subject: &str, ttl: Duration) -> Result<String, TokenError> {
        let claims = Claims::new(subject, ttl);
        self.encode_claims(&claims)
    }

    /// 기본 유효 시간으로 토큰 발급.
    pub fn issue_default(&self, subject: &str) -> Result<String, TokenError> {
        self.issue(subject, self.default_ttl)
    }

    /// 임의의 클레임 서명.
    pub fn encode_claims<T: Serialize>(&self, claims: &T) -> Result<String, TokenError> {
        encode(&Header::new(TOKEN_ALGORITHM), claims, &self.encoding_key).map_err(TokenError::from)
    }

    /// 토큰 서명 및 만료 검증 후 클레임 반환.
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!(reason = ?e.kind(), "Token rejected");
                TokenError::InvalidToken
            })
    }
}
