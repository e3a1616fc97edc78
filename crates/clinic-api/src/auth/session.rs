//! 세션 해석.
//!
//! `Authorization` 헤더에서 bearer 토큰을 꺼내고, 토큰을 검증해 subject를
//! 추출합니다. I/O 없이 입력과 서명 키만으로 결정됩니다.

use axum::http::{header::AUTHORIZATION, HeaderMap};

use super::{AuthError, AuthFailure, TokenCodec};

/// Authorization 헤더의 bearer 스킴.
const BEARER_SCHEME: &str = "Bearer";

/// `Authorization: Bearer <token>` 헤더에서 토큰 추출.
///
/// 헤더가 없으면 `MissingToken`, 스킴이 다르거나 토큰이 비어 있으면
/// `MalformedHeader`로 실패합니다. 스킴 비교는 대소문자를 구분하지 않습니다.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::Unauthenticated(AuthFailure::MissingToken))?
        .to_str()
        .map_err(|_| AuthError::Unauthenticated(AuthFailure::MalformedHeader))?;

    let (scheme, token) = value
        .split_once(' ')
        .ok_or(AuthError::Unauthenticated(AuthFailure::MalformedHeader))?;

    let token = token.trim();
    if !scheme.eq_ignore_ascii_case(BEARER_SCHEME) || token.is_empty() {
        return Err(AuthError::Unauthenticated(AuthFailure::MalformedHeader));
    }

    Ok(token)
}

/// 토큰을 검증하고 subject(의사 correo)를 반환.
///
/// 서명/형식/만료 검증에 실패하거나, 구조상 유효하더라도 `sub` 클레임이
/// 없거나 비어 있으면 거부합니다.
pub fn resolve_subject(codec: &TokenCodec, raw_token: &str) -> Result<String, AuthError> {
    let claims = codec
        .decode(raw_token)
        .map_err(|_| AuthError::Unauthenticated(AuthFailure::InvalidToken))?;

    if claims.sub.trim().is_empty() {
        return Err(AuthError::Unauthenticated(AuthFailure::MissingSubject));
    }

    Ok(claims.sub)
}
