//! 검증 포함 요청 추출기.

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::ApiError;

/// JSON 본문을 역직렬화한 뒤 `validator`로 검증하는 추출기.
///
/// 형식 오류와 검증 실패는 모두 422(`MalformedInput`)로 응답하며,
/// 핸들러 본문은 실행되지 않습니다.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| ApiError::malformed(rejection.body_text()))?;

        value.validate()?;
        Ok(ValidatedJson(value))
    }
}
