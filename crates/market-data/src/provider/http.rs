//! 어댑터 공용 HTTP 헬퍼.

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::error::FetchError;

/// 브라우저 User-Agent. Yahoo는 기본 UA 요청을 거부합니다.
pub(crate) const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// 타임아웃이 설정된 HTTP 클라이언트 생성.
pub(crate) fn build_client(timeout: Duration) -> Result<Client, FetchError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(BROWSER_USER_AGENT)
        .build()
        .map_err(|e| FetchError::Network(format!("HTTP 클라이언트 생성 실패: {}", e)))
}

/// 요청을 보내고 JSON 응답을 디코딩합니다.
///
/// 429는 `RateLimited`, 그 외 2xx가 아닌 응답은 `Status`, 디코딩 실패는 `Malformed`.
pub(crate) async fn get_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, FetchError> {
    let response = request.send().await?;
    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(FetchError::RateLimited);
    }
    if !status.is_success() {
        return Err(FetchError::Status(status.as_u16()));
    }

    let body = response.text().await?;
    Ok(serde_json::from_str(&body)?)
}

/// 기본 URL과 경로를 이어 붙입니다 (중복 슬래시 제거).
pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
