//! Shared HTTP response helpers for the platform clients.
//!
//! Centralizes status-code checks so the clients stay focused on request
//! construction and response mapping.

use crate::error::PlatformError;

/// Check an HTTP response for common error conditions.
///
/// Returns the response unchanged on success. Handles:
/// - **401 / 403** → [`PlatformError::Unauthorized`]
/// - **404** → [`PlatformError::NotFound`] with the request URL
/// - **429** → [`PlatformError::RateLimited`] with `Retry-After` parsing
///   (falls back to 60 s if absent or unparseable)
/// - **Other non-success** → [`PlatformError::Api`] with status and body
pub async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, PlatformError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    if status == 429 {
        return Err(PlatformError::RateLimited {
            retry_after_secs: parse_retry_after(&resp),
        });
    }
    if status == 404 {
        return Err(PlatformError::NotFound(resp.url().path().to_string()));
    }
    let code = status.as_u16();
    let message = resp.text().await.unwrap_or_default();
    if code == 401 || code == 403 {
        return Err(PlatformError::Unauthorized {
            status: code,
            message,
        });
    }
    Err(PlatformError::Api {
        status: code,
        message,
    })
}

/// Parse the `Retry-After` header as seconds, falling back to 60 s.
fn parse_retry_after(resp: &reqwest::Response) -> u64 {
    resp.headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(60)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mock_response(status: u16) -> reqwest::Response {
        reqwest::Response::from(
            ::http::Response::builder()
                .status(status)
                .body("")
                .unwrap(),
        )
    }

    fn mock_response_with_retry_after(status: u16, value: &str) -> reqwest::Response {
        reqwest::Response::from(
            ::http::Response::builder()
                .status(status)
                .header("Retry-After", value)
                .body("")
                .unwrap(),
        )
    }

    #[test]
    fn retry_after_header_is_parsed() {
        assert_eq!(parse_retry_after(&mock_response_with_retry_after(429, "120")), 120);
        assert_eq!(parse_retry_after(&mock_response(429)), 60);
        assert_eq!(
            parse_retry_after(&mock_response_with_retry_after(429, "soon")),
            60
        );
    }

    #[tokio::test]
    async fn rate_limit_maps_to_rate_limited() {
        let err = check_response(mock_response_with_retry_after(429, "30"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PlatformError::RateLimited {
                retry_after_secs: 30
            }
        ));
    }

    #[tokio::test]
    async fn auth_failures_map_to_unauthorized() {
        for status in [401, 403] {
            let err = check_response(mock_response(status)).await.unwrap_err();
            assert!(matches!(err, PlatformError::Unauthorized { .. }));
        }
    }

    #[tokio::test]
    async fn missing_resource_maps_to_not_found() {
        let err = check_response(mock_response(404)).await.unwrap_err();
        assert!(matches!(err, PlatformError::NotFound(_)));
    }

    #[tokio::test]
    async fn server_error_maps_to_api() {
        let err = check_response(mock_response(500)).await.unwrap_err();
        assert!(matches!(err, PlatformError::Api { status: 500, .. }));
    }

    #[tokio::test]
    async fn success_passes_through() {
        assert!(check_response(mock_response(201)).await.is_ok());
        assert!(check_response(mock_response(204)).await.is_ok());
    }
}
