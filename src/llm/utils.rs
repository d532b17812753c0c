use crate::llm::{ApiError, RateLimitHandler};
use anyhow::Result;
use reqwest::{Response, StatusCode};

/// Check response error and log the rate limit status of failed requests.
/// Returns Ok(Response) if successful, or the classified `ApiError` if not.
pub async fn check_response_error<T: RateLimitHandler>(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let rate_limits = T::from_response(&response);
    let response_text = response
        .text()
        .await
        .map_err(|e| ApiError::NetworkError(e.to_string()))?;

    rate_limits.log_status();

    Err(classify_status(status, response_text).into())
}

fn classify_status(status: StatusCode, response_text: String) -> ApiError {
    match status.as_u16() {
        429 => ApiError::RateLimit(response_text),
        401 | 403 => ApiError::Authentication(response_text),
        400 => ApiError::InvalidRequest(response_text),
        // Anthropic reports overload with a non-standard status
        529 => ApiError::Overloaded(response_text),
        _ if status.is_server_error() => ApiError::ServiceError(response_text),
        _ => ApiError::Unknown(format!("Status {status}: {response_text}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_status() {
        assert!(matches!(
            classify_status(StatusCode::TOO_MANY_REQUESTS, String::new()),
            ApiError::RateLimit(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::UNAUTHORIZED, String::new()),
            ApiError::Authentication(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::BAD_REQUEST, String::new()),
            ApiError::InvalidRequest(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::from_u16(529).unwrap(), String::new()),
            ApiError::Overloaded(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::BAD_GATEWAY, String::new()),
            ApiError::ServiceError(_)
        ));

        let err = classify_status(StatusCode::NOT_FOUND, "missing".to_string());
        assert_eq!(err.to_string(), "Unknown error: Status 404 Not Found: missing");
    }
}
