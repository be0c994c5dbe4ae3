//! Turns a settled transport call into the request outcome.
//!
//! The checks run in a fixed order: transport failure, HTTP status, JSON
//! parsing, then the `errorCode`/`errorDescription` envelope. The first one
//! that fails decides the error.

use crate::error::{ApiError, ErrorCode};
use bridge_traits::error::BridgeError;
use bridge_traits::http::HttpResponse;
use serde_json::Value;

pub const ERROR_CODE_FIELD: &str = "errorCode";
pub const ERROR_DESCRIPTION_FIELD: &str = "errorDescription";

/// Classifies the transport result. On success the whole body is returned.
pub fn classify(result: Result<HttpResponse, BridgeError>) -> Result<Value, ApiError> {
    match result {
        Ok(response) => classify_response(&response),
        Err(err) => Err(ApiError::from(err)),
    }
}

pub fn classify_response(response: &HttpResponse) -> Result<Value, ApiError> {
    if !response.is_success() {
        return Err(ApiError::status(response.status));
    }

    let body = parse_body(&response.body)?;
    classify_body(body)
}

/// An empty body reads as JSON `null`.
fn parse_body(bytes: &[u8]) -> Result<Value, ApiError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(bytes).map_err(ApiError::malformed)
}

/// Applies the application envelope to an already parsed body.
pub fn classify_body(body: Value) -> Result<Value, ApiError> {
    let envelope = body.as_object().and_then(|object| {
        let code = object.get(ERROR_CODE_FIELD)?.as_i64()?;
        let description = object.get(ERROR_DESCRIPTION_FIELD)?.as_str()?;
        Some((code, description.to_string()))
    });

    let Some((code, description)) = envelope else {
        return Err(ApiError::parse_error());
    };

    match ApiError::application(ErrorCode::from_raw(code), description) {
        Some(err) => Err(err),
        None => Ok(body),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse::new(status, body.to_string())
    }

    #[test]
    fn test_success_returns_entire_body() {
        let body = r#"{"errorCode":0,"errorDescription":"","user":{"id":7},"extra":[1,2]}"#;
        let value = classify(Ok(response(200, body))).unwrap();

        assert_eq!(
            value,
            json!({"errorCode": 0, "errorDescription": "", "user": {"id": 7}, "extra": [1, 2]})
        );
    }

    #[test]
    fn test_known_application_error() {
        let body = r#"{"errorCode":2,"errorDescription":"Invalid token"}"#;
        let err = classify(Ok(response(200, body))).unwrap_err();

        assert_eq!(err.code(), 2);
        assert_eq!(err.error_code(), Some(ErrorCode::InvalidAccessToken));
        assert_eq!(err.description(), "Invalid token");
    }

    #[test]
    fn test_unknown_code_maps_to_unknown() {
        let body = r#"{"errorCode":17,"errorDescription":"Out of capsules"}"#;
        let err = classify(Ok(response(200, body))).unwrap_err();

        assert_eq!(err.error_code(), Some(ErrorCode::Unknown));
        assert_eq!(err.code(), -99);
        assert_eq!(err.description(), "Out of capsules");
    }

    #[test]
    fn test_missing_envelope_is_parse_error() {
        for body in [
            r#"{"data":1}"#,
            r#"{"errorCode":0}"#,
            r#"{"errorDescription":"x"}"#,
            r#"{"errorCode":"0","errorDescription":"x"}"#,
            r#"{"errorCode":0,"errorDescription":5}"#,
            r#"{"errorCode":1.5,"errorDescription":"x"}"#,
            r#"[1,2,3]"#,
            r#""text""#,
            "",
        ] {
            let err = classify(Ok(response(200, body))).unwrap_err();
            assert_eq!(err, ApiError::parse_error(), "body: {body:?}");
        }
    }

    #[test]
    fn test_non_json_body_is_malformed() {
        let err = classify(Ok(response(200, "<html>oops</html>"))).unwrap_err();
        assert!(matches!(err, ApiError::Malformed { .. }));
        assert!(err.is_transport());
    }

    #[test]
    fn test_status_wins_over_body() {
        let body = r#"{"errorCode":0,"errorDescription":""}"#;
        for status in [199, 300, 404, 500] {
            let err = classify(Ok(response(status, body))).unwrap_err();
            assert_eq!(err, ApiError::status(status));
            assert_eq!(err.code(), i64::from(status));
        }
    }

    #[test]
    fn test_transport_failure() {
        let err = classify(Err(BridgeError::Timeout)).unwrap_err();
        assert_eq!(err.code(), crate::error::transport_code::TIMED_OUT);
    }
}
