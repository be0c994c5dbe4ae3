//! Parameter encoding into the outgoing transport request.

use crate::error::ApiError;
use bridge_traits::http::HttpRequest;
use serde_json::{Map, Value};
use url::form_urlencoded;

const CONTENT_TYPE: &str = "Content-Type";
const JSON_CONTENT_TYPE: &str = "application/json";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=utf-8";

/// How request parameters are put on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParameterEncoding {
    /// Parameters as a JSON object body.
    #[default]
    Json,
    /// Percent-encoded pairs: in the query string for GET, HEAD and DELETE,
    /// in a form body otherwise.
    Form,
}

impl ParameterEncoding {
    /// Applies `params` to `request`.
    ///
    /// Without parameters the request is returned unchanged. An explicit
    /// `Content-Type` header already on the request is kept.
    pub fn encode(
        self,
        mut request: HttpRequest,
        params: Option<&Map<String, Value>>,
    ) -> Result<HttpRequest, ApiError> {
        let Some(params) = params else {
            return Ok(request);
        };

        match self {
            ParameterEncoding::Json => {
                let body = serde_json::to_vec(params).map_err(|e| ApiError::Transport {
                    code: crate::error::transport_code::TRANSPORT_FAILED,
                    description: format!("Failed to encode JSON parameters: {}", e),
                })?;
                set_default_content_type(&mut request, JSON_CONTENT_TYPE);
                Ok(request.body(body))
            }
            ParameterEncoding::Form => {
                let query = form_query(params);
                if request.method.encodes_params_in_url() {
                    if !query.is_empty() {
                        append_query(&mut request.url, &query);
                    }
                    Ok(request)
                } else {
                    set_default_content_type(&mut request, FORM_CONTENT_TYPE);
                    Ok(request.body(query))
                }
            }
        }
    }
}

fn set_default_content_type(request: &mut HttpRequest, value: &str) {
    let present = request
        .headers
        .keys()
        .any(|k| k.eq_ignore_ascii_case(CONTENT_TYPE));
    if !present {
        request
            .headers
            .insert(CONTENT_TYPE.to_string(), value.to_string());
    }
}

fn append_query(url: &mut String, query: &str) {
    match url.find('?') {
        Some(pos) if pos + 1 < url.len() => url.push('&'),
        Some(_) => {}
        None => url.push('?'),
    }
    url.push_str(query);
}

/// Percent-encodes `params` as `key=value` pairs joined by `&`.
pub fn form_query(params: &Map<String, Value>) -> String {
    let mut pairs = Vec::new();
    for (key, value) in params {
        flatten(key.clone(), value, &mut pairs);
    }
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}

fn flatten(key: String, value: &Value, pairs: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (sub, nested) in map {
                flatten(format!("{}[{}]", key, sub), nested, pairs);
            }
        }
        Value::Array(items) => {
            for item in items {
                flatten(format!("{}[]", key), item, pairs);
            }
        }
        Value::String(s) => pairs.push((key, s.clone())),
        Value::Number(n) => pairs.push((key, n.to_string())),
        Value::Bool(b) => pairs.push((key, b.to_string())),
        Value::Null => pairs.push((key, String::new())),
    }
}
