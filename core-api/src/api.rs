//! Typed entry points for the endpoint catalog.

use crate::encoding::ParameterEncoding;
use crate::endpoint::Endpoint;
use crate::request::Request;
use crate::session::Session;
use bridge_traits::http::HttpMethod;
use core_runtime::config::ApiConfig;

pub const PHONE_NUMBER_HEADER: &str = "phone_num";

/// Builds requests for the catalog on top of a [`Session`].
#[derive(Debug, Clone)]
pub struct Api {
    session: Session,
}

impl Api {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    pub fn from_config(config: &ApiConfig) -> Self {
        Self::new(Session::from_config(config))
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Request against `endpoint` carrying the default headers. Method,
    /// parameters and encoding are left to the caller.
    pub fn request(&self, endpoint: Endpoint) -> Request {
        Request::to_endpoint(&self.session, endpoint).headers(self.session.headers())
    }

    /// Asks the server to text a verification code to `phone`.
    pub fn send_sms(&self, phone: impl Into<String>) -> Request {
        Request::to_endpoint(&self.session, Endpoint::SendSms)
            .method(HttpMethod::Get)
            .encoding(ParameterEncoding::Json)
            .headers(
                self.session
                    .headers_with([(PHONE_NUMBER_HEADER.to_string(), phone.into())]),
            )
    }
}
