//! Shared reqwest client for the hosted backend.
//!
//! Every call carries the project's anon key as `apikey`. The bearer token is
//! the caller's access token when signed in, otherwise the anon key, so
//! row-level security sees the right role.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;

use super::dto::ErrorBodyDto;
use crate::domain::user::AccessToken;

/// Connection details for the hosted backend.
#[derive(Clone)]
pub struct BaasClient {
    http: Client,
    base: Url,
    anon_key: Arc<str>,
}

impl std::fmt::Debug for BaasClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BaasClient")
            .field("base", &self.base.as_str())
            .finish_non_exhaustive()
    }
}

/// A failed exchange, before it is mapped onto a port's error type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Failure {
    /// Transport error, timeout, throttling or a 5xx.
    Unavailable(String),
    /// The bearer token was refused.
    Unauthorized(String),
    /// Any other 4xx; carries the backend's own message.
    Rejected(String),
    /// A 2xx body that did not decode.
    Decode(String),
}

impl BaasClient {
    /// Build a client whose requests time out after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        base: Url,
        anon_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base: with_trailing_slash(base),
            anon_key: Arc::from(anon_key.into()),
        })
    }

    /// Project URL the client talks to.
    #[must_use]
    pub const fn base(&self) -> &Url {
        &self.base
    }

    pub(crate) fn endpoint(&self, path: &str) -> Result<Url, Failure> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|err| Failure::Decode(format!("invalid endpoint {path}: {err}")))
    }

    #[must_use]
    pub(crate) fn request(
        &self,
        method: Method,
        url: Url,
        token: Option<&AccessToken>,
    ) -> RequestBuilder {
        let bearer = token.map_or(&*self.anon_key, AccessToken::expose);
        self.http
            .request(method, url)
            .header("apikey", &*self.anon_key)
            .header(AUTHORIZATION, format!("Bearer {bearer}"))
    }

    #[must_use]
    pub(crate) fn json_request(
        &self,
        method: Method,
        url: Url,
        token: Option<&AccessToken>,
    ) -> RequestBuilder {
        self.request(method, url, token)
            .header(CONTENT_TYPE, "application/json")
    }

    /// Send and return the body of a 2xx response.
    pub(crate) async fn send(&self, request: RequestBuilder) -> Result<Vec<u8>, Failure> {
        let response = request.send().await.map_err(map_transport_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        Ok(body.to_vec())
    }

    /// Send and decode a JSON body.
    pub(crate) async fn fetch<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, Failure> {
        let body = self.send(request).await?;
        decode(&body)
    }
}

/// PostgREST equality filter value.
#[must_use]
pub(crate) fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{value}")
}

/// `Prefer` header value for writes whose response body is not needed.
pub(crate) const RETURN_MINIMAL: &str = "return=minimal";

fn with_trailing_slash(mut base: Url) -> Url {
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base
}

pub(crate) fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, Failure> {
    serde_json::from_slice(body).map_err(|err| Failure::Decode(err.to_string()))
}

fn map_transport_error(error: reqwest::Error) -> Failure {
    if error.is_timeout() {
        Failure::Unavailable(format!("timed out: {error}"))
    } else {
        Failure::Unavailable(error.to_string())
    }
}

#[must_use]
pub(crate) fn map_status_error(status: StatusCode, body: &[u8]) -> Failure {
    let message = error_message(status, body);
    match status {
        StatusCode::UNAUTHORIZED => Failure::Unauthorized(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => {
            Failure::Unavailable(format!("status {}: {message}", status.as_u16()))
        }
        _ if status.is_client_error() => Failure::Rejected(message),
        _ => Failure::Unavailable(format!("status {}: {message}", status.as_u16())),
    }
}

/// The backend's own error text, or a compact preview of the body.
fn error_message(status: StatusCode, body: &[u8]) -> String {
    if let Some(text) = serde_json::from_slice::<ErrorBodyDto>(body)
        .ok()
        .and_then(ErrorBodyDto::into_text)
    {
        return text;
    }
    let preview = body_preview(body);
    if preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        preview
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}

/// Map a [`Failure`] onto port error enums that share the usual variants.
macro_rules! impl_from_failure {
    ($($port:ty),* $(,)?) => {
        $(
            impl From<$crate::outbound::baas::client::Failure> for $port {
                fn from(failure: $crate::outbound::baas::client::Failure) -> Self {
                    use $crate::outbound::baas::client::Failure;
                    match failure {
                        Failure::Unavailable(message) => Self::unavailable(message),
                        Failure::Unauthorized(message) => Self::unauthorized(message),
                        Failure::Rejected(message) => Self::rejected(message),
                        Failure::Decode(message) => Self::decode(message),
                    }
                }
            }
        )*
    };
}

pub(crate) use impl_from_failure;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn client(base: &str) -> BaasClient {
        BaasClient::new(
            Url::parse(base).expect("url"),
            "anon",
            Duration::from_secs(1),
        )
        .expect("client")
    }

    #[rstest]
    #[case("https://proj.supabase.co", "https://proj.supabase.co/rest/v1/services")]
    #[case("https://host/prefix", "https://host/prefix/rest/v1/services")]
    #[case("https://host/prefix/", "https://host/prefix/rest/v1/services")]
    fn endpoints_join_under_base(#[case] base: &str, #[case] expected: &str) {
        let url = client(base).endpoint("/rest/v1/services").expect("endpoint");
        assert_eq!(url.as_str(), expected);
    }

    #[rstest]
    #[case(StatusCode::UNAUTHORIZED, r#"{"message":"JWT expired"}"#, Failure::Unauthorized("JWT expired".to_owned()))]
    #[case(
        StatusCode::FORBIDDEN,
        r#"{"code":"42501","message":"new row violates row-level security policy"}"#,
        Failure::Rejected("new row violates row-level security policy".to_owned())
    )]
    #[case(
        StatusCode::BAD_REQUEST,
        r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#,
        Failure::Rejected("Invalid login credentials".to_owned())
    )]
    #[case(StatusCode::UNPROCESSABLE_ENTITY, r#"{"code":422,"msg":"User already registered"}"#, Failure::Rejected("User already registered".to_owned()))]
    #[case(StatusCode::BAD_GATEWAY, "", Failure::Unavailable("status 502: status 502".to_owned()))]
    #[case(StatusCode::TOO_MANY_REQUESTS, "slow down", Failure::Unavailable("status 429: slow down".to_owned()))]
    fn statuses_map_to_failures(
        #[case] status: StatusCode,
        #[case] body: &str,
        #[case] expected: Failure,
    ) {
        assert_eq!(map_status_error(status, body.as_bytes()), expected);
    }

    #[test]
    fn long_bodies_are_truncated() {
        let body = "x".repeat(400);
        let Failure::Rejected(message) = map_status_error(StatusCode::NOT_FOUND, body.as_bytes())
        else {
            panic!("expected rejection");
        };
        assert_eq!(message.chars().count(), 163);
        assert!(message.ends_with("..."));
    }

    #[test]
    fn debug_hides_the_key() {
        let rendered = format!("{:?}", client("https://proj.supabase.co"));
        assert!(!rendered.contains("anon"));
    }
}
