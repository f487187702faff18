use reqwest::header::{HeaderMap, HeaderValue, InvalidHeaderValue};
use reqwest::Method;
use thiserror::Error;
use url::Url;

use crate::{Environment, Payload};

/// Request construction error.
#[derive(Error, Debug)]
pub enum RequestError {
    /// Error from [`serde_json`] crate. `Map` and [`crate::ApsPayload`] always
    /// encode, so this only carries errors converted from elsewhere.
    #[error("payload encoding failed: {0}")]
    PayloadEncodingFailed(#[from] serde_json::Error),
    /// Payload must contain an `aps` key.
    #[error("payload has no aps key")]
    MissingAps,
    /// Custom keys of a typed payload must not contain `aps`.
    #[error("custom keys must not contain aps")]
    CustomAps,
    /// Topic cannot be sent as a header value.
    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] InvalidHeaderValue),
    /// Error from [`url`] crate.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
}

/// Header carrying the app bundle identifier.
pub const APNS_TOPIC: &str = "apns-topic";
/// Header carrying the delivery priority.
pub const APNS_PRIORITY: &str = "apns-priority";
/// Response header carrying the identifier APNs assigned.
pub const APNS_ID: &str = "apns-id";

/// HTTP request for one notification, ready for transport.
#[derive(Clone, Debug)]
pub struct PushRequest {
    /// Always POST.
    pub method: Method,
    /// `https://<host>:443/3/device/<token>`
    pub url: String,
    /// `apns-topic` and `apns-priority`.
    pub headers: HeaderMap,
    /// Payload serialized to JSON.
    pub body: Vec<u8>,
    path: String,
}

impl PushRequest {
    /// Builds the request for one notification.
    ///
    /// The device token is appended to the path verbatim.
    ///
    /// ```
    /// # use apns::{ApsPayload, Environment, PushRequest};
    /// let payload = ApsPayload::alert("Hello").into();
    /// let request = PushRequest::build("com.example.app", 10, &payload, "token", Environment::Sandbox).unwrap();
    /// assert_eq!("https://api.development.push.apple.com:443/3/device/token", request.url);
    /// ```
    pub fn build(
        topic: &str,
        priority: u32,
        payload: &Payload,
        device_token: &str,
        environment: Environment,
    ) -> Result<Self, RequestError> {
        let body = serde_json::to_vec(&payload.to_json_map()?)?;

        let mut headers = HeaderMap::new();
        headers.insert(APNS_TOPIC, HeaderValue::from_str(topic)?);
        headers.insert(APNS_PRIORITY, HeaderValue::from(priority));

        let path = format!("/3/device/{device_token}");
        Ok(Self {
            method: Method::POST,
            url: format!("{}{path}", environment.base_url()),
            headers,
            body,
            path,
        })
    }

    /// Sends the request to `endpoint` instead, keeping the path.
    ///
    /// ```
    /// # use apns::{ApsPayload, Environment, PushRequest};
    /// let payload = ApsPayload::alert("Hello").into();
    /// let request = PushRequest::build("com.example.app", 10, &payload, "token", Environment::Sandbox)
    ///     .unwrap()
    ///     .with_endpoint("http://127.0.0.1:8080/")
    ///     .unwrap();
    /// assert_eq!("http://127.0.0.1:8080/3/device/token", request.url);
    /// ```
    pub fn with_endpoint(mut self, endpoint: &str) -> Result<Self, RequestError> {
        Url::parse(endpoint)?;
        self.url = format!("{}{}", endpoint.trim_end_matches('/'), self.path);
        Ok(self)
    }

    /// `/3/device/<token>`
    pub fn path(&self) -> &str {
        &self.path
    }
}
