use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use log::{debug, error, info, warn};
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use url::Url;
use uuid::Uuid;

use crate::certificate::{CertificateError, Identity};
use crate::message::{Handlers, PushMessage};
use crate::request::{PushRequest, RequestError, APNS_ID};
use crate::status::ServiceResult;

/// Failure before the request leaves the client.
#[derive(Error, Debug)]
pub enum PushError {
    /// Wrapped [`crate::CertificateError`].
    #[error("certificate error: {0}")]
    Certificate(#[from] CertificateError),
    /// Wrapped [`crate::RequestError`].
    #[error("request error: {0}")]
    Request(#[from] RequestError),
    /// HTTP client could not be built with the identity.
    #[error("http client error: {0}")]
    Client(#[source] reqwest::Error),
    /// Sending requires a tokio runtime.
    #[error("no tokio runtime: {0}")]
    Runtime(#[from] tokio::runtime::TryCurrentError),
}

/// No response was received: DNS, connection, TLS handshake, timeout or reset.
#[derive(Error, Debug)]
#[error("transport error: {0}")]
pub struct TransportError(#[from] reqwest::Error);

impl TransportError {
    /// Whether the request timed out.
    pub fn is_timeout(&self) -> bool {
        self.0.is_timeout()
    }

    /// Whether the connection could not be established.
    pub fn is_connect(&self) -> bool {
        self.0.is_connect()
    }
}

/// How one send ended. Exactly one of these per send.
#[derive(Debug)]
pub enum Completion {
    /// APNs answered, accepted or not.
    Response(ServiceResult),
    /// No response was received.
    TransportError(TransportError),
    /// [`PendingPush::cancel`] was called before completion.
    Cancelled,
}

impl Completion {
    /// The [`ServiceResult`], if APNs answered.
    pub fn into_response(self) -> Option<ServiceResult> {
        match self {
            Self::Response(r) => Some(r),
            _ => None,
        }
    }
}

/// Identity and request for one message, before anything is sent.
#[derive(Debug)]
pub struct PreparedPush {
    /// Identity presented during the TLS handshake.
    pub identity: Identity,
    /// Request to send.
    pub request: PushRequest,
}

/// A send in flight. Resolves to its [`Completion`].
#[derive(Debug)]
pub struct PendingPush {
    message_id: Uuid,
    handle: JoinHandle<Completion>,
}

impl PendingPush {
    /// Identifier of the message being sent.
    pub fn message_id(&self) -> Uuid {
        self.message_id
    }

    /// Cancels the underlying request. Handlers that have not run yet never will.
    pub fn cancel(&self) {
        self.handle.abort();
    }
}

impl Future for PendingPush {
    type Output = Completion;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.handle).poll(cx) {
            Poll::Ready(Ok(completion)) => Poll::Ready(completion),
            Poll::Ready(Err(e)) if e.is_cancelled() => Poll::Ready(Completion::Cancelled),
            Poll::Ready(Err(e)) => std::panic::resume_unwind(e.into_panic()),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Client to send notifications to APNs.
///
/// Holds configuration only. Each send loads its own identity and builds its
/// own HTTP client around it, so sends with different certificates never
/// share TLS credentials.
#[derive(Clone, Debug, Default)]
pub struct PushClient {
    endpoint: Option<String>,
    timeout: Option<Duration>,
    root_certificates: Vec<Vec<u8>>,
}

impl PushClient {
    /// Create an instance of client
    ///
    /// ```
    /// # use apns::PushClient;
    /// let client = PushClient::new();
    /// ```
    pub fn new() -> Self {
        PushClient::default()
    }

    /// Create an instance of client with builder
    ///
    /// ```
    /// # use std::time::Duration;
    /// # use apns::PushClient;
    /// let client = PushClient::builder()
    ///     .timeout(Duration::from_secs(10))
    ///     .build()
    ///     .unwrap();
    /// ```
    pub fn builder() -> PushClientBuilder {
        PushClientBuilder::default()
    }

    /// Loads the identity and builds the request for `message`.
    pub fn prepare(&self, message: &PushMessage) -> Result<PreparedPush, PushError> {
        let identity =
            Identity::from_pkcs12_file(message.certificate_path(), message.passphrase())?;
        let mut request = PushRequest::build(
            message.topic(),
            message.priority(),
            message.payload(),
            message.device_token(),
            message.environment(),
        )?;
        if let Some(endpoint) = &self.endpoint {
            request = request.with_endpoint(endpoint)?;
        }
        Ok(PreparedPush { identity, request })
    }

    /// Sends `message` to APNs.
    ///
    /// Certificate and payload failures are returned right away and no handler
    /// is called. Everything after that is reported through the returned
    /// [`PendingPush`] and the handlers attached to `message`, which run on a
    /// runtime worker rather than the caller.
    ///
    /// Must be called within a tokio runtime.
    pub fn send(&self, message: &PushMessage) -> Result<PendingPush, PushError> {
        let runtime = Handle::try_current()?;
        let PreparedPush { identity, request } = self.prepare(message)?;

        let mut builder = reqwest::Client::builder()
            .use_native_tls()
            .identity(identity.into_inner());
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        for der in &self.root_certificates {
            let cert = reqwest::Certificate::from_der(der).map_err(PushError::Client)?;
            builder = builder.add_root_certificate(cert);
        }
        let http = builder.build().map_err(PushError::Client)?;

        // the request URL embeds the full device token, never log it
        let message_id = message.id();
        debug!(
            "send {message_id} to {} ({}) token {}",
            message.environment(),
            self.endpoint
                .as_deref()
                .unwrap_or_else(|| message.environment().base_url()),
            token_prefix(message.device_token())
        );
        let handle = runtime.spawn(dispatch(
            http,
            request,
            message.handlers().clone(),
            message_id,
        ));
        Ok(PendingPush { message_id, handle })
    }

    /// Sends `message` and waits for its [`Completion`].
    pub async fn send_and_wait(&self, message: &PushMessage) -> Result<Completion, PushError> {
        Ok(self.send(message)?.await)
    }
}

async fn dispatch(
    http: reqwest::Client,
    request: PushRequest,
    handlers: Handlers,
    message_id: Uuid,
) -> Completion {
    match execute(&http, request).await {
        Ok(result) => {
            if result.is_success() {
                info!(
                    "{message_id} accepted, apns-id {}",
                    result.apns_id.as_deref().unwrap_or("-")
                );
            } else {
                warn!(
                    "{message_id} rejected, {} {}: {}",
                    result.status_code,
                    result.status,
                    result.reason_description().unwrap_or("no reason given")
                );
            }
            if let Some(h) = &handlers.response {
                h(&result);
            }
            Completion::Response(result)
        }
        Err(e) => {
            error!("{message_id} failed: {e}");
            if let Some(h) = &handlers.transport_error {
                h(&e);
            }
            Completion::TransportError(e)
        }
    }
}

async fn execute(
    http: &reqwest::Client,
    request: PushRequest,
) -> Result<ServiceResult, TransportError> {
    let response = http
        .request(request.method, &request.url)
        .headers(request.headers)
        .body(request.body)
        .send()
        .await?;

    let status_code = response.status().as_u16();
    let apns_id = response
        .headers()
        .get(APNS_ID)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = response.bytes().await?;
    Ok(ServiceResult::classify(status_code, apns_id, &body))
}

fn token_prefix(token: &str) -> String {
    token.chars().take(8).collect()
}

/// Builder of [`PushClient`].
#[derive(Debug, Default)]
pub struct PushClientBuilder {
    endpoint: Option<String>,
    timeout: Option<Duration>,
    root_certificates: Vec<Vec<u8>>,
}

impl PushClientBuilder {
    /// Sends to `endpoint` instead of the APNs host of the message environment.
    pub fn endpoint<T>(&mut self, endpoint: T) -> &mut Self
    where
        T: Into<String>,
    {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Request timeout. The transport default applies when unset.
    pub fn timeout(&mut self, timeout: Duration) -> &mut Self {
        self.timeout = Some(timeout);
        self
    }

    /// Trusts the DER-encoded certificate `der` as an extra root when
    /// verifying the server, e.g. a private relay in front of APNs.
    pub fn add_root_certificate<T>(&mut self, der: T) -> &mut Self
    where
        T: Into<Vec<u8>>,
    {
        self.root_certificates.push(der.into());
        self
    }

    /// Builds the [`PushClient`].
    pub fn build(&self) -> Result<PushClient, RequestError> {
        if let Some(endpoint) = &self.endpoint {
            Url::parse(endpoint)?;
        }
        Ok(PushClient {
            endpoint: self.endpoint.clone(),
            timeout: self.timeout,
            root_certificates: self.root_certificates.clone(),
        })
    }
}
