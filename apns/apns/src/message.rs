use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use uuid::Uuid;

use crate::{Payload, ServiceResult, TransportError};

/// APNs environment. A certificate is valid for exactly one of them.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, strum::Display, strum::EnumString)]
pub enum Environment {
    /// api.development.push.apple.com (default)
    #[default]
    #[strum(to_string = "sandbox", serialize = "development")]
    Sandbox,
    /// api.push.apple.com
    #[strum(to_string = "production")]
    Production,
}

impl Environment {
    /// Scheme, host and port of the environment.
    pub fn base_url(&self) -> &'static str {
        match self {
            Self::Sandbox => "https://api.development.push.apple.com:443",
            Self::Production => "https://api.push.apple.com:443",
        }
    }
}

/// Called with the [`ServiceResult`] of a completed exchange.
pub type ResponseHandler = Arc<dyn Fn(&ServiceResult) + Send + Sync>;
/// Called with the [`TransportError`] when no response was received.
pub type TransportErrorHandler = Arc<dyn Fn(&TransportError) + Send + Sync>;

#[derive(Clone, Default)]
pub(crate) struct Handlers {
    pub(crate) response: Option<ResponseHandler>,
    pub(crate) transport_error: Option<TransportErrorHandler>,
}

/// A notification for one device, with the certificate to send it with.
#[derive(Clone)]
pub struct PushMessage {
    id: Uuid,
    topic: String,
    priority: u32,
    payload: Payload,
    device_token: String,
    certificate_path: PathBuf,
    passphrase: String,
    environment: Environment,
    handlers: Handlers,
}

impl PushMessage {
    /// Creates a [`PushMessage`] for the sandbox environment with priority 10.
    ///
    /// The device token is used as is, strip angle brackets and whitespace beforehand.
    ///
    /// ```rust
    /// # use apns::{ApsPayload, Environment, PushMessage};
    /// let message = PushMessage::new(
    ///     "com.example.app",
    ///     "e86ba7b98a8bbc2725481caed7c2b2d906dae1f11339bb11a6918095d6d14933",
    ///     ApsPayload::alert("Hello"),
    ///     "push.p12",
    ///     "123456",
    /// )
    /// .with_priority(5)
    /// .with_environment(Environment::Production);
    /// ```
    pub fn new(
        topic: impl Into<String>,
        device_token: impl Into<String>,
        payload: impl Into<Payload>,
        certificate_path: impl AsRef<Path>,
        passphrase: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            topic: topic.into(),
            priority: 10,
            payload: payload.into(),
            device_token: device_token.into(),
            certificate_path: certificate_path.as_ref().to_path_buf(),
            passphrase: passphrase.into(),
            environment: Environment::default(),
            handlers: Handlers::default(),
        }
    }

    /// Sets the priority, 10 for immediate delivery, 5 to let the device save power.
    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the environment.
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Attaches the handler called with the [`ServiceResult`].
    pub fn on_response<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&ServiceResult) + Send + Sync + 'static,
    {
        self.handlers.response = Some(Arc::new(f));
        self
    }

    /// Attaches the handler called when the exchange fails before any response.
    pub fn on_transport_error<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&TransportError) + Send + Sync + 'static,
    {
        self.handlers.transport_error = Some(Arc::new(f));
        self
    }

    /// Identifier generated for this message, used to correlate log lines.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// App bundle identifier.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Priority.
    pub fn priority(&self) -> u32 {
        self.priority
    }

    /// Payload.
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Device token.
    pub fn device_token(&self) -> &str {
        &self.device_token
    }

    /// Path of the PKCS#12 bundle.
    pub fn certificate_path(&self) -> &Path {
        &self.certificate_path
    }

    pub(crate) fn passphrase(&self) -> &str {
        &self.passphrase
    }

    /// Environment.
    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub(crate) fn handlers(&self) -> &Handlers {
        &self.handlers
    }
}

impl fmt::Debug for PushMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PushMessage")
            .field("id", &self.id)
            .field("topic", &self.topic)
            .field("priority", &self.priority)
            .field("payload", &self.payload)
            .field("device_token", &self.device_token)
            .field("certificate_path", &self.certificate_path)
            .field("environment", &self.environment)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::str::FromStr as _;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::ApsPayload;

    fn build_message() -> PushMessage {
        PushMessage::new(
            "com.example.app",
            "token",
            ApsPayload::alert("message"),
            "push.p12",
            "123456",
        )
    }

    #[test]
    fn t_new() {
        let m = build_message();
        assert_eq!("com.example.app", m.topic());
        assert_eq!("token", m.device_token());
        assert_eq!(10, m.priority());
        assert_eq!(Environment::Sandbox, m.environment());
        assert_eq!(Path::new("push.p12"), m.certificate_path());
        assert!(m.handlers().response.is_none());
        assert!(m.handlers().transport_error.is_none());
    }

    #[test]
    fn t_new_mixed_arguments() {
        let token = String::from("token");
        let m = PushMessage::new(
            "com.example.app",
            token.clone(),
            ApsPayload::alert("message"),
            PathBuf::from("push.p12"),
            String::from("123456"),
        );
        assert_eq!(token, m.device_token());
        assert_eq!("123456", m.passphrase());
    }

    #[test]
    fn t_unique_id() {
        assert_ne!(build_message().id(), build_message().id());
    }

    #[test]
    fn t_debug_hides_passphrase() {
        let s = format!("{:?}", build_message());
        assert!(s.contains("com.example.app"));
        assert!(!s.contains("123456"));
    }

    #[test]
    fn t_handlers() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut m = build_message();
        let c = count.clone();
        m.on_response(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        let r = ServiceResult::classify(200, None, b"");
        if let Some(h) = &m.handlers().response {
            h(&r);
        }
        // clones share handlers
        if let Some(h) = &m.clone().handlers().response {
            h(&r);
        }
        assert_eq!(2, count.load(Ordering::SeqCst));
    }

    #[test]
    fn t_environment() -> Result<(), strum::ParseError> {
        assert_eq!("sandbox", Environment::Sandbox.to_string());
        assert_eq!(Environment::Sandbox, Environment::from_str("sandbox")?);
        assert_eq!(Environment::Sandbox, Environment::from_str("development")?);
        assert_eq!("production", Environment::Production.to_string());
        assert_eq!(Environment::Production, Environment::from_str("production")?);
        assert!(Environment::from_str("staging").is_err());
        Ok(())
    }
}
