use std::fmt;
use std::str::FromStr as _;

/// Reason given by APNs in the body of a rejected request. <https://developer.apple.com/documentation/usernotifications/handling-notification-responses-from-apns>
#[derive(
    Clone,
    Copy,
    Debug,
    Eq,
    Hash,
    PartialEq,
    strum::AsRefStr,
    strum::EnumIter,
    strum::EnumString,
)]
pub enum Reason {
    /// PayloadEmpty
    PayloadEmpty,
    /// PayloadTooLarge
    PayloadTooLarge,
    /// BadTopic
    BadTopic,
    /// TopicDisallowed
    TopicDisallowed,
    /// BadMessageId
    BadMessageId,
    /// BadExpirationDate
    BadExpirationDate,
    /// BadPriority
    BadPriority,
    /// MissingDeviceToken
    MissingDeviceToken,
    /// BadDeviceToken
    BadDeviceToken,
    /// DeviceTokenNotForTopic
    DeviceTokenNotForTopic,
    /// Unregistered
    Unregistered,
    /// DuplicateHeaders
    DuplicateHeaders,
    /// BadCertificateEnvironment
    BadCertificateEnvironment,
    /// BadCertificate
    BadCertificate,
    /// Forbidden
    Forbidden,
    /// BadPath
    BadPath,
    /// MethodNotAllowed
    MethodNotAllowed,
    /// TooManyRequests
    TooManyRequests,
    /// IdleTimeout
    IdleTimeout,
    /// Shutdown
    Shutdown,
    /// InternalServerError
    InternalServerError,
    /// ServiceUnavailable
    ServiceUnavailable,
    /// MissingTopic
    MissingTopic,
}

impl Reason {
    /// Looks up the reason named by APNs, [`None`] when it is not a known one.
    ///
    /// ```
    /// # use apns::Reason;
    /// assert_eq!(Some(Reason::BadTopic), Reason::from_reason("BadTopic"));
    /// assert_eq!(None, Reason::from_reason("SomethingElse"));
    /// ```
    pub fn from_reason(s: &str) -> Option<Self> {
        Self::from_str(s).ok()
    }

    /// Human-readable description of the reason.
    pub fn description(&self) -> &'static str {
        match self {
            Self::PayloadEmpty => "The message payload was empty.",
            Self::PayloadTooLarge => {
                "The message payload was too large. The maximum payload size is 4096 bytes."
            }
            Self::BadTopic => "The apns-topic was invalid.",
            Self::TopicDisallowed => "Pushing to this topic is not allowed.",
            Self::BadMessageId => "The apns-id value is bad.",
            Self::BadExpirationDate => "The apns-expiration value is bad.",
            Self::BadPriority => "The apns-priority value is bad.",
            Self::MissingDeviceToken => {
                "The device token is not specified in the request :path. \
                 Verify that the :path header contains the device token."
            }
            Self::BadDeviceToken => {
                "The specified device token was bad. Verify that the request contains \
                 a valid token and that the token matches the environment."
            }
            Self::DeviceTokenNotForTopic => "The device token does not match the specified topic.",
            Self::Unregistered => "The device token is inactive for the specified topic.",
            Self::DuplicateHeaders => "One or more headers were repeated.",
            Self::BadCertificateEnvironment => {
                "The client certificate was for the wrong environment."
            }
            Self::BadCertificate => "The certificate was bad.",
            Self::Forbidden => "The specified action is not allowed.",
            Self::BadPath => "The request contained a bad :path value.",
            Self::MethodNotAllowed => "The specified :method was not POST.",
            Self::TooManyRequests => {
                "Too many requests were made consecutively to the same device token."
            }
            Self::IdleTimeout => "Idle time out.",
            Self::Shutdown => "The server is shutting down.",
            Self::InternalServerError => "An internal server error occurred.",
            Self::ServiceUnavailable => "The service is unavailable.",
            Self::MissingTopic => {
                "The apns-topic header of the request was not specified and was required. \
                 The apns-topic header is mandatory when the client is connected using \
                 a certificate that supports multiple topics."
            }
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.as_ref(), self.description())
    }
}
