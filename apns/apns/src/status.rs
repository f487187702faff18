use std::fmt;

use serde::Deserialize;

use crate::Reason;

/// Classification of the HTTP status code returned by APNs.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, strum::Display)]
#[strum(serialize_all = "camelCase")]
pub enum ServiceStatus {
    /// 200, or any status code not listed below
    Success,
    /// 400
    BadRequest,
    /// 403
    BadCertificate,
    /// 405
    BadMethod,
    /// 410
    DeviceTokenNoLongerActive,
    /// 413
    BadNotificationPayload,
    /// 429
    TooManyRequests,
    /// 500
    InternalServerError,
    /// 503
    ServiceUnavailable,
}

impl ServiceStatus {
    /// Classifies an HTTP status code.
    ///
    /// Codes APNs does not document fall back to [`ServiceStatus::Success`].
    ///
    /// ```
    /// # use apns::ServiceStatus;
    /// assert_eq!(ServiceStatus::BadRequest, ServiceStatus::from_code(400));
    /// assert_eq!(ServiceStatus::Success, ServiceStatus::from_code(418));
    /// ```
    pub fn from_code(code: u16) -> Self {
        match code {
            400 => Self::BadRequest,
            403 => Self::BadCertificate,
            405 => Self::BadMethod,
            410 => Self::DeviceTokenNoLongerActive,
            413 => Self::BadNotificationPayload,
            429 => Self::TooManyRequests,
            500 => Self::InternalServerError,
            503 => Self::ServiceUnavailable,
            _ => Self::Success,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    reason: Option<String>,
    timestamp: Option<u64>,
}

/// Outcome of one completed exchange with APNs.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ServiceResult {
    /// HTTP status code.
    pub status_code: u16,
    /// Classified status.
    pub status: ServiceStatus,
    /// Reason from the error body, only on rejected requests.
    pub reason: Option<Reason>,
    /// `apns-id` response header.
    pub apns_id: Option<String>,
    /// Milliseconds since the epoch at which APNs last confirmed the token
    /// was no longer valid, only sent along with 410.
    pub unregistered_at: Option<u64>,
}

impl ServiceResult {
    /// Classifies a response from its status code, `apns-id` header and body.
    ///
    /// A missing or malformed body, or an unknown reason, leaves
    /// [`ServiceResult::reason`] empty.
    pub fn classify(status_code: u16, apns_id: Option<String>, body: &[u8]) -> Self {
        let status = ServiceStatus::from_code(status_code);
        if status == ServiceStatus::Success {
            return Self {
                status_code,
                status,
                reason: None,
                apns_id,
                unregistered_at: None,
            };
        }

        let (reason, unregistered_at) = match serde_json::from_slice::<ErrorBody>(body) {
            Ok(b) => (b.reason.as_deref().and_then(Reason::from_reason), b.timestamp),
            Err(_) => (None, None),
        };
        Self {
            status_code,
            status,
            reason,
            apns_id,
            unregistered_at,
        }
    }

    /// Whether APNs accepted the notification.
    pub fn is_success(&self) -> bool {
        self.status == ServiceStatus::Success
    }

    /// Description of [`ServiceResult::reason`], if any.
    pub fn reason_description(&self) -> Option<&'static str> {
        self.reason.map(|r| r.description())
    }
}

impl fmt::Display for ServiceResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.status_code, self.status)?;
        if let Some(reason) = self.reason {
            write!(f, " ({reason})")?;
        }
        if let Some(apns_id) = &self.apns_id {
            write!(f, " apns-id={apns_id}")?;
        }
        Ok(())
    }
}
