#![deny(
    missing_docs,
    missing_debug_implementations,
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unstable_features,
    unused_import_braces,
    unused_qualifications
)]

//! APNs is an Apple Push Notification service client with certificate authentication in Rust 2021 edition.
//!
//! ```no_run
//! # use apns::{ApsPayload, Completion, PushClient, PushMessage};
//! # async fn run() -> Result<(), apns::PushError> {
//! let mut message = PushMessage::new(
//!     "com.example.app",
//!     "e86ba7b98a8bbc2725481caed7c2b2d906dae1f11339bb11a6918095d6d14933",
//!     ApsPayload::alert("Hello"),
//!     "push.p12",
//!     "123456",
//! );
//! message.on_response(|r| println!("{r}"));
//!
//! match PushClient::new().send(&message)?.await {
//!     Completion::Response(r) => assert!(r.is_success()),
//!     Completion::TransportError(e) => eprintln!("{e}"),
//!     Completion::Cancelled => {}
//! }
//! # Ok(())
//! # }
//! ```

pub use certificate::{CertificateError, Identity};
pub use client::{
    Completion, PendingPush, PreparedPush, PushClient, PushClientBuilder, PushError,
    TransportError,
};
pub use message::{Environment, PushMessage, ResponseHandler, TransportErrorHandler};
pub use payload::{rename_content_available, Aps, ApsPayload, Payload};
pub use reason::Reason;
pub use request::{PushRequest, RequestError, APNS_ID, APNS_PRIORITY, APNS_TOPIC};
pub use status::{ServiceResult, ServiceStatus};

mod certificate;
mod client;
#[cfg(test)]
mod fixtures;
mod message;
mod payload;
mod reason;
mod request;
mod status;
