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

//! ap is a command line application to send notifications to Apple Push Notification service.
//!
//! If the certificate is "push.p12" and the app bundle identifier is "com.example.app",
//!
//! ```
//! $ ap -c push.p12 -p 123456 -t com.example.app --token <device token> -a message
//! ```
//!
//! Or you can set environment variables instead,
//!
//! ```
//! $ export APNS_CERTIFICATE=push.p12
//! $ export APNS_PASSPHRASE=123456
//! $ export APNS_TOPIC=com.example.app
//! $ ap --token <device token> -a message
//! ```
//!
//! Add `--production` to send through the production environment instead of the sandbox.
//!
//! ```
//! $ ap --token <device token> --production -a message
//! ```
//!
//! A raw JSON payload can be given with `--payload` or piped through standard input.
//!
//! For more information,
//!
//! ```
//! $ ap -h
//! ```

use std::path::PathBuf;
use std::time::Duration;

use anyhow::bail;
use clap::Parser;
use log::{debug, Level};
use logging_timer::{finish, stimer};
use serde_json::Value;

use apns::{ApsPayload, Completion, Environment, Payload, PushClient, PushMessage};

#[doc(hidden)]
#[derive(Debug, Parser)]
#[command(about, author, version)]
struct Opts {
    /// PKCS#12 bundle holding the push certificate and its private key.
    #[arg(short, long, env = "APNS_CERTIFICATE")]
    certificate: PathBuf,
    /// Passphrase of the PKCS#12 bundle.
    #[arg(short, long, env = "APNS_PASSPHRASE", default_value = "")]
    passphrase: String,
    /// App bundle identifier.
    #[arg(short, long, env = "APNS_TOPIC")]
    topic: String,
    /// Device token, angle brackets and whitespace are stripped.
    #[arg(short = 'd', long, alias = "device-token")]
    token: String,
    /// 10 to send immediately, 5 to let the device save power.
    #[arg(long, default_value = "10")]
    priority: u32,
    /// Send through the production environment instead of the sandbox.
    #[arg(long)]
    production: bool,
    /// Alert message.
    #[arg(short, long)]
    alert: Option<String>,
    /// Badge number on the app icon.
    #[arg(long)]
    badge: Option<u32>,
    /// Sound to play, e.g. default.
    #[arg(long)]
    sound: Option<String>,
    /// Notification category.
    #[arg(long)]
    category: Option<String>,
    /// Send as a background update notification.
    #[arg(long)]
    content_available: bool,
    /// Raw JSON payload, must contain an aps key. Other payload options are ignored.
    #[arg(long)]
    payload: Option<String>,
    /// Send to this URL instead of the APNs host, e.g. a local mock server.
    #[arg(long)]
    endpoint: Option<String>,
    /// Request timeout in seconds.
    #[arg(long)]
    timeout: Option<u64>,
    /// Verbose.
    #[arg(short, long)]
    verbose: bool,
}

#[doc(hidden)]
fn normalize_token(token: &str) -> String {
    token
        .chars()
        .filter(|c| !matches!(c, '<' | '>') && !c.is_whitespace())
        .collect()
}

#[doc(hidden)]
fn parse_payload(json: &str) -> anyhow::Result<Payload> {
    match serde_json::from_str::<Value>(json)? {
        Value::Object(map) => Ok(Payload::Json(map)),
        _ => bail!("payload must be a JSON object"),
    }
}

#[doc(hidden)]
fn build_payload(opts: &Opts) -> Payload {
    let mut payload = ApsPayload::default();
    payload.aps.alert = opts.alert.clone();
    payload.aps.badge = opts.badge;
    payload.aps.sound = opts.sound.clone();
    payload.aps.category = opts.category.clone();
    payload.aps.content_available = opts.content_available.then(|| 1);
    Payload::Aps(payload)
}

#[doc(hidden)]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use std::io::Read as _;

    pretty_env_logger::init();

    let opts: Opts = Opts::parse();

    let payload = if let Some(ref json) = opts.payload {
        debug!("load payload from command line");
        parse_payload(json)?
    } else if atty::isnt(atty::Stream::Stdin) {
        debug!("load payload from standard input");
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        parse_payload(&buf)?
    } else {
        build_payload(&opts)
    };

    let environment = if opts.production {
        Environment::Production
    } else {
        Environment::Sandbox
    };
    let message = PushMessage::new(
        opts.topic.as_str(),
        normalize_token(&opts.token),
        payload,
        &opts.certificate,
        opts.passphrase.as_str(),
    )
    .with_priority(opts.priority)
    .with_environment(environment);

    let mut builder = PushClient::builder();
    if let Some(ref endpoint) = opts.endpoint {
        builder.endpoint(endpoint.as_str());
    }
    if let Some(timeout) = opts.timeout {
        builder.timeout(Duration::from_secs(timeout));
    }
    let client = builder.build()?;

    let tmr = stimer!(Level::Debug; "PUSH");
    let completion = client.send(&message)?.await;
    finish!(tmr);

    match completion {
        Completion::Response(res) if res.is_success() => {
            if opts.verbose {
                println!("{res}");
            }
        }
        Completion::Response(res) => bail!(format!("{res}")),
        Completion::TransportError(e) => return Err(e.into()),
        Completion::Cancelled => bail!("cancelled"),
    }
    Ok(())
}
