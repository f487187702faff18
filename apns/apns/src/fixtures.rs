//! PKCS#12 bundles, a mutual TLS server and a log recorder for tests.

use std::fs;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener};
use std::path::PathBuf;
use std::sync::{Mutex, Once};
use std::thread::{self, JoinHandle};

use log::{LevelFilter, Log, Metadata, Record};

use openssl::asn1::Asn1Time;
use openssl::bn::BigNum;
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkcs12::Pkcs12;
use openssl::pkey::{PKey, Private};
use openssl::rsa::Rsa;
use openssl::ssl::{SslAcceptor, SslMethod, SslVerifyMode};
use openssl::stack::Stack;
use openssl::x509::extension::SubjectAlternativeName;
use openssl::x509::{X509NameBuilder, X509};
use tempfile::TempDir;

use crate::certificate::common_name;

fn self_signed(common_name: &str) -> (PKey<Private>, X509) {
    let pkey = PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap();

    let mut name = X509NameBuilder::new().unwrap();
    name.append_entry_by_nid(Nid::COMMONNAME, common_name)
        .unwrap();
    let name = name.build();

    let mut builder = X509::builder().unwrap();
    builder.set_version(2).unwrap();
    let serial = BigNum::from_u32(1).unwrap().to_asn1_integer().unwrap();
    builder.set_serial_number(&serial).unwrap();
    builder.set_subject_name(&name).unwrap();
    builder.set_issuer_name(&name).unwrap();
    builder.set_pubkey(&pkey).unwrap();
    builder
        .set_not_before(&Asn1Time::days_from_now(0).unwrap())
        .unwrap();
    builder
        .set_not_after(&Asn1Time::days_from_now(365).unwrap())
        .unwrap();
    let san = SubjectAlternativeName::new()
        .ip("127.0.0.1")
        .build(&builder.x509v3_context(None, None))
        .unwrap();
    builder.append_extension(san).unwrap();
    builder.sign(&pkey, MessageDigest::sha256()).unwrap();
    (pkey, builder.build())
}

pub(crate) fn pkcs12_der(common_name: &str, passphrase: &str) -> Vec<u8> {
    let (pkey, cert) = self_signed(common_name);
    Pkcs12::builder()
        .name(common_name)
        .pkey(&pkey)
        .cert(&cert)
        .build2(passphrase)
        .unwrap()
        .to_der()
        .unwrap()
}

/// Bundle holding a lone CA certificate and no private key.
pub(crate) fn pkcs12_der_without_identity(passphrase: &str) -> Vec<u8> {
    let (_pkey, cert) = self_signed("ca");
    let mut ca = Stack::new().unwrap();
    ca.push(cert).unwrap();
    Pkcs12::builder()
        .ca(ca)
        .build2(passphrase)
        .unwrap()
        .to_der()
        .unwrap()
}

pub(crate) fn pkcs12_file(common_name: &str, passphrase: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(format!("{common_name}.p12"));
    fs::write(&path, pkcs12_der(common_name, passphrase)).unwrap();
    (dir, path)
}

/// HTTPS server on 127.0.0.1 that demands a client certificate, answers 200 and
/// echoes the client certificate common name in `apns-id`.
pub(crate) struct MutualTlsServer {
    pub(crate) addr: SocketAddr,
    /// DER of the self-signed server certificate, to trust it as a root.
    pub(crate) certificate: Vec<u8>,
    handle: JoinHandle<Vec<String>>,
}

impl MutualTlsServer {
    pub(crate) fn start(connections: usize) -> Self {
        let (pkey, cert) = self_signed("localhost");
        let mut acceptor = SslAcceptor::mozilla_intermediate_v5(SslMethod::tls()).unwrap();
        acceptor.set_private_key(&pkey).unwrap();
        acceptor.set_certificate(&cert).unwrap();
        // client certificates are self-signed, only their presence matters
        acceptor.set_verify_callback(
            SslVerifyMode::PEER | SslVerifyMode::FAIL_IF_NO_PEER_CERT,
            |_, _| true,
        );
        let acceptor = acceptor.build();

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = thread::spawn(move || {
            let mut names = vec![];
            for stream in listener.incoming().take(connections) {
                let mut tls = acceptor.accept(stream.unwrap()).unwrap();
                let name = tls
                    .ssl()
                    .peer_certificate()
                    .and_then(|c| common_name(&c))
                    .unwrap_or_default();
                read_request(&mut tls);
                write!(
                    tls,
                    "HTTP/1.1 200 OK\r\napns-id: {name}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n"
                )
                .unwrap();
                tls.flush().unwrap();
                let _ = tls.shutdown();
                names.push(name);
            }
            names
        });

        Self {
            addr,
            certificate: cert.to_der().unwrap(),
            handle,
        }
    }

    pub(crate) fn url(&self) -> String {
        format!("https://{}", self.addr)
    }

    /// Common names presented by each client, in connection order.
    pub(crate) fn join(self) -> Vec<String> {
        self.handle.join().unwrap()
    }
}

fn read_request<S: Read>(stream: &mut S) {
    let mut head = vec![];
    let mut byte = [0u8; 1];
    while !head.ends_with(b"\r\n\r\n") {
        if stream.read(&mut byte).unwrap() == 0 {
            return;
        }
        head.push(byte[0]);
    }
    let length = String::from_utf8_lossy(&head)
        .to_lowercase()
        .lines()
        .find_map(|l| l.strip_prefix("content-length:").map(|v| v.trim().to_string()))
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(0);
    let mut body = vec![0; length];
    stream.read_exact(&mut body).unwrap();
}

static RECORDS: Mutex<Vec<String>> = Mutex::new(Vec::new());
static RECORDER: Recorder = Recorder;
static INSTALL: Once = Once::new();

struct Recorder;

impl Log for Recorder {
    fn enabled(&self, _: &Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &Record<'_>) {
        RECORDS.lock().unwrap().push(record.args().to_string());
    }

    fn flush(&self) {}
}

/// Installs the process-wide recorder, once.
pub(crate) fn record_logs() {
    INSTALL.call_once(|| {
        log::set_logger(&RECORDER).unwrap();
        log::set_max_level(LevelFilter::Trace);
    });
}

/// Recorded log lines containing `needle`.
pub(crate) fn logged(needle: &str) -> Vec<String> {
    RECORDS
        .lock()
        .unwrap()
        .iter()
        .filter(|r| r.contains(needle))
        .cloned()
        .collect()
}
