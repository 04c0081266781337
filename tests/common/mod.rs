#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use cors_proxy::config::Config;
use cors_proxy::server::listener;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_rustls::TlsAcceptor;
use tokio_rustls::rustls::ServerConfig;
use tokio_rustls::rustls::crypto::ring;
use tokio_rustls::rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};

/// Starts the proxy on an ephemeral port and returns its address.
pub async fn spawn_proxy(cfg: Config) -> String {
    let tcp = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = tcp.local_addr().unwrap().to_string();
    let router = Arc::new(listener::build_router(&cfg).unwrap());

    tokio::spawn(listener::serve(tcp, router, cfg.server.max_request_bytes));
    addr
}

/// A one-shot canned HTTP/1.1 upstream. Every request it receives is sent,
/// raw, through the returned channel.
pub async fn spawn_upstream(
    status: u16,
    body: &'static str,
    delay: Duration,
) -> (String, mpsc::UnboundedReceiver<String>) {
    let tcp = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = format!("http://{}", tcp.local_addr().unwrap());
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = tcp.accept().await else {
                return;
            };
            let tx = tx.clone();
            tokio::spawn(async move {
                let raw = read_request(&mut socket).await;
                let _ = tx.send(raw);
                tokio::time::sleep(delay).await;
                write_canned(&mut socket, status, body).await;
            });
        }
    });

    (addr, rx)
}

/// Like `spawn_upstream`, but speaks HTTPS with a freshly generated
/// self-signed certificate for `127.0.0.1`. Failed handshakes are dropped.
pub async fn spawn_tls_upstream(status: u16, body: &'static str) -> String {
    let certified = rcgen::generate_simple_self_signed(vec![
        "localhost".to_string(),
        "127.0.0.1".to_string(),
    ])
    .unwrap();
    let cert: CertificateDer<'static> = certified.cert.der().clone();
    let key = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(certified.key_pair.serialize_der()));

    let config = ServerConfig::builder_with_provider(Arc::new(ring::default_provider()))
        .with_safe_default_protocol_versions()
        .unwrap()
        .with_no_client_auth()
        .with_single_cert(vec![cert], key)
        .unwrap();
    let acceptor = TlsAcceptor::from(Arc::new(config));

    let tcp = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = format!("https://{}", tcp.local_addr().unwrap());

    tokio::spawn(async move {
        loop {
            let Ok((socket, _)) = tcp.accept().await else {
                return;
            };
            let acceptor = acceptor.clone();
            tokio::spawn(async move {
                let Ok(mut tls) = acceptor.accept(socket).await else {
                    return;
                };
                read_request(&mut tls).await;
                write_canned(&mut tls, status, body).await;
            });
        }
    });

    addr
}

async fn write_canned<S: AsyncWrite + Unpin>(socket: &mut S, status: u16, body: &str) {
    let reply = format!(
        "HTTP/1.1 {} Status\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    let _ = socket.write_all(reply.as_bytes()).await;
    let _ = socket.shutdown().await;
}

async fn read_request<S: AsyncRead + Unpin>(socket: &mut S) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    loop {
        let n = socket.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf);
        if let Some(end) = text.find("\r\n\r\n") {
            let head = text[..end].to_ascii_lowercase();
            let content_length = head
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + content_length {
                break;
            }
        }
    }

    String::from_utf8_lossy(&buf).into_owned()
}

/// A parsed proxy response
pub struct Reply {
    pub status: u16,
    pub head: String,
    pub body: String,
}

impl Reply {
    pub fn header(&self, name: &str) -> Option<String> {
        let prefix = format!("{}:", name.to_ascii_lowercase());
        self.head.lines().find_map(|line| {
            line.to_ascii_lowercase()
                .starts_with(&prefix)
                .then(|| line[prefix.len()..].trim().to_string())
        })
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

/// Sends one request with `Connection: close` and reads the full reply.
pub async fn send(proxy: &str, method: &str, path: &str, headers: &[(&str, &str)], body: &str) -> Reply {
    let mut raw = format!("{} {} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n", method, path, proxy);
    for (k, v) in headers {
        raw.push_str(&format!("{}: {}\r\n", k, v));
    }
    if !body.is_empty() {
        raw.push_str(&format!("Content-Length: {}\r\n", body.len()));
    }
    raw.push_str("\r\n");
    raw.push_str(body);

    send_raw(proxy, &raw).await
}

/// Writes `raw` verbatim and reads until the proxy closes the connection.
pub async fn send_raw(proxy: &str, raw: &str) -> Reply {
    let mut stream = TcpStream::connect(proxy).await.unwrap();
    stream.write_all(raw.as_bytes()).await.unwrap();

    let mut out = Vec::new();
    stream.read_to_end(&mut out).await.unwrap();
    let text = String::from_utf8_lossy(&out).into_owned();

    let (head, body) = text.split_once("\r\n\r\n").unwrap();
    let status = head
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap();

    Reply {
        status,
        head: head.to_string(),
        body: body.to_string(),
    }
}

pub fn encode(url: &str) -> String {
    url::form_urlencoded::byte_serialize(url.as_bytes()).collect()
}
