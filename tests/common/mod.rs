//! In-process stand-in for the chat-completion endpoint.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Notify;

#[derive(Debug, Clone)]
pub struct Recorded {
    pub authorization: Option<String>,
    pub body: serde_json::Value,
}

pub struct MockInference {
    pub url: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
    gate: Option<Arc<Notify>>,
}

impl MockInference {
    /// Reply to every request with `status` and `body`.
    pub async fn start(status: u16, body: &str) -> Self {
        Self::spawn(status, body.to_string(), None).await
    }

    /// Like [`start`](Self::start), but each reply waits for [`release`](Self::release).
    pub async fn gated(status: u16, body: &str) -> Self {
        Self::spawn(status, body.to_string(), Some(Arc::new(Notify::new()))).await
    }

    async fn spawn(status: u16, body: String, gate: Option<Arc<Notify>>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/v1/chat/completions", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let (log, g) = (requests.clone(), gate.clone());
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else { break };
                let (log, g, body) = (log.clone(), g.clone(), body.clone());
                tokio::spawn(async move {
                    serve_one(stream, status, &body, log, g).await;
                });
            }
        });
        Self { url, requests, gate }
    }

    pub fn release(&self) {
        if let Some(g) = &self.gate {
            g.notify_one();
        }
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn inference(&self) -> code_coach::config::InferenceConfig {
        code_coach::config::InferenceConfig {
            endpoint: self.url.clone(),
            api_token: "test-token".into(),
            ..Default::default()
        }
    }
}

async fn serve_one(
    mut stream: TcpStream,
    status: u16,
    body: &str,
    log: Arc<Mutex<Vec<Recorded>>>,
    gate: Option<Arc<Notify>>,
) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let (head_len, content_length, authorization) = loop {
        let n = stream.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            return;
        }
        buf.extend_from_slice(&chunk[..n]);
        let mut headers = [httparse::EMPTY_HEADER; 32];
        let mut req = httparse::Request::new(&mut headers);
        if let Ok(httparse::Status::Complete(len)) = req.parse(&buf) {
            let header = |name: &str| {
                req.headers
                    .iter()
                    .find(|h| h.name.eq_ignore_ascii_case(name))
                    .map(|h| String::from_utf8_lossy(h.value).to_string())
            };
            let cl = header("content-length").and_then(|v| v.parse().ok()).unwrap_or(0usize);
            break (len, cl, header("authorization"));
        }
    };
    while buf.len() < head_len + content_length {
        let n = stream.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            return;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let json = serde_json::from_slice(&buf[head_len..head_len + content_length])
        .unwrap_or(serde_json::Value::Null);
    log.lock().unwrap().push(Recorded { authorization, body: json });

    if let Some(g) = gate {
        g.notified().await;
    }
    let response = format!(
        "HTTP/1.1 {status} Mock\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}

/// A completion body whose first choice carries `text`.
pub fn reply(text: &str) -> String {
    serde_json::json!({ "choices": [{ "message": { "role": "assistant", "content": text } }] }).to_string()
}
