// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HTTP transport for the recognition service.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use belegwerk_core::config::RecognitionConfig;
use belegwerk_core::error::{BelegwerkError, Result};
use tracing::{debug, instrument, warn};

use crate::service::{EncodedImage, RecognitionRequest, RecognitionResponse, RecognitionService};

/// POSTs base64-encoded images as JSON to a recognition endpoint.
#[derive(Debug, Clone)]
pub struct HttpRecognitionService {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpRecognitionService {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| BelegwerkError::Config(format!("HTTP client: {err}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key,
        })
    }

    pub fn from_config(config: &RecognitionConfig) -> Result<Self> {
        let endpoint = config
            .endpoint
            .clone()
            .ok_or_else(|| BelegwerkError::Config("recognition endpoint is not set".into()))?;
        Self::new(
            endpoint,
            config.api_key.clone(),
            Duration::from_secs(config.timeout_secs.max(1)),
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl RecognitionService for HttpRecognitionService {
    #[instrument(skip_all, fields(endpoint = %self.endpoint, bytes = image.bytes.len()))]
    async fn recognize(&self, image: &EncodedImage) -> Result<RecognitionResponse> {
        let body = RecognitionRequest {
            image_base64: STANDARD.encode(&image.bytes),
        };

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|err| {
            warn!(error = %err, "recognition request failed");
            BelegwerkError::Extraction(format!("request failed: {err}"))
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, "recognition service returned an error status");
            return Err(BelegwerkError::Extraction(format!("HTTP {status}")));
        }

        let parsed: RecognitionResponse = response
            .json()
            .await
            .map_err(|err| BelegwerkError::Extraction(format!("unreadable response: {err}")))?;
        debug!(success = parsed.success, has_data = parsed.data.is_some(), "recognition response");
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    /// Serve one canned HTTP response and hand back the raw request.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept");
            let mut raw = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.expect("read");
                if n == 0 {
                    break;
                }
                raw.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&raw);
                if let Some(split) = text.find("\r\n\r\n") {
                    let length = text[..split]
                        .lines()
                        .find_map(|line| {
                            let (name, value) = line.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if raw.len() >= split + 4 + length {
                        break;
                    }
                }
            }
            let reply = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(reply.as_bytes()).await.expect("write");
            let _ = tx.send(String::from_utf8_lossy(&raw).into_owned());
        });

        (format!("http://{addr}/recognize"), rx)
    }

    #[tokio::test]
    async fn posts_base64_image_with_bearer_key() {
        let (url, request) = serve_once(
            "200 OK",
            r#"{"success":true,"data":{"transaction_type":"receipt","amount":150.0},"rawText":"TOTAL 150,00"}"#,
        )
        .await;
        let service =
            HttpRecognitionService::new(url, Some("secret".into()), Duration::from_secs(5)).expect("client");

        let response = service
            .recognize(&EncodedImage::new(vec![0xff, 0xd8, 0xff], "image/jpeg"))
            .await
            .expect("recognize");
        assert!(response.success);
        assert_eq!(response.raw_text.as_deref(), Some("TOTAL 150,00"));

        let raw = request.await.expect("request captured");
        assert!(raw.to_ascii_lowercase().contains("authorization: bearer secret"));
        assert!(raw.contains(r#""imageBase64":"/9j/""#));
    }

    #[tokio::test]
    async fn error_status_is_a_transport_error() {
        let (url, _request) = serve_once("503 Service Unavailable", r#"{"error":"overloaded"}"#).await;
        let service = HttpRecognitionService::new(url, None, Duration::from_secs(5)).expect("client");
        let err = service
            .recognize(&EncodedImage::new(vec![1, 2, 3], "image/jpeg"))
            .await
            .expect_err("503");
        assert!(matches!(err, BelegwerkError::Extraction(_)));
    }

    #[test]
    fn missing_endpoint_is_a_config_error() {
        let err = HttpRecognitionService::from_config(&RecognitionConfig::default()).expect_err("no endpoint");
        assert!(matches!(err, BelegwerkError::Config(_)));
    }
}
