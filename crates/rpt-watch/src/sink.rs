// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::batch::AlertBatch;
use crate::error::DeliveryError;
use crate::http_utils::status_and_body;

/// Wait used when a rate limited reply does not say how long to back off.
const DEFAULT_RATE_LIMIT_WAIT: Duration = Duration::from_secs(1);

#[async_trait]
pub trait BatchSink: Send + Sync {
    /// Delivers one non-empty batch to `endpoint`. Failed batches are not retried.
    async fn deliver(&self, batch: &AlertBatch, endpoint: &str) -> Result<(), DeliveryError>;
}

#[derive(Deserialize)]
struct RateLimitBody {
    retry_after: Option<f64>,
}

enum Attempt {
    Delivered,
    RateLimited(Option<f64>),
}

/// Posts batches as embeds to a chat webhook.
///
/// A rate limited call is sent once more after the webhook's `retry_after`,
/// waiting no longer than `max_wait`.
#[derive(Debug, Clone)]
pub struct WebhookSink {
    client: reqwest::Client,
    max_wait: Duration,
}

impl WebhookSink {
    pub fn new(client: reqwest::Client, max_wait: Duration) -> Self {
        Self { client, max_wait }
    }

    async fn attempt(&self, batch: &AlertBatch, endpoint: &str) -> Result<Attempt, DeliveryError> {
        let response = self
            .client
            .post(endpoint)
            .json(&batch.payload())
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(Attempt::Delivered),
            StatusCode::TOO_MANY_REQUESTS => Ok(Attempt::RateLimited(retry_after(response).await)),
            _ => {
                let (status, body) = status_and_body(response).await;
                Err(DeliveryError::Status { status, body })
            }
        }
    }

    fn rate_limit_wait(&self, retry_after: Option<f64>) -> Duration {
        retry_after
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
            .unwrap_or(DEFAULT_RATE_LIMIT_WAIT)
            .min(self.max_wait)
    }
}

/// Back-off in seconds, from the JSON body or else the `Retry-After` header.
async fn retry_after(response: Response) -> Option<f64> {
    let header = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<f64>().ok());
    let body = response
        .json::<RateLimitBody>()
        .await
        .ok()
        .and_then(|body| body.retry_after);
    body.or(header)
}

#[async_trait]
impl BatchSink for WebhookSink {
    async fn deliver(&self, batch: &AlertBatch, endpoint: &str) -> Result<(), DeliveryError> {
        let time = Instant::now();
        if let Attempt::RateLimited(retry_after) = self.attempt(batch, endpoint).await? {
            let wait = self.rate_limit_wait(retry_after);
            debug!("Webhook | Rate limited, resending in {} ms", wait.as_millis());
            tokio::time::sleep(wait).await;

            if let Attempt::RateLimited(retry_after) = self.attempt(batch, endpoint).await? {
                return Err(DeliveryError::RateLimited { retry_after });
            }
        }

        debug!(
            "Webhook | Delivered {} embeds in {} ms",
            batch.len(),
            time.elapsed().as_millis()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::{pack, NotificationMessage};
    use crate::http_utils::build_client;
    use mockito::{Matcher, Server};
    use std::time::Duration;

    fn sink() -> WebhookSink {
        sink_waiting_at_most(Duration::from_secs(5))
    }

    fn sink_waiting_at_most(max_wait: Duration) -> WebhookSink {
        WebhookSink::new(build_client(None, Duration::from_secs(5)).unwrap(), max_wait)
    }

    fn batch(descriptions: &[&str]) -> AlertBatch {
        let messages = descriptions
            .iter()
            .map(|description| NotificationMessage::new(description.to_string()))
            .collect();
        pack(messages).remove(0)
    }

    #[tokio::test]
    async fn test_posts_embeds() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/webhooks/1/token")
            .match_header("Content-Type", "application/json")
            .match_body(Matcher::Json(serde_json::json!({
                "embeds": [{"description": "first"}, {"description": "second"}]
            })))
            .with_status(204)
            .create_async()
            .await;

        let endpoint = format!("{}/api/webhooks/1/token", server.url());
        let result = sink().deliver(&batch(&["first", "second"]), &endpoint).await;

        assert!(result.is_ok());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_rate_limited_batch_is_resent_after_wait() {
        let mut server = Server::new_async().await;
        let limited = server
            .mock("POST", "/hook")
            .with_status(429)
            .with_body(r#"{"message": "You are being rate limited.", "retry_after": 0.05, "global": false}"#)
            .expect(1)
            .create_async()
            .await;
        let accepted = server
            .mock("POST", "/hook")
            .match_body(Matcher::Json(serde_json::json!({
                "embeds": [{"description": "only"}]
            })))
            .with_status(204)
            .expect(1)
            .create_async()
            .await;

        let endpoint = format!("{}/hook", server.url());
        let time = Instant::now();
        let result = sink().deliver(&batch(&["only"]), &endpoint).await;

        assert!(result.is_ok());
        assert!(time.elapsed() >= Duration::from_millis(50));
        limited.assert_async().await;
        accepted.assert_async().await;
    }

    #[tokio::test]
    async fn test_rate_limited_twice() {
        let mut server = Server::new_async().await;
        let limited = server
            .mock("POST", "/hook")
            .with_status(429)
            .with_body(r#"{"message": "You are being rate limited.", "retry_after": 0.01, "global": false}"#)
            .expect(2)
            .create_async()
            .await;

        let endpoint = format!("{}/hook", server.url());
        let result = sink().deliver(&batch(&["only"]), &endpoint).await;

        match result {
            Err(DeliveryError::RateLimited { retry_after }) => {
                assert_eq!(retry_after, Some(0.01))
            }
            other => panic!("unexpected result: {other:?}"),
        }
        limited.assert_async().await;
    }

    #[tokio::test]
    async fn test_rate_limit_wait_is_capped() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/hook")
            .with_status(429)
            .with_header("Retry-After", "3600")
            .expect(1)
            .create_async()
            .await;
        let accepted = server
            .mock("POST", "/hook")
            .with_status(204)
            .expect(1)
            .create_async()
            .await;

        let endpoint = format!("{}/hook", server.url());
        let sink = sink_waiting_at_most(Duration::from_millis(20));
        let result = tokio::time::timeout(
            Duration::from_secs(5),
            sink.deliver(&batch(&["only"]), &endpoint),
        )
        .await
        .expect("capped wait exceeded");

        assert!(result.is_ok());
        accepted.assert_async().await;
    }

    #[tokio::test]
    async fn test_rejected_batch() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/hook")
            .with_status(400)
            .with_body("embed too long")
            .create_async()
            .await;

        let endpoint = format!("{}/hook", server.url());
        let result = sink().deliver(&batch(&["only"]), &endpoint).await;

        match result {
            Err(DeliveryError::Status { status, body }) => {
                assert_eq!(status, StatusCode::BAD_REQUEST);
                assert_eq!(body, "embed too long");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
