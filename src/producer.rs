//! NATS producer for evaluation verdicts

use crate::types::{EvaluationFailure, EvaluationResponse};
use anyhow::Result;
use async_nats::Client;
use serde::Serialize;
use tracing::debug;

/// Publishes verdicts to the caller's reply subject, or to the shared
/// verdict subject when the request carried none
#[derive(Clone)]
pub struct VerdictProducer {
    client: Client,
    subject: String,
}

impl VerdictProducer {
    pub fn new(client: Client, subject: &str) -> Self {
        Self {
            client,
            subject: subject.to_string(),
        }
    }

    /// Publish a scored response
    pub async fn publish(&self, response: &EvaluationResponse, reply: Option<&str>) -> Result<()> {
        let target = self.send(response, reply).await?;

        debug!(
            response_id = %response.response_id,
            request_id = %response.request_id,
            status = response.verdict.status_code,
            subject = %target,
            "Published verdict"
        );

        Ok(())
    }

    /// Publish a failure so the caller is not left waiting
    pub async fn publish_failure(&self, failure: &EvaluationFailure, reply: Option<&str>) -> Result<()> {
        let target = self.send(failure, reply).await?;

        debug!(
            request_id = %failure.request_id,
            kind = %failure.kind,
            subject = %target,
            "Published evaluation failure"
        );

        Ok(())
    }

    async fn send<T: Serialize>(&self, body: &T, reply: Option<&str>) -> Result<String> {
        let payload = serde_json::to_vec(body)?;
        let target = reply.unwrap_or(&self.subject).to_string();

        self.client.publish(target.clone(), payload.into()).await?;
        Ok(target)
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }
}
