// This file is part of the terraform-provider-vra project
//
// Copyright (C) ANEO, 2024-2024. All rights reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License")
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Completion of asynchronous requests.
//!
//! Creating a machine, a network or a load balancer only enqueues a request on
//! the server. The request tracker is then polled until it reaches `FINISHED`
//! or `FAILED`.

use std::time::Duration;

use crate::client::{models::RequestTracker, ApiClient};
use crate::error::VraError;
use crate::resource::expand::strip_id;

/// Pacing of the request tracker polling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Wait before the first poll
    pub delay: Duration,
    /// Wait between two polls
    pub interval: Duration,
    /// Floor applied to `interval`
    pub min_interval: Duration,
    /// Give up after this long
    pub timeout: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(5),
            interval: Duration::from_secs(5),
            min_interval: Duration::from_secs(3),
            timeout: Duration::from_secs(5 * 60),
        }
    }
}

impl PollConfig {
    fn period(&self) -> Duration {
        self.interval.max(self.min_interval)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestState {
    /// Still running, carries the id to poll next
    Pending(String),
    /// Ids of the resources the request produced
    Finished(Vec<String>),
    /// Message reported by the server
    Failed(String),
}

impl RequestState {
    pub fn from_tracker(tracker: RequestTracker, prefix: &str) -> Result<Self, VraError> {
        match tracker.status.as_str() {
            "INPROGRESS" => Ok(RequestState::Pending(tracker.id)),
            "FINISHED" => Ok(RequestState::Finished(
                tracker
                    .resources
                    .iter()
                    .map(|reference| strip_id(reference, prefix))
                    .collect(),
            )),
            "FAILED" => Ok(RequestState::Failed(tracker.message.unwrap_or_default())),
            status => Err(VraError::UnknownStatus(status.to_owned())),
        }
    }
}

/// Poll the request tracker `id` until the request terminates
///
/// Returns the ids of the created resources, with `prefix` stripped from their
/// references.
pub async fn wait_for_request(
    client: &ApiClient,
    id: &str,
    prefix: &str,
    config: &PollConfig,
) -> Result<Vec<String>, VraError> {
    tokio::time::timeout(config.timeout, poll(client, id, prefix, config))
        .await
        .map_err(|_| VraError::Timeout {
            id: id.to_owned(),
            timeout: config.timeout,
        })?
}

async fn poll(
    client: &ApiClient,
    id: &str,
    prefix: &str,
    config: &PollConfig,
) -> Result<Vec<String>, VraError> {
    tokio::time::sleep(config.delay).await;

    let mut request_id = id.to_owned();
    loop {
        let tracker = client.get_request_tracker(&request_id).await?;
        match RequestState::from_tracker(tracker, prefix)? {
            RequestState::Pending(next) => {
                // Some answers omit the id, keep polling the same request then
                if !next.is_empty() {
                    request_id = next;
                }
                tracing::debug!("request {request_id} still in progress");
            }
            RequestState::Finished(resources) => {
                tracing::info!("request {request_id} finished: {resources:?}");
                return Ok(resources);
            }
            RequestState::Failed(message) => {
                tracing::warn!("request {request_id} failed: {message}");
                return Err(VraError::RequestFailed(message));
            }
        }
        tokio::time::sleep(config.period()).await;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    const MACHINE_PREFIX: &str = "/iaas/api/machines/";

    fn fast() -> PollConfig {
        PollConfig {
            delay: Duration::ZERO,
            interval: Duration::from_millis(50),
            min_interval: Duration::from_millis(10),
            timeout: Duration::from_secs(5),
        }
    }

    async fn tracker(server: &MockServer, body: serde_json::Value, times: Option<u64>) {
        let mock = Mock::given(method("GET"))
            .and(path("/iaas/api/request-tracker/r1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body));
        match times {
            Some(n) => mock.up_to_n_times(n).expect(n).mount(server).await,
            None => mock.mount(server).await,
        }
    }

    #[test]
    fn status_mapping() {
        let pending = RequestTracker {
            id: String::from("r1"),
            status: String::from("INPROGRESS"),
            ..Default::default()
        };
        assert_eq!(
            RequestState::from_tracker(pending, MACHINE_PREFIX).unwrap(),
            RequestState::Pending(String::from("r1"))
        );

        let finished = RequestTracker {
            id: String::from("r1"),
            status: String::from("FINISHED"),
            resources: vec![String::from("/iaas/api/machines/m1")],
            ..Default::default()
        };
        assert_eq!(
            RequestState::from_tracker(finished, MACHINE_PREFIX).unwrap(),
            RequestState::Finished(vec![String::from("m1")])
        );

        let weird = RequestTracker {
            status: String::from("PAUSED"),
            ..Default::default()
        };
        assert!(matches!(
            RequestState::from_tracker(weird, MACHINE_PREFIX),
            Err(VraError::UnknownStatus(status)) if status == "PAUSED"
        ));
    }

    #[tokio::test]
    async fn finishes_after_two_pending_polls() {
        let server = MockServer::start().await;
        tracker(&server, json!({"id": "r1", "status": "INPROGRESS"}), Some(2)).await;
        tracker(
            &server,
            json!({"id": "r1", "status": "FINISHED", "resources": ["/iaas/api/machines/m1"]}),
            None,
        )
        .await;

        let client = ApiClient::with_token(&server.uri(), "token", false).unwrap();
        let config = fast();
        let start = Instant::now();
        let resources = wait_for_request(&client, "r1", MACHINE_PREFIX, &config)
            .await
            .unwrap();

        assert_eq!(resources, vec![String::from("m1")]);
        assert!(start.elapsed() >= config.interval * 2);
    }

    #[tokio::test]
    async fn pending_answer_without_id_keeps_polling_the_request() {
        let server = MockServer::start().await;
        tracker(&server, json!({"status": "INPROGRESS"}), Some(1)).await;
        tracker(
            &server,
            json!({"id": "r1", "status": "FINISHED", "resources": ["/iaas/api/machines/m1"]}),
            None,
        )
        .await;

        let client = ApiClient::with_token(&server.uri(), "token", false).unwrap();
        let resources = wait_for_request(&client, "r1", MACHINE_PREFIX, &fast())
            .await
            .unwrap();
        assert_eq!(resources, vec![String::from("m1")]);
    }

    #[tokio::test]
    async fn failure_carries_server_message() {
        let server = MockServer::start().await;
        tracker(
            &server,
            json!({"id": "r1", "status": "FAILED", "message": "quota exceeded"}),
            None,
        )
        .await;

        let client = ApiClient::with_token(&server.uri(), "token", false).unwrap();
        let err = wait_for_request(&client, "r1", MACHINE_PREFIX, &fast())
            .await
            .unwrap_err();
        assert!(matches!(err, VraError::RequestFailed(_)));
        assert!(err.to_string().contains("quota exceeded"));
    }

    #[tokio::test]
    async fn gives_up_after_timeout() {
        let server = MockServer::start().await;
        tracker(&server, json!({"id": "r1", "status": "INPROGRESS"}), None).await;

        let client = ApiClient::with_token(&server.uri(), "token", false).unwrap();
        let config = PollConfig {
            timeout: Duration::from_millis(200),
            interval: Duration::from_millis(20),
            ..fast()
        };
        let err = wait_for_request(&client, "r1", MACHINE_PREFIX, &config)
            .await
            .unwrap_err();
        assert!(matches!(err, VraError::Timeout { ref id, .. } if id == "r1"));
    }

    #[test]
    fn interval_has_a_floor() {
        let config = PollConfig {
            interval: Duration::from_millis(1),
            min_interval: Duration::from_millis(30),
            ..fast()
        };
        assert_eq!(config.period(), Duration::from_millis(30));
    }
}
