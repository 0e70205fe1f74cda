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

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use tf_provider::schema::{Attribute, AttributeConstraint, AttributeType, Block, Description, Schema};
use tf_provider::value::{Value, ValueBool, ValueList, ValueMap, ValueString};
use tf_provider::{map, AttributePath, Diagnostics};

use crate::client::models::{Network, NetworkSpecification, RequestTracker};
use crate::client::ApiClient;
use crate::error::VraError;
use crate::tracker::{wait_for_request, PollConfig};
use crate::utils::{with_id, WithNormalize, WithSchema, WithValidate};

use super::expand::{
    constraints_schema, expand_bool, expand_constraints, expand_custom_properties,
    expand_optional, expand_string, expand_tags, flatten_custom_properties, flatten_tags,
    optional_string, self_link, tags_schema, value_string, ConstraintState, TagsState,
};
use super::{fetch, remove, ResourceKind};

pub(crate) const NETWORKS_PATH: &str = "/iaas/api/networks";
const NETWORK_PREFIX: &str = "/iaas/api/networks/";

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkState<'a> {
    pub id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub description: ValueString<'a>,
    pub project_id: ValueString<'a>,
    pub outbound_access: ValueBool,
    pub custom_properties: ValueMap<'a, ValueString<'a>>,
    pub cidr: ValueString<'a>,
    pub external_id: ValueString<'a>,
    pub external_zone_id: ValueString<'a>,
    pub self_link: ValueString<'a>,
    pub organization_id: ValueString<'a>,
    pub owner: ValueString<'a>,
    pub updated_at: ValueString<'a>,
    pub constraints: ValueList<Value<ConstraintState<'a>>>,
    pub tags: TagsState<'a>,
}

with_id!(NetworkState);

impl<'a> WithSchema for NetworkState<'a> {
    fn schema() -> Schema {
        let computed = |description| Attribute {
            attr_type: AttributeType::String,
            description: Description::plain(description),
            constraint: AttributeConstraint::Computed,
            ..Default::default()
        };
        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "id" => computed("Id of the network"),
                    "name" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Name of the network"),
                        constraint: AttributeConstraint::Required,
                        ..Default::default()
                    },
                    "description" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Description of the network"),
                        constraint: AttributeConstraint::Optional,
                        ..Default::default()
                    },
                    "project_id" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Id of the project the network belongs to"),
                        constraint: AttributeConstraint::Required,
                        ..Default::default()
                    },
                    "outbound_access" => Attribute {
                        attr_type: AttributeType::Bool,
                        description: Description::plain("Whether the network can reach the outside world"),
                        constraint: AttributeConstraint::OptionalComputed,
                        ..Default::default()
                    },
                    "custom_properties" => Attribute {
                        attr_type: AttributeType::Map(Box::new(AttributeType::String)),
                        description: Description::plain("Additional properties of the network"),
                        constraint: AttributeConstraint::OptionalComputed,
                        ..Default::default()
                    },
                    "cidr" => computed("Address range of the network"),
                    "external_id" => computed("Id of the network on the cloud provider"),
                    "external_zone_id" => computed("Id of the zone on the cloud provider"),
                    "self_link" => computed("Reference of the network"),
                    "organization_id" => computed("Id of the organization owning the network"),
                    "owner" => computed("Owner of the network"),
                    "updated_at" => computed("Last update date"),
                },
                blocks: map! {
                    "constraints" => constraints_schema(),
                    "tags" => tags_schema("Tags attached to the network"),
                },
                description: Description::plain("Network, created asynchronously"),
                ..Default::default()
            },
        }
    }
}

impl<'a> WithValidate for NetworkState<'a> {
    fn validate(&self, _diags: &mut Diagnostics, _attr_path: AttributePath) {}
}

impl<'a> WithNormalize for NetworkState<'a> {
    fn normalize(&mut self, _diags: &mut Diagnostics) {
        if self.custom_properties.is_null() {
            self.custom_properties = Value::Unknown;
        }
        // Decided by the server when unset
        if self.outbound_access.is_null() {
            self.outbound_access = Value::Unknown;
        }
    }

    fn unknown_computed(&mut self) {
        for value in [
            &mut self.cidr,
            &mut self.external_id,
            &mut self.external_zone_id,
            &mut self.self_link,
            &mut self.organization_id,
            &mut self.owner,
            &mut self.updated_at,
        ] {
            *value = Value::Unknown;
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct NetworkResource {
    pub poll: PollConfig,
}

#[async_trait]
impl ResourceKind for NetworkResource {
    type State<'a> = NetworkState<'a>;
    const NAME: &'static str = "network";

    async fn create<'a>(
        &self,
        client: &ApiClient,
        state: &mut NetworkState<'a>,
    ) -> Result<(), VraError> {
        let specification = NetworkSpecification {
            name: expand_string(&state.name),
            description: expand_optional(&state.description),
            project_id: expand_string(&state.project_id),
            outbound_access: expand_bool(&state.outbound_access),
            constraints: expand_constraints(&state.constraints),
            tags: expand_tags(&state.tags),
            custom_properties: expand_custom_properties(&state.custom_properties),
        };

        let request: RequestTracker = client.post(NETWORKS_PATH, &specification).await?;
        tracing::info!("network {} requested ({})", specification.name, request.id);

        let networks = wait_for_request(client, &request.id, NETWORK_PREFIX, &self.poll).await?;
        let [id] = networks.as_slice() else {
            return Err(VraError::UnexpectedCount {
                kind: "networks",
                count: networks.len(),
            });
        };

        state.id = value_string(id.as_str());
        self.read(client, state).await
    }

    async fn read<'a>(
        &self,
        client: &ApiClient,
        state: &mut NetworkState<'a>,
    ) -> Result<(), VraError> {
        let Some(network) = fetch::<Network>(client, NETWORKS_PATH, &state.id).await? else {
            state.id = Value::Null;
            return Ok(());
        };

        state.name = optional_string(network.name);
        state.description = optional_string(network.description);
        state.cidr = optional_string(network.cidr);
        state.external_id = optional_string(network.external_id);
        state.external_zone_id = optional_string(network.external_zone_id);
        state.owner = optional_string(network.owner);
        state.organization_id = optional_string(network.org_id);
        state.updated_at = optional_string(network.updated_at);
        state.self_link = optional_string(self_link(&network.links));
        state.outbound_access = match (network.outbound_access, &state.outbound_access) {
            (Some(outbound_access), _) => Value::Value(outbound_access),
            (None, Value::Value(outbound_access)) => Value::Value(*outbound_access),
            (None, _) => Value::Value(false),
        };
        if let Some(project_id) = network.project_id.filter(|id| !id.is_empty()) {
            state.project_id = value_string(project_id);
        }
        state.custom_properties = flatten_custom_properties(&network.custom_properties);
        state.tags = flatten_tags(&network.tags);

        Ok(())
    }

    async fn update<'a>(
        &self,
        _client: &ApiClient,
        _state: &mut NetworkState<'a>,
    ) -> Result<(), VraError> {
        Err(VraError::NotImplemented(Self::NAME))
    }

    async fn delete<'a>(
        &self,
        client: &ApiClient,
        state: &mut NetworkState<'a>,
    ) -> Result<(), VraError> {
        remove(client, NETWORKS_PATH, &state.id).await?;
        state.id = Value::Null;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use wiremock::matchers::{any, body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::resource::testing;

    fn network_resource() -> NetworkResource {
        NetworkResource {
            poll: PollConfig {
                delay: Duration::ZERO,
                interval: Duration::from_millis(10),
                min_interval: Duration::ZERO,
                timeout: Duration::from_secs(2),
            },
        }
    }

    #[tokio::test]
    async fn create_then_read() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(NETWORKS_PATH))
            .and(body_partial_json(json!({
                "name": "backend",
                "projectId": "p1",
                "outboundAccess": false,
            })))
            .respond_with(ResponseTemplate::new(202).set_body_json(json!({"id": "r1", "status": "INPROGRESS"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/iaas/api/request-tracker/r1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "r1",
                "status": "FINISHED",
                "resources": ["/iaas/api/networks/n1"],
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/iaas/api/networks/n1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "n1",
                "name": "backend",
                "cidr": "10.1.0.0/24",
                "projectId": "p1",
                "outboundAccess": false,
                "_links": {"self": {"href": "/iaas/api/networks/n1"}},
            })))
            .mount(&server)
            .await;

        let mut state = NetworkState {
            id: Value::Unknown,
            name: value_string("backend"),
            project_id: value_string("p1"),
            outbound_access: Value::Value(false),
            ..Default::default()
        };
        network_resource()
            .create(&testing::client(&server), &mut state)
            .await
            .unwrap();

        assert_eq!(state.id, value_string("n1"));
        assert_eq!(state.cidr, value_string("10.1.0.0/24"));
        assert_eq!(state.self_link, value_string("/iaas/api/networks/n1"));
        assert_eq!(state.outbound_access, Value::Value(false));
    }

    #[tokio::test]
    async fn unset_outbound_access_is_filled_by_the_server() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(NETWORKS_PATH))
            .respond_with(ResponseTemplate::new(202).set_body_json(json!({"id": "r1", "status": "INPROGRESS"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/iaas/api/request-tracker/r1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "r1",
                "status": "FINISHED",
                "resources": ["/iaas/api/networks/n1"],
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/iaas/api/networks/n1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "n1",
                "name": "backend",
                "projectId": "p1",
                "outboundAccess": false,
            })))
            .mount(&server)
            .await;

        let mut state = NetworkState {
            name: value_string("backend"),
            project_id: value_string("p1"),
            ..Default::default()
        };
        state.normalize(&mut Diagnostics::default());
        assert_eq!(state.outbound_access, Value::Unknown);

        network_resource()
            .create(&testing::client(&server), &mut state)
            .await
            .unwrap();
        assert_eq!(state.outbound_access, Value::Value(false));
    }

    #[tokio::test]
    async fn failed_request_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(NETWORKS_PATH))
            .respond_with(ResponseTemplate::new(202).set_body_json(json!({"id": "r1", "status": "INPROGRESS"})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/iaas/api/request-tracker/r1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "r1",
                "status": "FAILED",
                "message": "no network profile in the zone",
            })))
            .mount(&server)
            .await;

        let mut state = NetworkState {
            name: value_string("backend"),
            project_id: value_string("p1"),
            ..Default::default()
        };
        let err = network_resource()
            .create(&testing::client(&server), &mut state)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "no network profile in the zone");
    }

    #[tokio::test]
    async fn update_is_rejected_without_calling_the_api() {
        let server = MockServer::start().await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let mut state = NetworkState {
            id: value_string("n1"),
            ..Default::default()
        };
        let err = network_resource()
            .update(&testing::client(&server), &mut state)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "network update not implemented");
    }

    #[tokio::test]
    async fn missing_network_is_gone() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/iaas/api/networks/n1"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let mut state = NetworkState {
            id: value_string("n1"),
            ..Default::default()
        };
        network_resource()
            .read(&testing::client(&server), &mut state)
            .await
            .unwrap();
        assert!(state.id.is_null());
    }
}
