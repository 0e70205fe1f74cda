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

use tf_provider::schema::{
    Attribute, AttributeConstraint, AttributeType, Block, Description, NestedBlock, Schema,
};
use tf_provider::value::{Value, ValueBool, ValueList, ValueMap, ValueString};
use tf_provider::{map, AttributePath, Diagnostics};

use crate::client::models::{LoadBalancer, LoadBalancerSpecification, RequestTracker, Route};
use crate::client::ApiClient;
use crate::error::VraError;
use crate::tracker::{wait_for_request, PollConfig};
use crate::utils::{with_id, WithNormalize, WithSchema, WithValidate};

use super::expand::{
    expand_bool, expand_custom_properties, expand_nics, expand_optional, expand_string,
    expand_string_list, expand_tags, flatten_custom_properties, flatten_tags, nics_schema,
    optional_string, tags_schema, validate_unique, value_string, NicState, TagsState,
};
use super::{fetch, remove, ResourceKind};

const LOAD_BALANCERS_PATH: &str = "/iaas/api/load-balancers";
const LOAD_BALANCER_PREFIX: &str = "/iaas/api/load-balancers/";

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteState<'a> {
    pub protocol: ValueString<'a>,
    pub port: ValueString<'a>,
    pub member_protocol: ValueString<'a>,
    pub member_port: ValueString<'a>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadBalancerState<'a> {
    pub id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub description: ValueString<'a>,
    pub project_id: ValueString<'a>,
    pub internet_facing: ValueBool,
    pub target_links: ValueList<ValueString<'a>>,
    pub custom_properties: ValueMap<'a, ValueString<'a>>,
    pub address: ValueString<'a>,
    pub external_id: ValueString<'a>,
    pub external_zone_id: ValueString<'a>,
    pub external_region_id: ValueString<'a>,
    pub nics: ValueList<Value<NicState<'a>>>,
    pub routes: ValueList<Value<RouteState<'a>>>,
    pub tags: TagsState<'a>,
}

with_id!(LoadBalancerState);

fn routes_schema() -> NestedBlock {
    let required = |description| Attribute {
        attr_type: AttributeType::String,
        description: Description::plain(description),
        constraint: AttributeConstraint::Required,
        ..Default::default()
    };
    NestedBlock::List(Block {
        attributes: map! {
            "protocol" => required("Protocol of the incoming traffic, like `TCP`"),
            "port" => required("Port of the incoming traffic"),
            "member_protocol" => required("Protocol used to reach the members"),
            "member_port" => required("Port used to reach the members"),
        },
        description: Description::plain("Forwarding rules of the load balancer"),
        ..Default::default()
    })
}

impl<'a> WithSchema for LoadBalancerState<'a> {
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
                    "id" => computed("Id of the load balancer"),
                    "name" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Name of the load balancer"),
                        constraint: AttributeConstraint::Required,
                        ..Default::default()
                    },
                    "description" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Description of the load balancer"),
                        constraint: AttributeConstraint::Optional,
                        ..Default::default()
                    },
                    "project_id" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Id of the project the load balancer belongs to"),
                        constraint: AttributeConstraint::Required,
                        ..Default::default()
                    },
                    "internet_facing" => Attribute {
                        attr_type: AttributeType::Bool,
                        description: Description::plain("Whether the load balancer gets a public address"),
                        constraint: AttributeConstraint::Optional,
                        ..Default::default()
                    },
                    "target_links" => Attribute {
                        attr_type: AttributeType::List(Box::new(AttributeType::String)),
                        description: Description::plain("References of the machines behind the load balancer"),
                        constraint: AttributeConstraint::Optional,
                        ..Default::default()
                    },
                    "custom_properties" => Attribute {
                        attr_type: AttributeType::Map(Box::new(AttributeType::String)),
                        description: Description::plain("Additional properties of the load balancer"),
                        constraint: AttributeConstraint::OptionalComputed,
                        ..Default::default()
                    },
                    "address" => computed("Address of the load balancer"),
                    "external_id" => computed("Id of the load balancer on the cloud provider"),
                    "external_zone_id" => computed("Id of the zone on the cloud provider"),
                    "external_region_id" => computed("Id of the region on the cloud provider"),
                },
                blocks: map! {
                    "nics" => nics_schema(),
                    "routes" => routes_schema(),
                    "tags" => tags_schema("Tags attached to the load balancer"),
                },
                description: Description::plain("Load balancer, created asynchronously"),
                ..Default::default()
            },
        }
    }
}

impl<'a> WithValidate for LoadBalancerState<'a> {
    fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        validate_unique(diags, attr_path, "target_links", &self.target_links);
    }
}

impl<'a> WithNormalize for LoadBalancerState<'a> {
    fn normalize(&mut self, _diags: &mut Diagnostics) {
        if self.custom_properties.is_null() {
            self.custom_properties = Value::Unknown;
        }
    }

    fn unknown_computed(&mut self) {
        self.address = Value::Unknown;
        self.external_id = Value::Unknown;
        self.external_zone_id = Value::Unknown;
        self.external_region_id = Value::Unknown;
    }
}

fn expand_routes(routes: &ValueList<Value<RouteState<'_>>>) -> Vec<Route> {
    routes
        .iter()
        .flatten()
        .filter_map(Value::as_ref_option)
        .map(|route| Route {
            protocol: expand_string(&route.protocol),
            port: expand_string(&route.port),
            member_protocol: expand_string(&route.member_protocol),
            member_port: expand_string(&route.member_port),
        })
        .collect()
}

fn flatten_routes<'a>(routes: &[Route]) -> ValueList<Value<RouteState<'a>>> {
    Value::Value(
        routes
            .iter()
            .map(|route| {
                Value::Value(RouteState {
                    protocol: value_string(route.protocol.as_str()),
                    port: value_string(route.port.as_str()),
                    member_protocol: value_string(route.member_protocol.as_str()),
                    member_port: value_string(route.member_port.as_str()),
                })
            })
            .collect(),
    )
}

#[derive(Debug, Default, Clone)]
pub struct LoadBalancerResource {
    pub poll: PollConfig,
}

#[async_trait]
impl ResourceKind for LoadBalancerResource {
    type State<'a> = LoadBalancerState<'a>;
    const NAME: &'static str = "load balancer";

    async fn create<'a>(
        &self,
        client: &ApiClient,
        state: &mut LoadBalancerState<'a>,
    ) -> Result<(), VraError> {
        let specification = LoadBalancerSpecification {
            name: expand_string(&state.name),
            description: expand_optional(&state.description),
            project_id: expand_string(&state.project_id),
            nics: expand_nics(&state.nics),
            routes: expand_routes(&state.routes),
            target_links: expand_string_list(&state.target_links),
            internet_facing: expand_bool(&state.internet_facing),
            tags: expand_tags(&state.tags),
            custom_properties: expand_custom_properties(&state.custom_properties),
        };

        let request: RequestTracker = client.post(LOAD_BALANCERS_PATH, &specification).await?;
        tracing::info!(
            "load balancer {} requested ({})",
            specification.name,
            request.id
        );

        let load_balancers =
            wait_for_request(client, &request.id, LOAD_BALANCER_PREFIX, &self.poll).await?;
        let [id] = load_balancers.as_slice() else {
            return Err(VraError::UnexpectedCount {
                kind: "load balancers",
                count: load_balancers.len(),
            });
        };

        state.id = value_string(id.as_str());
        self.read(client, state).await
    }

    async fn read<'a>(
        &self,
        client: &ApiClient,
        state: &mut LoadBalancerState<'a>,
    ) -> Result<(), VraError> {
        let Some(load_balancer) =
            fetch::<LoadBalancer>(client, LOAD_BALANCERS_PATH, &state.id).await?
        else {
            state.id = Value::Null;
            return Ok(());
        };

        state.name = optional_string(load_balancer.name);
        state.description = optional_string(load_balancer.description);
        state.address = optional_string(load_balancer.address);
        state.external_id = optional_string(load_balancer.external_id);
        state.external_zone_id = optional_string(load_balancer.external_zone_id);
        state.external_region_id = optional_string(load_balancer.external_region_id);
        if let Some(project_id) = load_balancer.project_id.filter(|id| !id.is_empty()) {
            state.project_id = value_string(project_id);
        }
        if !load_balancer.routes.is_empty() {
            state.routes = flatten_routes(&load_balancer.routes);
        }
        state.custom_properties = flatten_custom_properties(&load_balancer.custom_properties);
        state.tags = flatten_tags(&load_balancer.tags);

        Ok(())
    }

    async fn update<'a>(
        &self,
        _client: &ApiClient,
        _state: &mut LoadBalancerState<'a>,
    ) -> Result<(), VraError> {
        Err(VraError::NotImplemented(Self::NAME))
    }

    async fn delete<'a>(
        &self,
        client: &ApiClient,
        state: &mut LoadBalancerState<'a>,
    ) -> Result<(), VraError> {
        remove(client, LOAD_BALANCERS_PATH, &state.id).await?;
        state.id = Value::Null;
        Ok(())
    }
}
