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

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use tf_provider::schema::{
    Attribute, AttributeConstraint, AttributeType, Block, Description, NestedBlock, Schema,
};
use tf_provider::value::{Value, ValueNumber, ValueString};
use tf_provider::{map, AttributePath, Diagnostics};

use crate::client::models::{FlavorMapping, FlavorProfile, FlavorProfileSpecification};
use crate::client::ApiClient;
use crate::error::VraError;
use crate::utils::{with_id, WithNormalize, WithSchema, WithValidate};

use super::expand::{
    expand_number, expand_optional, expand_string, optional_string, region_id_from_links,
    value_string, ValueSet,
};
use super::{created_id, fetch, remove, ResourceKind};

const FLAVOR_PROFILES_PATH: &str = "/iaas/api/flavor-profiles";

/// A flavor is either a cloud instance type, or a cpu and memory sizing
#[derive(Debug, Default, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FlavorMappingState<'a> {
    pub name: ValueString<'a>,
    pub instance_type: ValueString<'a>,
    pub cpu_count: ValueNumber,
    pub memory: ValueNumber,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlavorProfileState<'a> {
    pub id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub description: ValueString<'a>,
    pub region_id: ValueString<'a>,
    pub flavor_mapping: ValueSet<Value<FlavorMappingState<'a>>>,
}

with_id!(FlavorProfileState);

fn flavor_mapping_schema() -> NestedBlock {
    NestedBlock::Set(Block {
        attributes: map! {
            "name" => Attribute {
                attr_type: AttributeType::String,
                description: Description::plain("Name of the flavor, like `small`"),
                constraint: AttributeConstraint::Required,
                ..Default::default()
            },
            "instance_type" => Attribute {
                attr_type: AttributeType::String,
                description: Description::plain("Instance type of the cloud provider, like `t2.micro`"),
                constraint: AttributeConstraint::Optional,
                ..Default::default()
            },
            "cpu_count" => Attribute {
                attr_type: AttributeType::Number,
                description: Description::plain("Number of CPUs, for providers without instance types"),
                constraint: AttributeConstraint::Optional,
                ..Default::default()
            },
            "memory" => Attribute {
                attr_type: AttributeType::Number,
                description: Description::plain("Memory in MB, for providers without instance types"),
                constraint: AttributeConstraint::Optional,
                ..Default::default()
            },
        },
        description: Description::plain("Flavors available in the region"),
        ..Default::default()
    })
}

impl<'a> WithSchema for FlavorProfileState<'a> {
    fn schema() -> Schema {
        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "id" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Id of the flavor profile"),
                        constraint: AttributeConstraint::Computed,
                        ..Default::default()
                    },
                    "name" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Name of the flavor profile"),
                        constraint: AttributeConstraint::Required,
                        ..Default::default()
                    },
                    "description" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Description of the flavor profile"),
                        constraint: AttributeConstraint::Optional,
                        ..Default::default()
                    },
                    "region_id" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Id of the region the profile applies to"),
                        constraint: AttributeConstraint::Required,
                        ..Default::default()
                    },
                },
                blocks: map! {
                    "flavor_mapping" => flavor_mapping_schema(),
                },
                description: Description::plain("Flavor profile of a region"),
                ..Default::default()
            },
        }
    }
}

impl<'a> WithValidate for FlavorProfileState<'a> {
    fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        for mapping in self.flavor_mapping.iter().flatten() {
            let Value::Value(mapping) = mapping else {
                continue;
            };
            let sized = !mapping.cpu_count.is_null() && !mapping.memory.is_null();
            if mapping.instance_type.is_null() && !sized {
                diags.error(
                    "Invalid `flavor_mapping`",
                    format!(
                        "flavor `{}` needs either `instance_type`, or `cpu_count` and `memory`",
                        mapping.name.as_str()
                    ),
                    attr_path.clone().attribute("flavor_mapping"),
                );
            }
        }
    }
}

impl<'a> WithNormalize for FlavorProfileState<'a> {
    fn normalize(&mut self, _diags: &mut Diagnostics) {}
    fn unknown_computed(&mut self) {}
}

fn expand_flavor_mapping(
    mappings: &ValueSet<Value<FlavorMappingState<'_>>>,
) -> BTreeMap<String, FlavorMapping> {
    mappings
        .iter()
        .flatten()
        .filter_map(Value::as_ref_option)
        .map(|mapping| {
            (
                expand_string(&mapping.name),
                FlavorMapping {
                    name: expand_optional(&mapping.instance_type),
                    cpu_count: expand_number(&mapping.cpu_count),
                    memory_in_mb: expand_number(&mapping.memory),
                },
            )
        })
        .collect()
}

/// The server echoes both the instance type and its sizing, only the fields
/// the prior state uses are kept
fn flatten_flavor_mapping<'a>(
    mappings: BTreeMap<String, FlavorMapping>,
    prior: &ValueSet<Value<FlavorMappingState<'_>>>,
) -> ValueSet<Value<FlavorMappingState<'a>>> {
    let prior = prior
        .iter()
        .flatten()
        .filter_map(Value::as_ref_option)
        .map(|mapping| (mapping.name.as_str(), mapping))
        .collect::<BTreeMap<_, _>>();

    Value::Value(
        mappings
            .into_iter()
            .map(|(name, mapping)| {
                let (by_type, by_size) = match prior.get(name.as_str()) {
                    Some(prior) => (!prior.instance_type.is_null(), !prior.cpu_count.is_null()),
                    None => (true, true),
                };
                let number = |value: Option<i64>| match value {
                    Some(value) if by_size => Value::Value(value),
                    _ => Value::Null,
                };
                Value::Value(FlavorMappingState {
                    instance_type: if by_type {
                        optional_string(mapping.name)
                    } else {
                        Value::Null
                    },
                    cpu_count: number(mapping.cpu_count),
                    memory: number(mapping.memory_in_mb),
                    name: value_string(name),
                })
            })
            .collect(),
    )
}

#[derive(Debug, Default, Clone)]
pub struct FlavorProfileResource;

#[async_trait]
impl ResourceKind for FlavorProfileResource {
    type State<'a> = FlavorProfileState<'a>;
    const NAME: &'static str = "flavor profile";

    async fn create<'a>(
        &self,
        client: &ApiClient,
        state: &mut FlavorProfileState<'a>,
    ) -> Result<(), VraError> {
        let specification = FlavorProfileSpecification {
            name: expand_string(&state.name),
            description: expand_optional(&state.description),
            region_id: expand_string(&state.region_id),
            flavor_mapping: expand_flavor_mapping(&state.flavor_mapping),
        };
        let profile: FlavorProfile = client.post(FLAVOR_PROFILES_PATH, &specification).await?;
        tracing::info!("flavor profile {} created", profile.id);

        state.id = created_id(Self::NAME, profile.id)?;
        self.read(client, state).await
    }

    async fn read<'a>(
        &self,
        client: &ApiClient,
        state: &mut FlavorProfileState<'a>,
    ) -> Result<(), VraError> {
        let Some(profile) =
            fetch::<FlavorProfile>(client, FLAVOR_PROFILES_PATH, &state.id).await?
        else {
            state.id = Value::Null;
            return Ok(());
        };

        state.name = optional_string(profile.name);
        state.description = optional_string(profile.description);
        if let Some(region_id) = region_id_from_links(&profile.links) {
            state.region_id = value_string(region_id);
        }
        state.flavor_mapping =
            flatten_flavor_mapping(profile.flavor_mappings.mapping, &state.flavor_mapping);

        Ok(())
    }

    async fn update<'a>(
        &self,
        client: &ApiClient,
        state: &mut FlavorProfileState<'a>,
    ) -> Result<(), VraError> {
        let specification = FlavorProfileSpecification {
            name: expand_string(&state.name),
            description: expand_optional(&state.description),
            region_id: expand_string(&state.region_id),
            flavor_mapping: expand_flavor_mapping(&state.flavor_mapping),
        };
        let path = format!("{FLAVOR_PROFILES_PATH}/{}", state.id.as_str());
        let _: FlavorProfile = client.patch(&path, &specification).await?;

        self.read(client, state).await
    }

    async fn delete<'a>(
        &self,
        client: &ApiClient,
        state: &mut FlavorProfileState<'a>,
    ) -> Result<(), VraError> {
        remove(client, FLAVOR_PROFILES_PATH, &state.id).await?;
        state.id = Value::Null;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::resource::testing;

    fn mapping(
        name: &str,
        instance_type: Option<&str>,
        size: Option<(i64, i64)>,
    ) -> Value<FlavorMappingState<'static>> {
        Value::Value(FlavorMappingState {
            name: value_string(name),
            instance_type: optional_string(instance_type.map(str::to_owned)),
            cpu_count: size.map_or(Value::Null, |(cpu, _)| Value::Value(cpu)),
            memory: size.map_or(Value::Null, |(_, memory)| Value::Value(memory)),
        })
    }

    #[tokio::test]
    async fn sizing_echoed_by_the_server_is_dropped() {
        let server = MockServer::start().await;
        let profile = json!({
            "id": "fp1",
            "name": "aws-flavors",
            "flavorMappings": {"mapping": {
                "small": {"name": "t2.micro", "cpuCount": 1, "memoryInMB": 1024},
                "custom": {"cpuCount": 4, "memoryInMB": 8192},
            }},
            "_links": {"region": {"href": "/iaas/api/regions/r1"}},
        });
        Mock::given(method("POST"))
            .and(path(FLAVOR_PROFILES_PATH))
            .and(body_json(json!({
                "name": "aws-flavors",
                "regionId": "r1",
                "flavorMapping": {
                    "small": {"name": "t2.micro"},
                    "custom": {"cpuCount": 4, "memoryInMB": 8192},
                },
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(profile.clone()))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/iaas/api/flavor-profiles/fp1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(profile))
            .mount(&server)
            .await;

        let flavors = Value::Value(
            [
                mapping("small", Some("t2.micro"), None),
                mapping("custom", None, Some((4, 8192))),
            ]
            .into_iter()
            .collect(),
        );
        let mut state = FlavorProfileState {
            id: Value::Unknown,
            name: value_string("aws-flavors"),
            region_id: value_string("r1"),
            flavor_mapping: flavors.clone(),
            ..Default::default()
        };
        FlavorProfileResource
            .create(&testing::client(&server), &mut state)
            .await
            .unwrap();

        assert_eq!(state.id, value_string("fp1"));
        assert_eq!(state.flavor_mapping, flavors);
    }

    #[test]
    fn flavor_needs_a_type_or_a_size() {
        let state = FlavorProfileState {
            flavor_mapping: Value::Value(
                [mapping("broken", None, None), mapping("ok", Some("t2.micro"), None)]
                    .into_iter()
                    .collect(),
            ),
            ..Default::default()
        };
        let mut diags = Diagnostics::default();
        state.validate(&mut diags, AttributePath::default());
        assert_eq!(diags.errors.len(), 1);
    }
}
