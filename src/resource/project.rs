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
use tf_provider::value::{Value, ValueList, ValueNumber, ValueString};
use tf_provider::{map, AttributePath, Diagnostics};

use crate::client::models::{Project, ProjectSpecification, User, ZoneAssignment};
use crate::client::ApiClient;
use crate::error::VraError;
use crate::utils::{with_id, WithNormalize, WithSchema, WithValidate};

use super::expand::{
    expand_number, expand_optional, expand_string, expand_string_set, flatten_string_set,
    optional_string, value_string, ValueSet,
};
use super::{created_id, fetch, remove, ResourceKind};

pub(crate) const PROJECTS_PATH: &str = "/iaas/api/projects";

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneAssignmentState<'a> {
    pub zone_id: ValueString<'a>,
    pub priority: ValueNumber,
    pub max_instances: ValueNumber,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectState<'a> {
    pub id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub description: ValueString<'a>,
    pub administrators: ValueSet<ValueString<'a>>,
    pub members: ValueSet<ValueString<'a>>,
    pub zone_assignments: ValueList<Value<ZoneAssignmentState<'a>>>,
}

with_id!(ProjectState);

fn zone_assignments_schema() -> NestedBlock {
    let number = |description| Attribute {
        attr_type: AttributeType::Number,
        description: Description::plain(description),
        constraint: AttributeConstraint::OptionalComputed,
        ..Default::default()
    };
    NestedBlock::List(Block {
        attributes: map! {
            "zone_id" => Attribute {
                attr_type: AttributeType::String,
                description: Description::plain("Id of the zone"),
                constraint: AttributeConstraint::Required,
                ..Default::default()
            },
            "priority" => number("Priority of the zone, lower values are preferred"),
            "max_instances" => number("Maximum number of machines in the zone, 0 is unlimited"),
        },
        description: Description::plain("Zones the project can provision to"),
        ..Default::default()
    })
}

pub(crate) fn users_attribute(description: &str, constraint: AttributeConstraint) -> Attribute {
    Attribute {
        attr_type: AttributeType::Set(Box::new(AttributeType::String)),
        description: Description::plain(description),
        constraint,
        ..Default::default()
    }
}

pub(crate) fn flatten_users<'a>(users: &[User]) -> ValueSet<ValueString<'a>> {
    flatten_string_set(users.iter().map(|user| user.email.clone()))
}

fn flatten_zone_assignments<'a>(
    zones: &[ZoneAssignment],
) -> ValueList<Value<ZoneAssignmentState<'a>>> {
    Value::Value(
        zones
            .iter()
            .map(|zone| {
                Value::Value(ZoneAssignmentState {
                    zone_id: value_string(zone.zone_id.as_str()),
                    priority: Value::Value(zone.priority),
                    max_instances: Value::Value(zone.max_number_instances),
                })
            })
            .collect(),
    )
}

impl<'a> WithSchema for ProjectState<'a> {
    fn schema() -> Schema {
        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "id" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Id of the project"),
                        constraint: AttributeConstraint::Computed,
                        ..Default::default()
                    },
                    "name" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Name of the project"),
                        constraint: AttributeConstraint::Required,
                        ..Default::default()
                    },
                    "description" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Description of the project"),
                        constraint: AttributeConstraint::Optional,
                        ..Default::default()
                    },
                    "administrators" => users_attribute(
                        "Emails of the project administrators",
                        AttributeConstraint::Optional,
                    ),
                    "members" => users_attribute(
                        "Emails of the project members",
                        AttributeConstraint::Optional,
                    ),
                },
                blocks: map! {
                    "zone_assignments" => zone_assignments_schema(),
                },
                description: Description::plain("Project grouping users and the zones they can use"),
                ..Default::default()
            },
        }
    }
}

impl<'a> WithValidate for ProjectState<'a> {
    fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        for (index, zone) in self.zone_assignments.iter().flatten().enumerate() {
            let Value::Value(zone) = zone else {
                continue;
            };
            for (name, value) in [("priority", &zone.priority), ("max_instances", &zone.max_instances)] {
                if matches!(value, Value::Value(value) if *value < 0) {
                    diags.error(
                        format!("Invalid `{name}`"),
                        format!("`{name}` cannot be negative"),
                        attr_path
                            .clone()
                            .attribute("zone_assignments")
                            .index(index as i64)
                            .attribute(name),
                    );
                }
            }
        }
    }
}

impl<'a> WithNormalize for ProjectState<'a> {
    fn normalize(&mut self, _diags: &mut Diagnostics) {
        if let Value::Value(zones) = &mut self.zone_assignments {
            for zone in zones.iter_mut() {
                if let Value::Value(zone) = zone {
                    if zone.priority.is_null() {
                        zone.priority = Value::Value(0);
                    }
                    if zone.max_instances.is_null() {
                        zone.max_instances = Value::Value(0);
                    }
                }
            }
        }
    }

    fn unknown_computed(&mut self) {}
}

fn expand_users(users: &ValueSet<ValueString<'_>>) -> Vec<User> {
    expand_string_set(users)
        .into_iter()
        .map(|email| User { email })
        .collect()
}

fn expand_project(state: &ProjectState<'_>) -> ProjectSpecification {
    ProjectSpecification {
        name: expand_string(&state.name),
        description: expand_optional(&state.description),
        zone_assignment_configurations: state
            .zone_assignments
            .iter()
            .flatten()
            .filter_map(Value::as_ref_option)
            .map(|zone| ZoneAssignment {
                zone_id: expand_string(&zone.zone_id),
                priority: expand_number(&zone.priority).unwrap_or(0),
                max_number_instances: expand_number(&zone.max_instances).unwrap_or(0),
            })
            .collect(),
        administrators: expand_users(&state.administrators),
        members: expand_users(&state.members),
    }
}

#[derive(Debug, Default, Clone)]
pub struct ProjectResource;

#[async_trait]
impl ResourceKind for ProjectResource {
    type State<'a> = ProjectState<'a>;
    const NAME: &'static str = "project";

    async fn create<'a>(
        &self,
        client: &ApiClient,
        state: &mut ProjectState<'a>,
    ) -> Result<(), VraError> {
        let project: Project = client.post(PROJECTS_PATH, &expand_project(state)).await?;
        tracing::info!("project {} created", project.id);

        state.id = created_id(Self::NAME, project.id)?;
        self.read(client, state).await
    }

    async fn read<'a>(
        &self,
        client: &ApiClient,
        state: &mut ProjectState<'a>,
    ) -> Result<(), VraError> {
        let Some(project) = fetch::<Project>(client, PROJECTS_PATH, &state.id).await? else {
            state.id = Value::Null;
            return Ok(());
        };

        state.name = optional_string(project.name);
        state.description = optional_string(project.description);
        if !(project.zones.is_empty() && state.zone_assignments.is_null()) {
            state.zone_assignments = flatten_zone_assignments(&project.zones);
        }
        if !(project.administrators.is_empty() && state.administrators.is_null()) {
            state.administrators = flatten_users(&project.administrators);
        }
        if !(project.members.is_empty() && state.members.is_null()) {
            state.members = flatten_users(&project.members);
        }

        Ok(())
    }

    async fn update<'a>(
        &self,
        client: &ApiClient,
        state: &mut ProjectState<'a>,
    ) -> Result<(), VraError> {
        let path = format!("{PROJECTS_PATH}/{}", state.id.as_str());
        let _: Project = client.patch(&path, &expand_project(state)).await?;

        self.read(client, state).await
    }

    async fn delete<'a>(
        &self,
        client: &ApiClient,
        state: &mut ProjectState<'a>,
    ) -> Result<(), VraError> {
        remove(client, PROJECTS_PATH, &state.id).await?;
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

    fn project() -> serde_json::Value {
        json!({
            "id": "p1",
            "name": "web",
            "zones": [{"zoneId": "z1", "priority": 1, "maxNumberInstances": 10}],
            "administrators": [{"email": "admin@example.com"}],
        })
    }

    fn planned() -> ProjectState<'static> {
        ProjectState {
            id: Value::Unknown,
            name: value_string("web"),
            administrators: flatten_string_set([String::from("admin@example.com")]),
            zone_assignments: flatten_zone_assignments(&[ZoneAssignment {
                zone_id: String::from("z1"),
                priority: 1,
                max_number_instances: 10,
            }]),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_then_read() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(PROJECTS_PATH))
            .and(body_json(json!({
                "name": "web",
                "zoneAssignmentConfigurations": [{"zoneId": "z1", "priority": 1, "maxNumberInstances": 10}],
                "administrators": [{"email": "admin@example.com"}],
                "members": [],
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(project()))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/iaas/api/projects/p1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(project()))
            .mount(&server)
            .await;

        let mut state = planned();
        ProjectResource
            .create(&testing::client(&server), &mut state)
            .await
            .unwrap();

        let expected = ProjectState {
            id: value_string("p1"),
            ..planned()
        };
        assert_eq!(state, expected);
    }

    #[tokio::test]
    async fn api_errors_are_passed_through() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/iaas/api/projects/p1"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "message": "Zone z9 does not exist",
                "statusCode": 400,
            })))
            .mount(&server)
            .await;

        let mut state = ProjectState {
            id: value_string("p1"),
            ..planned()
        };
        let err = ProjectResource
            .update(&testing::client(&server), &mut state)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Zone z9 does not exist");
    }

    #[test]
    fn zone_assignment_defaults() {
        let mut state = ProjectState {
            zone_assignments: Value::Value(vec![Value::Value(ZoneAssignmentState {
                zone_id: value_string("z1"),
                ..Default::default()
            })]),
            ..Default::default()
        };
        state.normalize(&mut Diagnostics::default());
        assert_eq!(
            expand_project(&state).zone_assignment_configurations,
            vec![ZoneAssignment {
                zone_id: String::from("z1"),
                priority: 0,
                max_number_instances: 0,
            }]
        );
    }
}
