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
use tf_provider::value::{Value, ValueList, ValueMap, ValueNumber, ValueString};
use tf_provider::{map, AttributePath, Diagnostics};

use crate::client::models::{Machine, MachineSpecification, RequestTracker};
use crate::client::ApiClient;
use crate::error::VraError;
use crate::tracker::{wait_for_request, PollConfig};
use crate::utils::{with_id, WithNormalize, WithSchema, WithValidate};

use super::expand::{
    boot_config_schema, constraints_schema, disks_schema, expand_boot_config, expand_constraints,
    expand_custom_properties, expand_disks, expand_nics, expand_number, expand_optional,
    expand_string, expand_tags, flatten_custom_properties, flatten_tags, nics_schema,
    optional_string, tags_schema, value_string, BootConfigState, ConstraintState, DiskState,
    NicState, TagsState,
};
use super::{fetch, remove, ResourceKind};

const MACHINES_PATH: &str = "/iaas/api/machines";
const MACHINE_PREFIX: &str = "/iaas/api/machines/";

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineState<'a> {
    pub id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub description: ValueString<'a>,
    pub image: ValueString<'a>,
    pub flavor: ValueString<'a>,
    pub project_id: ValueString<'a>,
    pub machine_count: ValueNumber,
    pub custom_properties: ValueMap<'a, ValueString<'a>>,
    pub power_state: ValueString<'a>,
    pub address: ValueString<'a>,
    pub external_zone_id: ValueString<'a>,
    pub external_region_id: ValueString<'a>,
    pub external_id: ValueString<'a>,
    pub created_at: ValueString<'a>,
    pub updated_at: ValueString<'a>,
    pub owner: ValueString<'a>,
    pub organization_id: ValueString<'a>,
    pub tags: TagsState<'a>,
    pub constraints: ValueList<Value<ConstraintState<'a>>>,
    pub nics: ValueList<Value<NicState<'a>>>,
    pub disks: ValueList<Value<DiskState<'a>>>,
    pub boot_config: ValueList<Value<BootConfigState<'a>>>,
}

with_id!(MachineState);

fn computed(description: &str) -> Attribute {
    Attribute {
        attr_type: AttributeType::String,
        description: Description::plain(description),
        constraint: AttributeConstraint::Computed,
        ..Default::default()
    }
}

impl<'a> WithSchema for MachineState<'a> {
    fn schema() -> Schema {
        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "id" => computed("Id of the machine"),
                    "name" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Name of the machine, the server may append a suffix to it"),
                        constraint: AttributeConstraint::Required,
                        ..Default::default()
                    },
                    "description" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Description of the machine"),
                        constraint: AttributeConstraint::Optional,
                        ..Default::default()
                    },
                    "image" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Image mapping name, like `ubuntu`"),
                        constraint: AttributeConstraint::Required,
                        ..Default::default()
                    },
                    "flavor" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Flavor mapping name, like `small`"),
                        constraint: AttributeConstraint::Required,
                        ..Default::default()
                    },
                    "project_id" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Id of the project the machine belongs to"),
                        constraint: AttributeConstraint::Required,
                        ..Default::default()
                    },
                    "machine_count" => Attribute {
                        attr_type: AttributeType::Number,
                        description: Description::plain("Number of machines to provision, defaults to 1"),
                        constraint: AttributeConstraint::OptionalComputed,
                        ..Default::default()
                    },
                    "custom_properties" => Attribute {
                        attr_type: AttributeType::Map(Box::new(AttributeType::String)),
                        description: Description::plain("Additional properties of the machine"),
                        constraint: AttributeConstraint::OptionalComputed,
                        ..Default::default()
                    },
                    "power_state" => computed("Power state of the machine"),
                    "address" => computed("Primary address of the machine"),
                    "external_zone_id" => computed("Id of the zone on the cloud provider"),
                    "external_region_id" => computed("Id of the region on the cloud provider"),
                    "external_id" => computed("Id of the machine on the cloud provider"),
                    "created_at" => computed("Creation date"),
                    "updated_at" => computed("Last update date"),
                    "owner" => computed("Owner of the machine"),
                    "organization_id" => computed("Id of the organization owning the machine"),
                },
                blocks: map! {
                    "tags" => tags_schema("Tags attached to the machine"),
                    "constraints" => constraints_schema(),
                    "nics" => nics_schema(),
                    "disks" => disks_schema(),
                    "boot_config" => boot_config_schema(),
                },
                description: Description::plain("Compute machine, created asynchronously"),
                ..Default::default()
            },
        }
    }
}

impl<'a> WithValidate for MachineState<'a> {
    fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        if let Value::Value(count) = self.machine_count {
            if count < 1 {
                diags.error(
                    "Invalid `machine_count`",
                    format!("at least one machine must be requested, got {count}"),
                    attr_path.clone().attribute("machine_count"),
                );
            }
        }
        if let Value::Value(boot_config) = &self.boot_config {
            if boot_config.len() > 1 {
                diags.error_short(
                    "At most one `boot_config` block is allowed",
                    attr_path.attribute("boot_config"),
                );
            }
        }
    }
}

impl<'a> WithNormalize for MachineState<'a> {
    fn normalize(&mut self, _diags: &mut Diagnostics) {
        if self.machine_count.is_null() {
            self.machine_count = Value::Value(1);
        }
        if self.custom_properties.is_null() {
            self.custom_properties = Value::Unknown;
        }
    }

    fn unknown_computed(&mut self) {
        for value in [
            &mut self.power_state,
            &mut self.address,
            &mut self.external_zone_id,
            &mut self.external_region_id,
            &mut self.external_id,
            &mut self.created_at,
            &mut self.updated_at,
            &mut self.owner,
            &mut self.organization_id,
        ] {
            *value = Value::Unknown;
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct MachineResource {
    pub poll: PollConfig,
}

#[async_trait]
impl ResourceKind for MachineResource {
    type State<'a> = MachineState<'a>;
    const NAME: &'static str = "machine";

    async fn create<'a>(
        &self,
        client: &ApiClient,
        state: &mut MachineState<'a>,
    ) -> Result<(), VraError> {
        let specification = MachineSpecification {
            name: expand_string(&state.name),
            description: expand_optional(&state.description),
            image: expand_string(&state.image),
            flavor: expand_string(&state.flavor),
            project_id: expand_string(&state.project_id),
            machine_count: expand_number(&state.machine_count).unwrap_or(1),
            constraints: expand_constraints(&state.constraints),
            tags: expand_tags(&state.tags),
            custom_properties: expand_custom_properties(&state.custom_properties),
            nics: expand_nics(&state.nics),
            disks: expand_disks(&state.disks),
            boot_config: expand_boot_config(&state.boot_config),
        };

        let request: RequestTracker = client.post(MACHINES_PATH, &specification).await?;
        tracing::info!("machine {} requested ({})", specification.name, request.id);

        let machines = wait_for_request(client, &request.id, MACHINE_PREFIX, &self.poll).await?;
        let id = match machines.as_slice() {
            [id] => id.clone(),
            _ => {
                return Err(VraError::UnexpectedCount {
                    kind: "machines",
                    count: machines.len(),
                })
            }
        };

        state.id = value_string(id);
        self.read(client, state).await
    }

    async fn read<'a>(
        &self,
        client: &ApiClient,
        state: &mut MachineState<'a>,
    ) -> Result<(), VraError> {
        let Some(machine) = fetch::<Machine>(client, MACHINES_PATH, &state.id).await? else {
            state.id = Value::Null;
            return Ok(());
        };

        // The server may add a suffix to the requested name
        let name = optional_string(machine.name);
        let suffixed = matches!(
            (&state.name, &name),
            (Value::Value(requested), Value::Value(actual)) if actual.starts_with(&**requested)
        );
        if !suffixed {
            state.name = name;
        }

        state.description = optional_string(machine.description);
        state.power_state = optional_string(machine.power_state);
        state.address = optional_string(machine.address);
        state.external_zone_id = optional_string(machine.external_zone_id);
        state.external_region_id = optional_string(machine.external_region_id);
        state.external_id = optional_string(machine.external_id);
        state.created_at = optional_string(machine.created_at);
        state.updated_at = optional_string(machine.updated_at);
        state.owner = optional_string(machine.owner);
        state.organization_id = optional_string(machine.org_id);
        state.custom_properties = flatten_custom_properties(&machine.custom_properties);
        state.tags = flatten_tags(&machine.tags);
        if let Some(project_id) = machine.project_id.filter(|id| !id.is_empty()) {
            state.project_id = value_string(project_id);
        }
        if state.machine_count.is_unknown() || state.machine_count.is_null() {
            state.machine_count = Value::Value(1);
        }

        Ok(())
    }

    async fn update<'a>(
        &self,
        _client: &ApiClient,
        _state: &mut MachineState<'a>,
    ) -> Result<(), VraError> {
        Err(VraError::NotImplemented(Self::NAME))
    }

    async fn delete<'a>(
        &self,
        client: &ApiClient,
        state: &mut MachineState<'a>,
    ) -> Result<(), VraError> {
        remove(client, MACHINES_PATH, &state.id).await?;
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

    fn machine_resource() -> MachineResource {
        MachineResource {
            poll: PollConfig {
                delay: Duration::ZERO,
                interval: Duration::from_millis(10),
                min_interval: Duration::ZERO,
                timeout: Duration::from_secs(2),
            },
        }
    }

    fn planned() -> MachineState<'static> {
        MachineState {
            id: Value::Unknown,
            name: value_string("web"),
            image: value_string("ubuntu"),
            flavor: value_string("small"),
            project_id: value_string("p1"),
            machine_count: Value::Value(1),
            tags: flatten_tags(&[crate::client::models::Tag {
                key: String::from("stoyan"),
                value: String::from("genchev"),
            }]),
            ..Default::default()
        }
    }

    async fn mount_request(server: &MockServer, resources: serde_json::Value) {
        Mock::given(method("POST"))
            .and(path(MACHINES_PATH))
            .and(body_partial_json(json!({
                "name": "web",
                "image": "ubuntu",
                "flavor": "small",
                "projectId": "p1",
                "machineCount": 1,
                "tags": [{"key": "stoyan", "value": "genchev"}],
            })))
            .respond_with(
                ResponseTemplate::new(202).set_body_json(json!({"id": "r1", "status": "INPROGRESS"})),
            )
            .expect(1)
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/iaas/api/request-tracker/r1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "r1",
                "status": "FINISHED",
                "resources": resources,
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn create_waits_for_the_request_then_reads() {
        let server = MockServer::start().await;
        mount_request(&server, json!(["/iaas/api/machines/m1"])).await;
        Mock::given(method("GET"))
            .and(path("/iaas/api/machines/m1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "m1",
                "name": "web-mcm42",
                "powerState": "ON",
                "address": "10.0.0.4",
                "projectId": "p1",
                "orgId": "org",
                "customProperties": {"osType": "LINUX"},
                "tags": [{"key": "stoyan", "value": "genchev"}],
            })))
            .mount(&server)
            .await;

        let mut state = planned();
        machine_resource()
            .create(&testing::client(&server), &mut state)
            .await
            .unwrap();

        assert_eq!(state.id, value_string("m1"));
        assert_eq!(state.name, value_string("web"));
        assert_eq!(state.power_state, value_string("ON"));
        assert_eq!(state.address, value_string("10.0.0.4"));
        assert_eq!(state.organization_id, value_string("org"));
        assert_eq!(state.description, Value::Null);
        assert_eq!(expand_custom_properties(&state.custom_properties)["osType"], "LINUX");
        assert_eq!(state.tags, planned().tags);
    }

    #[tokio::test]
    async fn create_expects_exactly_one_machine() {
        let server = MockServer::start().await;
        mount_request(
            &server,
            json!(["/iaas/api/machines/m1", "/iaas/api/machines/m2"]),
        )
        .await;

        let mut state = planned();
        let err = machine_resource()
            .create(&testing::client(&server), &mut state)
            .await
            .unwrap_err();

        assert!(matches!(err, VraError::UnexpectedCount { count: 2, .. }));
        assert_eq!(state.id, Value::Unknown);
    }

    #[tokio::test]
    async fn update_is_rejected_without_calling_the_api() {
        let server = MockServer::start().await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let mut state = planned();
        state.id = value_string("m1");
        let err = machine_resource()
            .update(&testing::client(&server), &mut state)
            .await
            .unwrap_err();

        assert!(matches!(err, VraError::NotImplemented("machine")));
        assert_eq!(err.to_string(), "machine update not implemented");
    }

    #[tokio::test]
    async fn delete_then_read_reports_absence() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/iaas/api/machines/m1"))
            .respond_with(ResponseTemplate::new(202).set_body_json(json!({"id": "r2", "status": "INPROGRESS"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/iaas/api/machines/m1"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "not found"})))
            .mount(&server)
            .await;

        let client = testing::client(&server);
        let resource = machine_resource();

        let mut state = planned();
        state.id = value_string("m1");
        resource.delete(&client, &mut state).await.unwrap();
        assert!(state.id.is_null());

        let mut stale = planned();
        stale.id = value_string("m1");
        resource.read(&client, &mut stale).await.unwrap();
        assert!(stale.id.is_null());
    }

    #[test]
    fn plan_defaults() {
        let mut state = MachineState::default();
        state.unknown_computed();
        state.normalize(&mut Diagnostics::default());
        assert_eq!(state.machine_count, Value::Value(1));
        assert!(state.custom_properties.is_unknown());
        assert!(state.power_state.is_unknown());
    }

    #[test]
    fn machine_count_must_be_positive() {
        let state = MachineState {
            machine_count: Value::Value(0),
            ..planned()
        };
        let mut diags = Diagnostics::default();
        state.validate(&mut diags, AttributePath::default());
        assert_eq!(diags.errors.len(), 1);
    }
}
