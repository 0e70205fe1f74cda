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
use tf_provider::value::{Value, ValueBool, ValueMap, ValueString};
use tf_provider::{map, AttributePath, Diagnostics};

use crate::client::models::{StorageProfile, StorageProfileSpecification};
use crate::client::ApiClient;
use crate::error::VraError;
use crate::utils::{with_id, WithNormalize, WithSchema, WithValidate};

use super::expand::{
    expand_bool, expand_custom_properties, expand_optional, expand_string, expand_tags,
    flatten_custom_properties, flatten_tags, optional_string, region_id_from_links, tags_schema,
    value_string, TagsState,
};
use super::{created_id, fetch, remove, ResourceKind};

const STORAGE_PROFILES_PATH: &str = "/iaas/api/storage-profiles";

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageProfileState<'a> {
    pub id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub description: ValueString<'a>,
    pub region_id: ValueString<'a>,
    pub default_item: ValueBool,
    pub disk_properties: ValueMap<'a, ValueString<'a>>,
    pub external_region_id: ValueString<'a>,
    pub tags: TagsState<'a>,
}

with_id!(StorageProfileState);

impl<'a> WithSchema for StorageProfileState<'a> {
    fn schema() -> Schema {
        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "id" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Id of the storage profile"),
                        constraint: AttributeConstraint::Computed,
                        ..Default::default()
                    },
                    "name" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Name of the storage profile"),
                        constraint: AttributeConstraint::Required,
                        ..Default::default()
                    },
                    "description" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Description of the storage profile"),
                        constraint: AttributeConstraint::Optional,
                        ..Default::default()
                    },
                    "region_id" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Id of the region the profile applies to"),
                        constraint: AttributeConstraint::Required,
                        ..Default::default()
                    },
                    "default_item" => Attribute {
                        attr_type: AttributeType::Bool,
                        description: Description::plain("Whether this is the default profile of the region"),
                        constraint: AttributeConstraint::OptionalComputed,
                        ..Default::default()
                    },
                    "disk_properties" => Attribute {
                        attr_type: AttributeType::Map(Box::new(AttributeType::String)),
                        description: Description::plain("Properties of the disks provisioned with this profile, like `deviceType`"),
                        constraint: AttributeConstraint::Optional,
                        ..Default::default()
                    },
                    "external_region_id" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Id of the region on the cloud provider"),
                        constraint: AttributeConstraint::Computed,
                        ..Default::default()
                    },
                },
                blocks: map! {
                    "tags" => tags_schema("Tags attached to the storage profile"),
                },
                description: Description::plain("Storage profile of a region"),
                ..Default::default()
            },
        }
    }
}

impl<'a> WithValidate for StorageProfileState<'a> {
    fn validate(&self, _diags: &mut Diagnostics, _attr_path: AttributePath) {}
}

impl<'a> WithNormalize for StorageProfileState<'a> {
    fn normalize(&mut self, _diags: &mut Diagnostics) {
        if self.default_item.is_null() {
            self.default_item = Value::Value(false);
        }
    }

    fn unknown_computed(&mut self) {
        self.external_region_id = Value::Unknown;
    }
}

fn expand_storage_profile(state: &StorageProfileState<'_>) -> StorageProfileSpecification {
    StorageProfileSpecification {
        name: expand_string(&state.name),
        description: expand_optional(&state.description),
        region_id: expand_string(&state.region_id),
        default_item: expand_bool(&state.default_item).unwrap_or(false),
        disk_properties: expand_custom_properties(&state.disk_properties),
        tags: expand_tags(&state.tags),
    }
}

#[derive(Debug, Default, Clone)]
pub struct StorageProfileResource;

#[async_trait]
impl ResourceKind for StorageProfileResource {
    type State<'a> = StorageProfileState<'a>;
    const NAME: &'static str = "storage profile";

    async fn create<'a>(
        &self,
        client: &ApiClient,
        state: &mut StorageProfileState<'a>,
    ) -> Result<(), VraError> {
        let profile: StorageProfile = client
            .post(STORAGE_PROFILES_PATH, &expand_storage_profile(state))
            .await?;
        tracing::info!("storage profile {} created", profile.id);

        state.id = created_id(Self::NAME, profile.id)?;
        self.read(client, state).await
    }

    async fn read<'a>(
        &self,
        client: &ApiClient,
        state: &mut StorageProfileState<'a>,
    ) -> Result<(), VraError> {
        let Some(profile) =
            fetch::<StorageProfile>(client, STORAGE_PROFILES_PATH, &state.id).await?
        else {
            state.id = Value::Null;
            return Ok(());
        };

        state.name = optional_string(profile.name);
        state.description = optional_string(profile.description);
        state.default_item = Value::Value(profile.default_item);
        state.external_region_id = optional_string(profile.external_region_id);
        if let Some(region_id) = region_id_from_links(&profile.links) {
            state.region_id = value_string(region_id);
        }
        if !(profile.disk_properties.is_empty() && state.disk_properties.is_null()) {
            state.disk_properties = flatten_custom_properties(&profile.disk_properties);
        }
        state.tags = flatten_tags(&profile.tags);

        Ok(())
    }

    async fn update<'a>(
        &self,
        client: &ApiClient,
        state: &mut StorageProfileState<'a>,
    ) -> Result<(), VraError> {
        let path = format!("{STORAGE_PROFILES_PATH}/{}", state.id.as_str());
        let _: StorageProfile = client.patch(&path, &expand_storage_profile(state)).await?;

        self.read(client, state).await
    }

    async fn delete<'a>(
        &self,
        client: &ApiClient,
        state: &mut StorageProfileState<'a>,
    ) -> Result<(), VraError> {
        remove(client, STORAGE_PROFILES_PATH, &state.id).await?;
        state.id = Value::Null;
        Ok(())
    }
}
