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
use tf_provider::value::{Value, ValueString};
use tf_provider::{map, AttributePath, Diagnostics};

use crate::client::models::{ImageMapping, ImageProfile, ImageProfileSpecification};
use crate::client::ApiClient;
use crate::error::VraError;
use crate::utils::{with_id, WithNormalize, WithSchema, WithValidate};

use super::expand::{
    expand_optional, expand_string, optional_string, region_id_from_links, value_string, ValueSet,
};
use super::{created_id, fetch, remove, ResourceKind};

const IMAGE_PROFILES_PATH: &str = "/iaas/api/image-profiles";

#[derive(Debug, Default, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ImageMappingState<'a> {
    pub name: ValueString<'a>,
    pub image_id: ValueString<'a>,
    pub image_name: ValueString<'a>,
    pub cloud_config: ValueString<'a>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageProfileState<'a> {
    pub id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub description: ValueString<'a>,
    pub region_id: ValueString<'a>,
    pub image_mapping: ValueSet<Value<ImageMappingState<'a>>>,
}

with_id!(ImageProfileState);

fn image_mapping_schema() -> NestedBlock {
    let optional = |description| Attribute {
        attr_type: AttributeType::String,
        description: Description::plain(description),
        constraint: AttributeConstraint::Optional,
        ..Default::default()
    };
    NestedBlock::Set(Block {
        attributes: map! {
            "name" => Attribute {
                attr_type: AttributeType::String,
                description: Description::plain("Name of the image, like `ubuntu`"),
                constraint: AttributeConstraint::Required,
                ..Default::default()
            },
            "image_id" => optional("Id of the image on the cloud provider"),
            "image_name" => optional("Name of the image on the cloud provider"),
            "cloud_config" => optional("cloud-init document applied to machines using the image"),
        },
        description: Description::plain("Images available in the region"),
        ..Default::default()
    })
}

impl<'a> WithSchema for ImageProfileState<'a> {
    fn schema() -> Schema {
        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "id" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Id of the image profile"),
                        constraint: AttributeConstraint::Computed,
                        ..Default::default()
                    },
                    "name" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Name of the image profile"),
                        constraint: AttributeConstraint::Required,
                        ..Default::default()
                    },
                    "description" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Description of the image profile"),
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
                    "image_mapping" => image_mapping_schema(),
                },
                description: Description::plain("Image profile of a region"),
                ..Default::default()
            },
        }
    }
}

impl<'a> WithValidate for ImageProfileState<'a> {
    fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        for mapping in self.image_mapping.iter().flatten() {
            let Value::Value(mapping) = mapping else {
                continue;
            };
            if mapping.image_id.is_null() && mapping.image_name.is_null() {
                diags.error(
                    "Invalid `image_mapping`",
                    format!(
                        "image `{}` needs `image_id` or `image_name`",
                        mapping.name.as_str()
                    ),
                    attr_path.clone().attribute("image_mapping"),
                );
            }
        }
    }
}

impl<'a> WithNormalize for ImageProfileState<'a> {
    fn normalize(&mut self, _diags: &mut Diagnostics) {}
    fn unknown_computed(&mut self) {}
}

fn expand_image_mapping(
    mappings: &ValueSet<Value<ImageMappingState<'_>>>,
) -> BTreeMap<String, ImageMapping> {
    mappings
        .iter()
        .flatten()
        .filter_map(Value::as_ref_option)
        .map(|mapping| {
            (
                expand_string(&mapping.name),
                ImageMapping {
                    id: expand_optional(&mapping.image_id),
                    name: expand_optional(&mapping.image_name),
                    cloud_config: expand_optional(&mapping.cloud_config),
                },
            )
        })
        .collect()
}

/// The server resolves both the id and the name of each image, only the one
/// the prior state references is kept
fn flatten_image_mapping<'a>(
    mappings: BTreeMap<String, ImageMapping>,
    prior: &ValueSet<Value<ImageMappingState<'_>>>,
) -> ValueSet<Value<ImageMappingState<'a>>> {
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
                let (by_id, by_name) = match prior.get(name.as_str()) {
                    Some(prior) => (!prior.image_id.is_null(), !prior.image_name.is_null()),
                    None => (true, true),
                };
                Value::Value(ImageMappingState {
                    image_id: if by_id {
                        optional_string(mapping.id)
                    } else {
                        Value::Null
                    },
                    image_name: if by_name {
                        optional_string(mapping.name)
                    } else {
                        Value::Null
                    },
                    cloud_config: optional_string(mapping.cloud_config),
                    name: value_string(name),
                })
            })
            .collect(),
    )
}

fn expand_image_profile(state: &ImageProfileState<'_>) -> ImageProfileSpecification {
    ImageProfileSpecification {
        name: expand_string(&state.name),
        description: expand_optional(&state.description),
        region_id: expand_string(&state.region_id),
        image_mapping: expand_image_mapping(&state.image_mapping),
    }
}

#[derive(Debug, Default, Clone)]
pub struct ImageProfileResource;

#[async_trait]
impl ResourceKind for ImageProfileResource {
    type State<'a> = ImageProfileState<'a>;
    const NAME: &'static str = "image profile";

    async fn create<'a>(
        &self,
        client: &ApiClient,
        state: &mut ImageProfileState<'a>,
    ) -> Result<(), VraError> {
        let profile: ImageProfile = client
            .post(IMAGE_PROFILES_PATH, &expand_image_profile(state))
            .await?;
        tracing::info!("image profile {} created", profile.id);

        state.id = created_id(Self::NAME, profile.id)?;
        self.read(client, state).await
    }

    async fn read<'a>(
        &self,
        client: &ApiClient,
        state: &mut ImageProfileState<'a>,
    ) -> Result<(), VraError> {
        let Some(profile) = fetch::<ImageProfile>(client, IMAGE_PROFILES_PATH, &state.id).await?
        else {
            state.id = Value::Null;
            return Ok(());
        };

        state.name = optional_string(profile.name);
        state.description = optional_string(profile.description);
        if let Some(region_id) = region_id_from_links(&profile.links) {
            state.region_id = value_string(region_id);
        }
        state.image_mapping =
            flatten_image_mapping(profile.image_mappings.mapping, &state.image_mapping);

        Ok(())
    }

    async fn update<'a>(
        &self,
        client: &ApiClient,
        state: &mut ImageProfileState<'a>,
    ) -> Result<(), VraError> {
        let path = format!("{IMAGE_PROFILES_PATH}/{}", state.id.as_str());
        let _: ImageProfile = client.patch(&path, &expand_image_profile(state)).await?;

        self.read(client, state).await
    }

    async fn delete<'a>(
        &self,
        client: &ApiClient,
        state: &mut ImageProfileState<'a>,
    ) -> Result<(), VraError> {
        remove(client, IMAGE_PROFILES_PATH, &state.id).await?;
        state.id = Value::Null;
        Ok(())
    }
}
