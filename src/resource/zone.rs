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
use tf_provider::value::{Value, ValueMap, ValueString};
use tf_provider::{map, AttributePath, Diagnostics};

use crate::client::models::{Zone, ZoneSpecification};
use crate::client::ApiClient;
use crate::error::VraError;
use crate::utils::{with_id, WithNormalize, WithSchema, WithValidate};

use super::expand::{
    expand_custom_properties, expand_optional, expand_string, expand_tags,
    flatten_custom_properties, flatten_tags, optional_string, region_id_from_links, tags_schema,
    value_string, TagsState,
};
use super::{created_id, fetch, remove, ResourceKind};

pub(crate) const ZONES_PATH: &str = "/iaas/api/zones";
const PLACEMENT_POLICIES: [&str; 3] = ["DEFAULT", "SPREAD", "BINPACK"];

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneState<'a> {
    pub id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub description: ValueString<'a>,
    pub region_id: ValueString<'a>,
    pub placement_policy: ValueString<'a>,
    pub folder: ValueString<'a>,
    pub custom_properties: ValueMap<'a, ValueString<'a>>,
    pub cloud_account_id: ValueString<'a>,
    pub external_region_id: ValueString<'a>,
    pub tags: TagsState<'a>,
    pub tags_to_match: TagsState<'a>,
}

with_id!(ZoneState);

impl<'a> WithSchema for ZoneState<'a> {
    fn schema() -> Schema {
        let attribute = |description, constraint| Attribute {
            attr_type: AttributeType::String,
            description: Description::plain(description),
            constraint,
            ..Default::default()
        };
        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "id" => attribute("Id of the zone", AttributeConstraint::Computed),
                    "name" => attribute("Name of the zone", AttributeConstraint::Required),
                    "description" => attribute("Description of the zone", AttributeConstraint::Optional),
                    "region_id" => attribute("Id of the region the zone is in", AttributeConstraint::Required),
                    "placement_policy" => attribute(
                        "Placement policy of the zone: `DEFAULT`, `SPREAD` or `BINPACK`",
                        AttributeConstraint::OptionalComputed,
                    ),
                    "folder" => attribute("Folder machines are provisioned in", AttributeConstraint::Optional),
                    "custom_properties" => Attribute {
                        attr_type: AttributeType::Map(Box::new(AttributeType::String)),
                        description: Description::plain("Additional properties of the zone"),
                        constraint: AttributeConstraint::Optional,
                        ..Default::default()
                    },
                    "cloud_account_id" => attribute(
                        "Id of the cloud account the zone belongs to",
                        AttributeConstraint::Computed,
                    ),
                    "external_region_id" => attribute(
                        "Id of the region on the cloud provider",
                        AttributeConstraint::Computed,
                    ),
                },
                blocks: map! {
                    "tags" => tags_schema("Tags attached to the zone"),
                    "tags_to_match" => tags_schema("Compute resources with these tags belong to the zone"),
                },
                description: Description::plain("Zone grouping compute resources of a region"),
                ..Default::default()
            },
        }
    }
}

impl<'a> WithValidate for ZoneState<'a> {
    fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        if let Value::Value(policy) = &self.placement_policy {
            if !PLACEMENT_POLICIES.contains(&&**policy) {
                diags.error(
                    "Invalid `placement_policy`",
                    format!("`{policy}` is not one of DEFAULT, SPREAD, BINPACK"),
                    attr_path.attribute("placement_policy"),
                );
            }
        }
    }
}

impl<'a> WithNormalize for ZoneState<'a> {
    fn normalize(&mut self, _diags: &mut Diagnostics) {
        if self.placement_policy.is_null() {
            self.placement_policy = value_string(PLACEMENT_POLICIES[0]);
        }
    }

    fn unknown_computed(&mut self) {
        self.cloud_account_id = Value::Unknown;
        self.external_region_id = Value::Unknown;
    }
}

fn expand_zone(state: &ZoneState<'_>) -> ZoneSpecification {
    ZoneSpecification {
        name: expand_string(&state.name),
        description: expand_optional(&state.description),
        region_id: expand_string(&state.region_id),
        placement_policy: expand_optional(&state.placement_policy),
        folder: expand_optional(&state.folder),
        tags: expand_tags(&state.tags),
        tags_to_match: expand_tags(&state.tags_to_match),
        custom_properties: expand_custom_properties(&state.custom_properties),
    }
}

#[derive(Debug, Default, Clone)]
pub struct ZoneResource;

#[async_trait]
impl ResourceKind for ZoneResource {
    type State<'a> = ZoneState<'a>;
    const NAME: &'static str = "zone";

    async fn create<'a>(
        &self,
        client: &ApiClient,
        state: &mut ZoneState<'a>,
    ) -> Result<(), VraError> {
        let zone: Zone = client.post(ZONES_PATH, &expand_zone(state)).await?;
        tracing::info!("zone {} created", zone.id);

        state.id = created_id(Self::NAME, zone.id)?;
        self.read(client, state).await
    }

    async fn read<'a>(
        &self,
        client: &ApiClient,
        state: &mut ZoneState<'a>,
    ) -> Result<(), VraError> {
        let Some(zone) = fetch::<Zone>(client, ZONES_PATH, &state.id).await? else {
            state.id = Value::Null;
            return Ok(());
        };

        state.name = optional_string(zone.name);
        state.description = optional_string(zone.description);
        state.folder = optional_string(zone.folder);
        state.placement_policy = optional_string(zone.placement_policy);
        state.cloud_account_id = optional_string(zone.cloud_account_id);
        state.external_region_id = optional_string(zone.external_region_id);
        if let Some(region_id) = region_id_from_links(&zone.links) {
            state.region_id = value_string(region_id);
        }
        if !(zone.custom_properties.is_empty() && state.custom_properties.is_null()) {
            state.custom_properties = flatten_custom_properties(&zone.custom_properties);
        }
        state.tags = flatten_tags(&zone.tags);
        state.tags_to_match = flatten_tags(&zone.tags_to_match);

        Ok(())
    }

    async fn update<'a>(
        &self,
        client: &ApiClient,
        state: &mut ZoneState<'a>,
    ) -> Result<(), VraError> {
        let path = format!("{ZONES_PATH}/{}", state.id.as_str());
        let _: Zone = client.patch(&path, &expand_zone(state)).await?;

        self.read(client, state).await
    }

    async fn delete<'a>(
        &self,
        client: &ApiClient,
        state: &mut ZoneState<'a>,
    ) -> Result<(), VraError> {
        remove(client, ZONES_PATH, &state.id).await?;
        state.id = Value::Null;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::resource::testing;

    fn zone() -> serde_json::Value {
        json!({
            "id": "z1",
            "name": "zone-a",
            "placementPolicy": "SPREAD",
            "cloudAccountId": "ca1",
            "externalRegionId": "us-east-1",
            "tagsToMatch": [{"key": "tier", "value": "web"}],
            "_links": {"region": {"href": "/iaas/api/regions/r1"}},
        })
    }

    #[tokio::test]
    async fn create_then_read() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ZONES_PATH))
            .and(body_partial_json(json!({
                "name": "zone-a",
                "regionId": "r1",
                "placementPolicy": "SPREAD",
                "tagsToMatch": [{"key": "tier", "value": "web"}],
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(zone()))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/iaas/api/zones/z1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(zone()))
            .mount(&server)
            .await;

        let tags_to_match = flatten_tags(&[crate::client::models::Tag {
            key: String::from("tier"),
            value: String::from("web"),
        }]);
        let mut state = ZoneState {
            id: Value::Unknown,
            name: value_string("zone-a"),
            region_id: value_string("r1"),
            placement_policy: value_string("SPREAD"),
            tags_to_match: tags_to_match.clone(),
            ..Default::default()
        };
        ZoneResource
            .create(&testing::client(&server), &mut state)
            .await
            .unwrap();

        assert_eq!(state.id, value_string("z1"));
        assert_eq!(state.region_id, value_string("r1"));
        assert_eq!(state.cloud_account_id, value_string("ca1"));
        assert_eq!(state.tags_to_match, tags_to_match);
        assert!(state.custom_properties.is_null());
    }

    #[test]
    fn placement_policy_is_checked() {
        let mut diags = Diagnostics::default();
        ZoneState {
            placement_policy: value_string("RANDOM"),
            ..Default::default()
        }
        .validate(&mut diags, AttributePath::default());
        assert_eq!(diags.errors.len(), 1);

        let mut state = ZoneState::default();
        state.normalize(&mut diags);
        assert_eq!(state.placement_policy, value_string("DEFAULT"));
    }
}
