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
use tf_provider::value::{Value, ValueList, ValueString};
use tf_provider::{map, AttributePath, Diagnostics};

use crate::client::models::{
    CloudAccount, CloudAccountGcpSpecification, UpdateRegionalCloudAccountSpecification,
};
use crate::client::ApiClient;
use crate::error::VraError;
use crate::utils::{with_id, WithNormalize, WithSchema, WithValidate};

use super::expand::{
    check_unique, expand_optional, expand_string, expand_string_list, expand_tags,
    flatten_regions, flatten_tags, optional_string, tags_schema, validate_unique, TagsState,
};
use super::{changed, created_id, fetch, remove, ResourceKind};

const CLOUD_ACCOUNTS_GCP_PATH: &str = "/iaas/api/cloud-accounts-gcp";

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudAccountGcpState<'a> {
    pub id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub description: ValueString<'a>,
    pub client_email: ValueString<'a>,
    pub private_key: ValueString<'a>,
    pub private_key_id: ValueString<'a>,
    pub project_id: ValueString<'a>,
    pub regions: ValueList<ValueString<'a>>,
    pub region_ids: ValueList<ValueString<'a>>,
    pub tags: TagsState<'a>,
}

with_id!(CloudAccountGcpState);

impl<'a> WithSchema for CloudAccountGcpState<'a> {
    fn schema() -> Schema {
        let required = |description, sensitive| Attribute {
            attr_type: AttributeType::String,
            description: Description::plain(description),
            constraint: AttributeConstraint::Required,
            sensitive,
            ..Default::default()
        };
        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "id" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Id of the cloud account"),
                        constraint: AttributeConstraint::Computed,
                        ..Default::default()
                    },
                    "name" => required("Name of the cloud account", false),
                    "description" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Description of the cloud account"),
                        constraint: AttributeConstraint::Optional,
                        ..Default::default()
                    },
                    "client_email" => required("Email of the GCP service account", false),
                    "private_key" => required("Private key of the GCP service account", true),
                    "private_key_id" => required("Id of the private key", false),
                    "project_id" => required("GCP project id", false),
                    "regions" => Attribute {
                        attr_type: AttributeType::List(Box::new(AttributeType::String)),
                        description: Description::plain("GCP regions to enable, like `us-west1`"),
                        constraint: AttributeConstraint::Optional,
                        ..Default::default()
                    },
                    "region_ids" => Attribute {
                        attr_type: AttributeType::List(Box::new(AttributeType::String)),
                        description: Description::plain("Ids of the enabled regions, in `regions` order"),
                        constraint: AttributeConstraint::Computed,
                        ..Default::default()
                    },
                },
                blocks: map! {
                    "tags" => tags_schema("Tags attached to the cloud account"),
                },
                description: Description::plain("GCP cloud account"),
                ..Default::default()
            },
        }
    }
}

impl<'a> WithValidate for CloudAccountGcpState<'a> {
    fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        validate_unique(diags, attr_path, "regions", &self.regions);
    }
}

impl<'a> WithNormalize for CloudAccountGcpState<'a> {
    fn normalize(&mut self, _diags: &mut Diagnostics) {}

    fn unknown_computed(&mut self) {
        self.region_ids = Value::Unknown;
    }
}

#[derive(Debug, Default, Clone)]
pub struct CloudAccountGcpResource;

#[async_trait]
impl ResourceKind for CloudAccountGcpResource {
    type State<'a> = CloudAccountGcpState<'a>;
    const NAME: &'static str = "GCP cloud account";

    /// Only the description, the regions and the tags can be patched
    fn replaced_attributes<'a>(
        &self,
        prior: &CloudAccountGcpState<'a>,
        planned: &CloudAccountGcpState<'a>,
    ) -> Vec<&'static str> {
        changed([
            ("name", prior.name != planned.name),
            ("client_email", prior.client_email != planned.client_email),
            ("private_key", prior.private_key != planned.private_key),
            ("private_key_id", prior.private_key_id != planned.private_key_id),
            ("project_id", prior.project_id != planned.project_id),
        ])
    }

    async fn create<'a>(
        &self,
        client: &ApiClient,
        state: &mut CloudAccountGcpState<'a>,
    ) -> Result<(), VraError> {
        let regions = expand_string_list(&state.regions);
        check_unique("regions", &regions)?;

        let specification = CloudAccountGcpSpecification {
            name: expand_string(&state.name),
            description: expand_optional(&state.description),
            client_email: expand_string(&state.client_email),
            private_key_id: expand_string(&state.private_key_id),
            private_key: expand_string(&state.private_key),
            project_id: expand_string(&state.project_id),
            region_ids: regions,
            create_default_zones: false,
            tags: expand_tags(&state.tags),
        };

        let account: CloudAccount = client.post(CLOUD_ACCOUNTS_GCP_PATH, &specification).await?;
        tracing::info!("GCP cloud account {} created", account.id);

        state.id = created_id(Self::NAME, account.id)?;
        self.read(client, state).await
    }

    async fn read<'a>(
        &self,
        client: &ApiClient,
        state: &mut CloudAccountGcpState<'a>,
    ) -> Result<(), VraError> {
        let Some(account) =
            fetch::<CloudAccount>(client, CLOUD_ACCOUNTS_GCP_PATH, &state.id).await?
        else {
            state.id = Value::Null;
            return Ok(());
        };

        let (regions, region_ids) =
            flatten_regions(&state.regions, &account.enabled_region_ids, &account.links)?;
        state.regions = regions;
        state.region_ids = region_ids;
        state.name = optional_string(account.name);
        state.description = optional_string(account.description);
        for (value, echoed) in [
            (&mut state.client_email, account.client_email),
            (&mut state.private_key_id, account.private_key_id),
            (&mut state.project_id, account.project_id),
        ] {
            if let Some(echoed) = echoed.filter(|echoed| !echoed.is_empty()) {
                *value = Value::Value(echoed.into());
            }
        }
        state.tags = flatten_tags(&account.tags);

        Ok(())
    }

    async fn update<'a>(
        &self,
        client: &ApiClient,
        state: &mut CloudAccountGcpState<'a>,
    ) -> Result<(), VraError> {
        let regions = expand_string_list(&state.regions);
        check_unique("regions", &regions)?;

        let specification = UpdateRegionalCloudAccountSpecification {
            description: expand_optional(&state.description),
            region_ids: regions,
            create_default_zones: false,
            tags: expand_tags(&state.tags),
        };
        let path = format!("{CLOUD_ACCOUNTS_GCP_PATH}/{}", state.id.as_str());
        let _: CloudAccount = client.patch(&path, &specification).await?;

        self.read(client, state).await
    }

    async fn delete<'a>(
        &self,
        client: &ApiClient,
        state: &mut CloudAccountGcpState<'a>,
    ) -> Result<(), VraError> {
        remove(client, CLOUD_ACCOUNTS_GCP_PATH, &state.id).await?;
        state.id = Value::Null;
        Ok(())
    }
}
