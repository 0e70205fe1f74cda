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
    CloudAccount, CloudAccountAzureSpecification, UpdateRegionalCloudAccountSpecification,
};
use crate::client::ApiClient;
use crate::error::VraError;
use crate::utils::{with_id, WithNormalize, WithSchema, WithValidate};

use super::expand::{
    check_unique, expand_optional, expand_string, expand_string_list, expand_tags,
    flatten_regions, flatten_tags, optional_string, tags_schema, validate_unique, TagsState,
};
use super::{changed, created_id, fetch, remove, ResourceKind};

const CLOUD_ACCOUNTS_AZURE_PATH: &str = "/iaas/api/cloud-accounts-azure";

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudAccountAzureState<'a> {
    pub id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub description: ValueString<'a>,
    pub application_id: ValueString<'a>,
    pub application_key: ValueString<'a>,
    pub subscription_id: ValueString<'a>,
    pub tenant_id: ValueString<'a>,
    pub regions: ValueList<ValueString<'a>>,
    pub region_ids: ValueList<ValueString<'a>>,
    pub tags: TagsState<'a>,
}

with_id!(CloudAccountAzureState);

impl<'a> WithSchema for CloudAccountAzureState<'a> {
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
                    "application_id" => required("Azure client application id", false),
                    "application_key" => required("Azure client application secret key", true),
                    "subscription_id" => required("Azure subscription id", false),
                    "tenant_id" => required("Azure tenant id", false),
                    "regions" => Attribute {
                        attr_type: AttributeType::List(Box::new(AttributeType::String)),
                        description: Description::plain("Azure regions to enable, like `westus`"),
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
                description: Description::plain("Azure cloud account"),
                ..Default::default()
            },
        }
    }
}

impl<'a> WithValidate for CloudAccountAzureState<'a> {
    fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        validate_unique(diags, attr_path, "regions", &self.regions);
    }
}

impl<'a> WithNormalize for CloudAccountAzureState<'a> {
    fn normalize(&mut self, _diags: &mut Diagnostics) {}

    fn unknown_computed(&mut self) {
        self.region_ids = Value::Unknown;
    }
}

#[derive(Debug, Default, Clone)]
pub struct CloudAccountAzureResource;

#[async_trait]
impl ResourceKind for CloudAccountAzureResource {
    type State<'a> = CloudAccountAzureState<'a>;
    const NAME: &'static str = "Azure cloud account";

    /// Only the description, the regions and the tags can be patched
    fn replaced_attributes<'a>(
        &self,
        prior: &CloudAccountAzureState<'a>,
        planned: &CloudAccountAzureState<'a>,
    ) -> Vec<&'static str> {
        changed([
            ("name", prior.name != planned.name),
            ("application_id", prior.application_id != planned.application_id),
            ("application_key", prior.application_key != planned.application_key),
            ("subscription_id", prior.subscription_id != planned.subscription_id),
            ("tenant_id", prior.tenant_id != planned.tenant_id),
        ])
    }

    async fn create<'a>(
        &self,
        client: &ApiClient,
        state: &mut CloudAccountAzureState<'a>,
    ) -> Result<(), VraError> {
        let regions = expand_string_list(&state.regions);
        check_unique("regions", &regions)?;

        let specification = CloudAccountAzureSpecification {
            name: expand_string(&state.name),
            description: expand_optional(&state.description),
            subscription_id: expand_string(&state.subscription_id),
            tenant_id: expand_string(&state.tenant_id),
            client_application_id: expand_string(&state.application_id),
            client_application_secret_key: expand_string(&state.application_key),
            region_ids: regions,
            create_default_zones: false,
            tags: expand_tags(&state.tags),
        };

        let account: CloudAccount = client
            .post(CLOUD_ACCOUNTS_AZURE_PATH, &specification)
            .await?;
        tracing::info!("Azure cloud account {} created", account.id);

        state.id = created_id(Self::NAME, account.id)?;
        self.read(client, state).await
    }

    async fn read<'a>(
        &self,
        client: &ApiClient,
        state: &mut CloudAccountAzureState<'a>,
    ) -> Result<(), VraError> {
        let Some(account) =
            fetch::<CloudAccount>(client, CLOUD_ACCOUNTS_AZURE_PATH, &state.id).await?
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
            (&mut state.application_id, account.client_application_id),
            (&mut state.subscription_id, account.subscription_id),
            (&mut state.tenant_id, account.tenant_id),
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
        state: &mut CloudAccountAzureState<'a>,
    ) -> Result<(), VraError> {
        let regions = expand_string_list(&state.regions);
        check_unique("regions", &regions)?;

        let specification = UpdateRegionalCloudAccountSpecification {
            description: expand_optional(&state.description),
            region_ids: regions,
            create_default_zones: false,
            tags: expand_tags(&state.tags),
        };
        let path = format!("{CLOUD_ACCOUNTS_AZURE_PATH}/{}", state.id.as_str());
        let _: CloudAccount = client.patch(&path, &specification).await?;

        self.read(client, state).await
    }

    async fn delete<'a>(
        &self,
        client: &ApiClient,
        state: &mut CloudAccountAzureState<'a>,
    ) -> Result<(), VraError> {
        remove(client, CLOUD_ACCOUNTS_AZURE_PATH, &state.id).await?;
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
    use crate::resource::expand::{flatten_string_list, value_string};
    use crate::resource::testing;

    fn planned() -> CloudAccountAzureState<'static> {
        CloudAccountAzureState {
            id: Value::Unknown,
            name: value_string("azure"),
            application_id: value_string("app"),
            application_key: value_string("k3y"),
            subscription_id: value_string("sub"),
            tenant_id: value_string("tenant"),
            regions: flatten_string_list(&[String::from("westus")]),
            region_ids: Value::Unknown,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_keeps_the_application_key() {
        let server = MockServer::start().await;
        let account = json!({
            "id": "az1",
            "name": "azure",
            "clientApplicationId": "app",
            "subscriptionId": "sub",
            "tenantId": "tenant",
            "enabledRegionIds": ["westus"],
            "_links": {"regions": {"hrefs": ["/iaas/api/regions/r-westus"]}},
        });
        Mock::given(method("POST"))
            .and(path(CLOUD_ACCOUNTS_AZURE_PATH))
            .and(body_partial_json(json!({
                "clientApplicationId": "app",
                "clientApplicationSecretKey": "k3y",
                "regionIds": ["westus"],
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(account.clone()))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/iaas/api/cloud-accounts-azure/az1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(account))
            .mount(&server)
            .await;

        let mut state = planned();
        CloudAccountAzureResource
            .create(&testing::client(&server), &mut state)
            .await
            .unwrap();

        assert_eq!(state.id, value_string("az1"));
        assert_eq!(state.application_key, value_string("k3y"));
        assert_eq!(state.region_ids, flatten_string_list(&[String::from("r-westus")]));
    }

    #[tokio::test]
    async fn duplicate_regions_never_reach_the_api() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut state = CloudAccountAzureState {
            id: value_string("az1"),
            regions: flatten_string_list(&[String::from("westus"), String::from("westus")]),
            ..planned()
        };
        let err = CloudAccountAzureResource
            .update(&testing::client(&server), &mut state)
            .await
            .unwrap_err();
        assert!(matches!(err, VraError::Validation { attribute: "regions", .. }));
    }
}
