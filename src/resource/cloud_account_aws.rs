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
    CloudAccount, CloudAccountAwsSpecification, UpdateRegionalCloudAccountSpecification,
};
use crate::client::ApiClient;
use crate::error::VraError;
use crate::utils::{with_id, WithNormalize, WithSchema, WithValidate};

use super::expand::{
    check_unique, expand_optional, expand_string, expand_string_list, expand_tags,
    flatten_regions, flatten_tags, optional_string, tags_schema, validate_unique, TagsState,
};
use super::{changed, created_id, fetch, remove, ResourceKind};

const CLOUD_ACCOUNTS_AWS_PATH: &str = "/iaas/api/cloud-accounts-aws";

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudAccountAwsState<'a> {
    pub id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub description: ValueString<'a>,
    pub access_key: ValueString<'a>,
    pub secret_key: ValueString<'a>,
    pub regions: ValueList<ValueString<'a>>,
    pub region_ids: ValueList<ValueString<'a>>,
    pub tags: TagsState<'a>,
}

with_id!(CloudAccountAwsState);

impl<'a> WithSchema for CloudAccountAwsState<'a> {
    fn schema() -> Schema {
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
                    "name" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Name of the cloud account"),
                        constraint: AttributeConstraint::Required,
                        ..Default::default()
                    },
                    "description" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Description of the cloud account"),
                        constraint: AttributeConstraint::Optional,
                        ..Default::default()
                    },
                    "access_key" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("AWS access key id"),
                        constraint: AttributeConstraint::Required,
                        ..Default::default()
                    },
                    "secret_key" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("AWS secret access key"),
                        constraint: AttributeConstraint::Required,
                        sensitive: true,
                        ..Default::default()
                    },
                    "regions" => Attribute {
                        attr_type: AttributeType::List(Box::new(AttributeType::String)),
                        description: Description::plain("AWS regions to enable, like `us-east-1`"),
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
                description: Description::plain("AWS cloud account"),
                ..Default::default()
            },
        }
    }
}

impl<'a> WithValidate for CloudAccountAwsState<'a> {
    fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        validate_unique(diags, attr_path, "regions", &self.regions);
    }
}

impl<'a> WithNormalize for CloudAccountAwsState<'a> {
    fn normalize(&mut self, _diags: &mut Diagnostics) {}

    fn unknown_computed(&mut self) {
        self.region_ids = Value::Unknown;
    }
}

#[derive(Debug, Default, Clone)]
pub struct CloudAccountAwsResource;

#[async_trait]
impl ResourceKind for CloudAccountAwsResource {
    type State<'a> = CloudAccountAwsState<'a>;
    const NAME: &'static str = "AWS cloud account";

    /// Only the description, the regions and the tags can be patched
    fn replaced_attributes<'a>(
        &self,
        prior: &CloudAccountAwsState<'a>,
        planned: &CloudAccountAwsState<'a>,
    ) -> Vec<&'static str> {
        changed([
            ("name", prior.name != planned.name),
            ("access_key", prior.access_key != planned.access_key),
            ("secret_key", prior.secret_key != planned.secret_key),
        ])
    }

    async fn create<'a>(
        &self,
        client: &ApiClient,
        state: &mut CloudAccountAwsState<'a>,
    ) -> Result<(), VraError> {
        let regions = expand_string_list(&state.regions);
        check_unique("regions", &regions)?;

        let specification = CloudAccountAwsSpecification {
            name: expand_string(&state.name),
            description: expand_optional(&state.description),
            access_key_id: expand_string(&state.access_key),
            secret_access_key: expand_string(&state.secret_key),
            region_ids: regions,
            create_default_zones: false,
            tags: expand_tags(&state.tags),
        };

        let account: CloudAccount = client.post(CLOUD_ACCOUNTS_AWS_PATH, &specification).await?;
        tracing::info!("AWS cloud account {} created", account.id);

        state.id = created_id(Self::NAME, account.id)?;
        self.read(client, state).await
    }

    async fn read<'a>(
        &self,
        client: &ApiClient,
        state: &mut CloudAccountAwsState<'a>,
    ) -> Result<(), VraError> {
        let Some(account) =
            fetch::<CloudAccount>(client, CLOUD_ACCOUNTS_AWS_PATH, &state.id).await?
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
        if let Some(access_key) = account.access_key_id.filter(|key| !key.is_empty()) {
            state.access_key = Value::Value(access_key.into());
        }
        state.tags = flatten_tags(&account.tags);

        Ok(())
    }

    async fn update<'a>(
        &self,
        client: &ApiClient,
        state: &mut CloudAccountAwsState<'a>,
    ) -> Result<(), VraError> {
        let regions = expand_string_list(&state.regions);
        check_unique("regions", &regions)?;

        let specification = UpdateRegionalCloudAccountSpecification {
            description: expand_optional(&state.description),
            region_ids: regions,
            create_default_zones: false,
            tags: expand_tags(&state.tags),
        };
        let path = format!("{CLOUD_ACCOUNTS_AWS_PATH}/{}", state.id.as_str());
        let _: CloudAccount = client.patch(&path, &specification).await?;

        self.read(client, state).await
    }

    async fn delete<'a>(
        &self,
        client: &ApiClient,
        state: &mut CloudAccountAwsState<'a>,
    ) -> Result<(), VraError> {
        remove(client, CLOUD_ACCOUNTS_AWS_PATH, &state.id).await?;
        state.id = Value::Null;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use tf_provider::Resource;

    use super::*;
    use crate::resource::expand::{flatten_string_list, value_string};
    use crate::resource::{testing, VraResource};

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    fn planned(regions: &[&str]) -> CloudAccountAwsState<'static> {
        CloudAccountAwsState {
            id: Value::Unknown,
            name: value_string("aws"),
            access_key: value_string("AKIA"),
            secret_key: value_string("s3cr3t"),
            regions: flatten_string_list(&strings(regions)),
            region_ids: Value::Unknown,
            tags: Value::Null,
            ..Default::default()
        }
    }

    fn account() -> serde_json::Value {
        json!({
            "id": "ca1",
            "name": "aws",
            "accessKeyId": "AKIA",
            "enabledRegionIds": ["us-west-1", "us-east-1"],
            "_links": {
                "regions": {"hrefs": ["/iaas/api/regions/west", "/iaas/api/regions/east"]},
            },
        })
    }

    #[tokio::test]
    async fn regions_follow_submission_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(CLOUD_ACCOUNTS_AWS_PATH))
            .and(body_json(json!({
                "name": "aws",
                "accessKeyId": "AKIA",
                "secretAccessKey": "s3cr3t",
                "regionIds": ["us-east-1", "us-west-1"],
                "createDefaultZones": false,
                "tags": [],
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(account()))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/iaas/api/cloud-accounts-aws/ca1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(account()))
            .mount(&server)
            .await;

        let mut state = planned(&["us-east-1", "us-west-1"]);
        CloudAccountAwsResource
            .create(&testing::client(&server), &mut state)
            .await
            .unwrap();

        assert_eq!(state.id, value_string("ca1"));
        assert_eq!(state.regions, flatten_string_list(&strings(&["us-east-1", "us-west-1"])));
        assert_eq!(state.region_ids, flatten_string_list(&strings(&["east", "west"])));
        assert_eq!(state.secret_key, value_string("s3cr3t"));
    }

    #[tokio::test]
    async fn duplicate_regions_never_reach_the_api() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(CLOUD_ACCOUNTS_AWS_PATH))
            .respond_with(ResponseTemplate::new(201).set_body_json(account()))
            .expect(0)
            .mount(&server)
            .await;

        let mut state = planned(&["us-east-1", "us-west-1", "us-east-1"]);
        let err = CloudAccountAwsResource
            .create(&testing::client(&server), &mut state)
            .await
            .unwrap_err();

        assert!(matches!(err, VraError::Validation { attribute: "regions", .. }));
        assert_eq!(err.to_string(), "specified regions are not unique: us-east-1");
        assert_eq!(state.id, Value::Unknown);
    }

    #[tokio::test]
    async fn update_patches_regions_and_tags() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/iaas/api/cloud-accounts-aws/ca1"))
            .and(body_json(json!({
                "description": "main account",
                "regionIds": ["us-east-1", "us-west-1"],
                "createDefaultZones": false,
                "tags": [{"key": "env", "value": "prod"}],
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(account()))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/iaas/api/cloud-accounts-aws/ca1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "ca1",
                "name": "aws",
                "description": "main account",
                "enabledRegionIds": ["us-west-1", "us-east-1"],
                "tags": [{"key": "env", "value": "prod"}],
                "_links": {
                    "regions": {"hrefs": ["/iaas/api/regions/west", "/iaas/api/regions/east"]},
                },
            })))
            .mount(&server)
            .await;

        let tags = flatten_tags(&[crate::client::models::Tag {
            key: String::from("env"),
            value: String::from("prod"),
        }]);
        let mut state = CloudAccountAwsState {
            id: value_string("ca1"),
            description: value_string("main account"),
            tags: tags.clone(),
            ..planned(&["us-east-1", "us-west-1"])
        };
        CloudAccountAwsResource
            .update(&testing::client(&server), &mut state)
            .await
            .unwrap();

        assert_eq!(state.description, value_string("main account"));
        assert_eq!(state.tags, tags);
        assert_eq!(state.region_ids, flatten_string_list(&strings(&["east", "west"])));
    }

    #[tokio::test]
    async fn duplicate_regions_never_reach_the_api_on_update() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/iaas/api/cloud-accounts-aws/ca1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(account()))
            .expect(0)
            .mount(&server)
            .await;

        let mut state = CloudAccountAwsState {
            id: value_string("ca1"),
            ..planned(&["us-west-1", "us-west-1"])
        };
        let err = CloudAccountAwsResource
            .update(&testing::client(&server), &mut state)
            .await
            .unwrap_err();

        assert!(matches!(err, VraError::Validation { attribute: "regions", .. }));
        assert_eq!(state.id, value_string("ca1"));
    }

    #[tokio::test]
    async fn credential_and_name_changes_replace_the_account() {
        let prior = CloudAccountAwsState {
            id: value_string("ca1"),
            region_ids: flatten_string_list(&strings(&["east"])),
            ..planned(&["us-east-1"])
        };
        let renamed = CloudAccountAwsState {
            name: value_string("aws-prod"),
            access_key: value_string("AKIB"),
            ..prior.clone()
        };
        let described = CloudAccountAwsState {
            description: value_string("main account"),
            ..prior.clone()
        };

        assert_eq!(
            CloudAccountAwsResource.replaced_attributes(&prior, &renamed),
            vec!["name", "access_key"]
        );
        assert!(CloudAccountAwsResource
            .replaced_attributes(&prior, &described)
            .is_empty());

        let resource = VraResource::new(Default::default(), CloudAccountAwsResource);
        let mut diags = Diagnostics::default();
        let (_, _, replace) = resource
            .plan_update(
                &mut diags,
                Value::Value(prior.clone()),
                Value::Value(renamed.clone()),
                Value::Value(renamed),
                Default::default(),
                Default::default(),
            )
            .await
            .unwrap();
        assert_eq!(replace.len(), 2);

        let (_, _, replace) = resource
            .plan_update(
                &mut diags,
                Value::Value(prior),
                Value::Value(described.clone()),
                Value::Value(described),
                Default::default(),
                Default::default(),
            )
            .await
            .unwrap();
        assert!(replace.is_empty());
    }

    #[tokio::test]
    async fn deleted_account_reads_as_absent() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/iaas/api/cloud-accounts-aws/ca1"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/iaas/api/cloud-accounts-aws/ca1"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "gone"})))
            .mount(&server)
            .await;

        let client = testing::client(&server);
        let mut state = CloudAccountAwsState {
            id: value_string("ca1"),
            ..planned(&[])
        };
        CloudAccountAwsResource.delete(&client, &mut state).await.unwrap();
        assert!(state.id.is_null());

        let mut stale = CloudAccountAwsState {
            id: value_string("ca1"),
            ..planned(&[])
        };
        CloudAccountAwsResource.read(&client, &mut stale).await.unwrap();
        assert!(stale.id.is_null());
    }
}
