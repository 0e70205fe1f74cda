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
use tf_provider::value::{Value, ValueBool, ValueString};
use tf_provider::{map, AttributePath, Diagnostics};

use crate::client::models::{
    CloudAccount, CloudAccountNsxVSpecification, UpdateCloudAccountSpecification,
};
use crate::client::ApiClient;
use crate::error::VraError;
use crate::utils::{with_id, WithNormalize, WithSchema, WithValidate};

use super::expand::{
    expand_bool, expand_optional, expand_string, expand_tags, flatten_tags, optional_string,
    tags_schema, TagsState,
};
use super::{changed, created_id, fetch, remove, ResourceKind};

const CLOUD_ACCOUNTS_NSXV_PATH: &str = "/iaas/api/cloud-accounts-nsx-v";

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudAccountNsxvState<'a> {
    pub id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub description: ValueString<'a>,
    pub hostname: ValueString<'a>,
    pub dc_id: ValueString<'a>,
    pub username: ValueString<'a>,
    pub password: ValueString<'a>,
    pub accept_self_signed_cert: ValueBool,
    pub tags: TagsState<'a>,
}

with_id!(CloudAccountNsxvState);

impl<'a> WithSchema for CloudAccountNsxvState<'a> {
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
                    "hostname" => required("Host name or IP address of the NSX-V manager", false),
                    "dc_id" => required("Id of the data collector", false),
                    "username" => required("NSX-V manager user", false),
                    "password" => required("NSX-V manager password", true),
                    "accept_self_signed_cert" => Attribute {
                        attr_type: AttributeType::Bool,
                        description: Description::plain("Accept the certificate of the manager when it is self signed"),
                        constraint: AttributeConstraint::OptionalComputed,
                        ..Default::default()
                    },
                },
                blocks: map! {
                    "tags" => tags_schema("Tags attached to the cloud account"),
                },
                description: Description::plain("NSX-V cloud account"),
                ..Default::default()
            },
        }
    }
}

impl<'a> WithValidate for CloudAccountNsxvState<'a> {
    fn validate(&self, _diags: &mut Diagnostics, _attr_path: AttributePath) {}
}

impl<'a> WithNormalize for CloudAccountNsxvState<'a> {
    fn normalize(&mut self, _diags: &mut Diagnostics) {
        if self.accept_self_signed_cert.is_null() {
            self.accept_self_signed_cert = Value::Value(false);
        }
    }

    fn unknown_computed(&mut self) {}
}

#[derive(Debug, Default, Clone)]
pub struct CloudAccountNsxvResource;

#[async_trait]
impl ResourceKind for CloudAccountNsxvResource {
    type State<'a> = CloudAccountNsxvState<'a>;
    const NAME: &'static str = "NSX-V cloud account";

    /// Only the description, and the tags can be patched
    fn replaced_attributes<'a>(
        &self,
        prior: &CloudAccountNsxvState<'a>,
        planned: &CloudAccountNsxvState<'a>,
    ) -> Vec<&'static str> {
        changed([
            ("name", prior.name != planned.name),
            ("hostname", prior.hostname != planned.hostname),
            ("dc_id", prior.dc_id != planned.dc_id),
            ("username", prior.username != planned.username),
            ("password", prior.password != planned.password),
            (
                "accept_self_signed_cert",
                prior.accept_self_signed_cert != planned.accept_self_signed_cert,
            ),
        ])
    }

    async fn create<'a>(
        &self,
        client: &ApiClient,
        state: &mut CloudAccountNsxvState<'a>,
    ) -> Result<(), VraError> {
        let specification = CloudAccountNsxVSpecification {
            name: expand_string(&state.name),
            description: expand_optional(&state.description),
            host_name: expand_string(&state.hostname),
            dcid: expand_string(&state.dc_id),
            username: expand_string(&state.username),
            password: expand_string(&state.password),
            accept_self_signed_certificate: expand_bool(&state.accept_self_signed_cert)
                .unwrap_or(false),
            tags: expand_tags(&state.tags),
        };

        let account: CloudAccount = client
            .post(CLOUD_ACCOUNTS_NSXV_PATH, &specification)
            .await?;
        tracing::info!("NSX-V cloud account {} created", account.id);

        state.id = created_id(Self::NAME, account.id)?;
        self.read(client, state).await
    }

    async fn read<'a>(
        &self,
        client: &ApiClient,
        state: &mut CloudAccountNsxvState<'a>,
    ) -> Result<(), VraError> {
        let Some(account) =
            fetch::<CloudAccount>(client, CLOUD_ACCOUNTS_NSXV_PATH, &state.id).await?
        else {
            state.id = Value::Null;
            return Ok(());
        };

        state.name = optional_string(account.name);
        state.description = optional_string(account.description);
        for (value, echoed) in [
            (&mut state.hostname, account.host_name),
            (&mut state.dc_id, account.dcid),
            (&mut state.username, account.username),
        ] {
            if let Some(echoed) = echoed.filter(|echoed| !echoed.is_empty()) {
                *value = Value::Value(echoed.into());
            }
        }
        if let Some(accept) = account.accept_self_signed_certificate {
            state.accept_self_signed_cert = Value::Value(accept);
        } else if !matches!(state.accept_self_signed_cert, Value::Value(_)) {
            state.accept_self_signed_cert = Value::Value(false);
        }
        state.tags = flatten_tags(&account.tags);

        Ok(())
    }

    async fn update<'a>(
        &self,
        client: &ApiClient,
        state: &mut CloudAccountNsxvState<'a>,
    ) -> Result<(), VraError> {
        let specification = UpdateCloudAccountSpecification {
            description: expand_optional(&state.description),
            tags: expand_tags(&state.tags),
        };
        let path = format!("{CLOUD_ACCOUNTS_NSXV_PATH}/{}", state.id.as_str());
        let _: CloudAccount = client.patch(&path, &specification).await?;

        self.read(client, state).await
    }

    async fn delete<'a>(
        &self,
        client: &ApiClient,
        state: &mut CloudAccountNsxvState<'a>,
    ) -> Result<(), VraError> {
        remove(client, CLOUD_ACCOUNTS_NSXV_PATH, &state.id).await?;
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
    use crate::resource::expand::value_string;
    use crate::resource::testing;

    fn account() -> serde_json::Value {
        json!({
            "id": "nsx1",
            "name": "nsx",
            "hostName": "nsx.example.com",
            "dcid": "dc1",
            "username": "admin",
            "acceptSelfSignedCertificate": true,
        })
    }

    #[tokio::test]
    async fn create_sends_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(CLOUD_ACCOUNTS_NSXV_PATH))
            .and(body_json(json!({
                "name": "nsx",
                "hostName": "nsx.example.com",
                "dcid": "dc1",
                "username": "admin",
                "password": "pa55",
                "acceptSelfSignedCertificate": true,
                "tags": [],
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(account()))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/iaas/api/cloud-accounts-nsx-v/nsx1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(account()))
            .mount(&server)
            .await;

        let mut state = CloudAccountNsxvState {
            id: Value::Unknown,
            name: value_string("nsx"),
            hostname: value_string("nsx.example.com"),
            dc_id: value_string("dc1"),
            username: value_string("admin"),
            password: value_string("pa55"),
            accept_self_signed_cert: Value::Value(true),
            ..Default::default()
        };
        CloudAccountNsxvResource
            .create(&testing::client(&server), &mut state)
            .await
            .unwrap();

        assert_eq!(state.id, value_string("nsx1"));
        assert_eq!(state.password, value_string("pa55"));
        assert_eq!(state.accept_self_signed_cert, Value::Value(true));
    }

    #[tokio::test]
    async fn update_patches_description_and_tags() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/iaas/api/cloud-accounts-nsx-v/nsx1"))
            .and(body_json(json!({"description": "lab", "tags": []})))
            .respond_with(ResponseTemplate::new(200).set_body_json(account()))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/iaas/api/cloud-accounts-nsx-v/nsx1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "nsx1",
                "name": "nsx",
                "description": "lab",
            })))
            .mount(&server)
            .await;

        let mut state = CloudAccountNsxvState {
            id: value_string("nsx1"),
            description: value_string("lab"),
            ..Default::default()
        };
        CloudAccountNsxvResource
            .update(&testing::client(&server), &mut state)
            .await
            .unwrap();
        assert_eq!(state.description, value_string("lab"));
        assert_eq!(state.accept_self_signed_cert, Value::Value(false));
    }
}
