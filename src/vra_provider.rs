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

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use tf_provider::schema::{Attribute, AttributeConstraint, AttributeType, Block, Description, Schema};
use tf_provider::value::{Value, ValueBool, ValueEmpty, ValueString};
use tf_provider::{map, AttributePath, Diagnostics, Provider};

use crate::client::{ApiClient, ClientConfig, Credentials};
use crate::data_source::{NetworkLookup, ProjectLookup, VraDataSource, ZoneLookup};
use crate::resource::{
    ClientHandle, CloudAccountAwsResource, CloudAccountAzureResource, CloudAccountGcpResource,
    CloudAccountNsxvResource, FlavorProfileResource, ImageProfileResource, LoadBalancerResource,
    MachineResource, NetworkResource, ProjectResource, StorageProfileResource, VraResource,
    ZoneResource,
};
use crate::utils::{WithSchema, WithValidate};

pub const URL_ENV: &str = "VRA_URL";
pub const REFRESH_TOKEN_ENV: &str = "VRA_REFRESH_TOKEN";
pub const ACCESS_TOKEN_ENV: &str = "VRA_ACCESS_TOKEN";
pub const INSECURE_ENV: &str = "VRA7_INSECURE";

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig<'a> {
    pub url: ValueString<'a>,
    pub refresh_token: ValueString<'a>,
    pub access_token: ValueString<'a>,
    pub insecure: ValueBool,
}

impl<'a> WithSchema for ProviderConfig<'a> {
    fn schema() -> Schema {
        let attribute = |description, sensitive| Attribute {
            attr_type: AttributeType::String,
            description: Description::plain(description),
            constraint: AttributeConstraint::Optional,
            sensitive,
            ..Default::default()
        };
        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "url" => attribute("Base url of the vRA API, defaults to `VRA_URL`", false),
                    "refresh_token" => attribute("Refresh token exchanged for an access token, defaults to `VRA_REFRESH_TOKEN`", true),
                    "access_token" => attribute("Access token used as is, defaults to `VRA_ACCESS_TOKEN`", true),
                    "insecure" => Attribute {
                        attr_type: AttributeType::Bool,
                        description: Description::plain("Accept invalid TLS certificates, defaults to `VRA7_INSECURE`"),
                        constraint: AttributeConstraint::Optional,
                        ..Default::default()
                    },
                },
                description: Description::plain("vRealize Automation IaaS"),
                ..Default::default()
            },
        }
    }
}

impl<'a> WithValidate for ProviderConfig<'a> {
    fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        if let (Value::Value(_), Value::Value(_)) = (&self.refresh_token, &self.access_token) {
            diags.error(
                "Conflicting credentials",
                "`refresh_token` and `access_token` cannot be set together",
                attr_path.attribute("access_token"),
            );
        }
    }
}

impl<'a> ProviderConfig<'a> {
    /// Settings of the client, unset attributes fall back to the environment
    pub fn resolve(&self, env: impl Fn(&str) -> Option<String>) -> Result<ClientConfig> {
        let setting = |value: &ValueString<'_>, name: &str| {
            value
                .as_deref_option()
                .map(str::to_owned)
                .or_else(|| env(name))
                .filter(|value| !value.is_empty())
        };

        let Some(url) = setting(&self.url, URL_ENV) else {
            bail!("`url` is required, set it in the provider block or with {URL_ENV}");
        };

        let credentials = if let Some(token) = self.access_token.as_deref_option() {
            Credentials::AccessToken(token.to_owned())
        } else if let Some(token) = self.refresh_token.as_deref_option() {
            Credentials::RefreshToken(token.to_owned())
        } else {
            match (env(REFRESH_TOKEN_ENV), env(ACCESS_TOKEN_ENV)) {
                (Some(_), Some(_)) => bail!(
                    "{REFRESH_TOKEN_ENV} and {ACCESS_TOKEN_ENV} cannot be set together"
                ),
                (Some(token), None) => Credentials::RefreshToken(token),
                (None, Some(token)) => Credentials::AccessToken(token),
                (None, None) => bail!(
                    "one of `refresh_token` or `access_token` is required, set it in the provider block or with {REFRESH_TOKEN_ENV} or {ACCESS_TOKEN_ENV}"
                ),
            }
        };

        let insecure = match &self.insecure {
            Value::Value(insecure) => *insecure,
            _ => match env(INSECURE_ENV) {
                Some(insecure) => insecure
                    .parse::<bool>()
                    .map_err(|_| anyhow!("{INSECURE_ENV} must be `true` or `false`, got `{insecure}`"))?,
                None => false,
            },
        };

        Ok(ClientConfig {
            url,
            credentials,
            insecure,
        })
    }
}

#[derive(Debug, Default, Clone)]
pub struct VraProvider {
    client: ClientHandle,
}

#[async_trait]
impl Provider for VraProvider {
    type Config<'a> = ProviderConfig<'a>;
    type MetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(ProviderConfig::schema())
    }

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::Config<'a>) -> Option<()> {
        config.validate(diags, AttributePath::default());

        if diags.errors.is_empty() {
            Some(())
        } else {
            None
        }
    }

    async fn configure<'a>(
        &self,
        diags: &mut Diagnostics,
        terraform_version: String,
        config: Self::Config<'a>,
    ) -> Option<()> {
        let config = match config.resolve(|name| std::env::var(name).ok()) {
            Ok(config) => config,
            Err(err) => {
                diags.root_error("Invalid provider configuration", err.to_string());
                return None;
            }
        };

        tracing::info!("connecting to {} for terraform {terraform_version}", config.url);
        let client = match ApiClient::connect(&config).await {
            Ok(client) => client,
            Err(err) => {
                diags.root_error("Failed to connect to vRA", err.to_string());
                return None;
            }
        };

        if self.client.set(client).is_err() {
            tracing::debug!("provider already configured, keeping the first client");
        }
        Some(())
    }

    fn get_resources(
        &self,
        _diags: &mut Diagnostics,
    ) -> Option<std::collections::HashMap<String, Box<dyn tf_provider::DynamicResource>>>
    {
        let client = &self.client;
        Some(map! {
            "vra_machine" => VraResource::new(client.clone(), MachineResource::default()),
            "vra_network" => VraResource::new(client.clone(), NetworkResource::default()),
            "vra_load_balancer" => VraResource::new(client.clone(), LoadBalancerResource::default()),
            "vra_cloud_account_aws" => VraResource::new(client.clone(), CloudAccountAwsResource),
            "vra_cloud_account_azure" => VraResource::new(client.clone(), CloudAccountAzureResource),
            "vra_cloud_account_gcp" => VraResource::new(client.clone(), CloudAccountGcpResource),
            "vra_cloud_account_nsxv" => VraResource::new(client.clone(), CloudAccountNsxvResource),
            "vra_project" => VraResource::new(client.clone(), ProjectResource),
            "vra_zone" => VraResource::new(client.clone(), ZoneResource),
            "vra_storage_profile" => VraResource::new(client.clone(), StorageProfileResource),
            "vra_flavor_profile" => VraResource::new(client.clone(), FlavorProfileResource),
            "vra_image_profile" => VraResource::new(client.clone(), ImageProfileResource),
        })
    }

    fn get_data_sources(
        &self,
        _diags: &mut Diagnostics,
    ) -> Option<
        std::collections::HashMap<String, Box<dyn tf_provider::DynamicDataSource>>,
    > {
        Some(map! {
            "vra_project" => VraDataSource::<ProjectLookup>::new(self.client.clone()),
            "vra_zone" => VraDataSource::<ZoneLookup>::new(self.client.clone()),
            "vra_network" => VraDataSource::<NetworkLookup>::new(self.client.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::resource::expand::value_string;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars = vars
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect::<HashMap<_, _>>();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn environment_fills_unset_attributes() {
        let config = ProviderConfig::default()
            .resolve(env(&[
                (URL_ENV, "https://vra.example.com"),
                (REFRESH_TOKEN_ENV, "refresh"),
                (INSECURE_ENV, "true"),
            ]))
            .unwrap();

        assert_eq!(
            config,
            ClientConfig {
                url: String::from("https://vra.example.com"),
                credentials: Credentials::RefreshToken(String::from("refresh")),
                insecure: true,
            }
        );
    }

    #[test]
    fn attributes_take_precedence() {
        let config = ProviderConfig {
            url: value_string("https://other.example.com"),
            access_token: value_string("access"),
            insecure: Value::Value(false),
            ..Default::default()
        }
        .resolve(env(&[
            (URL_ENV, "https://vra.example.com"),
            (REFRESH_TOKEN_ENV, "refresh"),
            (INSECURE_ENV, "true"),
        ]))
        .unwrap();

        assert_eq!(config.url, "https://other.example.com");
        assert_eq!(config.credentials, Credentials::AccessToken(String::from("access")));
        assert!(!config.insecure);
    }

    #[test]
    fn credentials_are_required() {
        let err = ProviderConfig::default()
            .resolve(env(&[(URL_ENV, "https://vra.example.com")]))
            .unwrap_err();
        assert!(err.to_string().contains("access_token"));

        let err = ProviderConfig::default()
            .resolve(env(&[
                (URL_ENV, "https://vra.example.com"),
                (REFRESH_TOKEN_ENV, "refresh"),
                (ACCESS_TOKEN_ENV, "access"),
            ]))
            .unwrap_err();
        assert!(err.to_string().contains("cannot be set together"));
    }

    #[test]
    fn both_tokens_conflict() {
        let mut diags = Diagnostics::default();
        ProviderConfig {
            refresh_token: value_string("refresh"),
            access_token: value_string("access"),
            ..Default::default()
        }
        .validate(&mut diags, AttributePath::default());
        assert_eq!(diags.errors.len(), 1);
    }

    #[test]
    fn every_resource_is_registered() {
        let provider = VraProvider::default();
        let mut diags = Diagnostics::default();

        let resources = provider.get_resources(&mut diags).unwrap();
        assert_eq!(resources.len(), 12);
        assert!(resources.contains_key("vra_cloud_account_nsxv"));
        let data_sources = provider.get_data_sources(&mut diags).unwrap();
        for name in ["vra_project", "vra_zone", "vra_network"] {
            assert!(data_sources.contains_key(name), "{name} is missing");
        }
    }
}
