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

use std::borrow::Cow;
use std::fmt::Debug;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use tf_provider::value::{Value, ValueEmpty, ValueString};
use tf_provider::{schema::Schema, AttributePath, Diagnostics, Resource};

use crate::client::ApiClient;
use crate::error::VraError;
use crate::utils::{WithId, WithNormalize, WithSchema, WithValidate};

pub mod expand;

mod cloud_account_aws;
mod cloud_account_azure;
mod cloud_account_gcp;
mod cloud_account_nsxv;
mod flavor_profile;
mod image_profile;
mod load_balancer;
mod machine;
mod network;
mod project;
mod storage_profile;
mod zone;

pub use cloud_account_aws::CloudAccountAwsResource;
pub use cloud_account_azure::CloudAccountAzureResource;
pub use cloud_account_gcp::CloudAccountGcpResource;
pub use cloud_account_nsxv::CloudAccountNsxvResource;
pub use flavor_profile::FlavorProfileResource;
pub use image_profile::ImageProfileResource;
pub use load_balancer::LoadBalancerResource;
pub use machine::MachineResource;
pub use network::NetworkResource;
pub use project::ProjectResource;
pub use storage_profile::StorageProfileResource;
pub use zone::ZoneResource;

pub(crate) use network::NETWORKS_PATH;
pub(crate) use project::{flatten_users, users_attribute, PROJECTS_PATH};
pub(crate) use zone::ZONES_PATH;

/// Client shared by all resources, set once the provider is configured
pub type ClientHandle = Arc<OnceLock<ApiClient>>;

/// Lifecycle of one kind of vRA object
///
/// `create` and `update` end with a `read` so the state reflects the server.
/// `read` clears the id when the object does not exist anymore.
#[async_trait]
pub trait ResourceKind: Debug + Send + Sync + 'static {
    type State<'a>: WithSchema
        + WithNormalize
        + WithValidate
        + WithId<'a>
        + Debug
        + Default
        + Clone
        + PartialEq
        + Send
        + Sync
        + Serialize
        + DeserializeOwned;

    /// Name of the object kind in messages
    const NAME: &'static str;

    /// Attributes changed between `prior` and `planned` that the API cannot
    /// update in place, the object is replaced when any is returned
    fn replaced_attributes<'a>(
        &self,
        _prior: &Self::State<'a>,
        _planned: &Self::State<'a>,
    ) -> Vec<&'static str> {
        Vec::new()
    }

    async fn create<'a>(
        &self,
        client: &ApiClient,
        state: &mut Self::State<'a>,
    ) -> Result<(), VraError>;
    async fn read<'a>(
        &self,
        client: &ApiClient,
        state: &mut Self::State<'a>,
    ) -> Result<(), VraError>;
    async fn update<'a>(
        &self,
        client: &ApiClient,
        state: &mut Self::State<'a>,
    ) -> Result<(), VraError>;
    async fn delete<'a>(
        &self,
        client: &ApiClient,
        state: &mut Self::State<'a>,
    ) -> Result<(), VraError>;
}

#[derive(Debug)]
pub struct VraResource<K: ResourceKind> {
    client: ClientHandle,
    kind: K,
}

impl<K: ResourceKind> VraResource<K> {
    pub fn new(client: ClientHandle, kind: K) -> Self {
        Self { client, kind }
    }

    fn client(&self, diags: &mut Diagnostics) -> Option<&ApiClient> {
        let client = self.client.get();
        if client.is_none() {
            diags.root_error(
                format!("Cannot manage {} before the provider is configured", K::NAME),
                VraError::NotConfigured.to_string(),
            );
        }
        client
    }
}

#[async_trait]
impl<K: ResourceKind> Resource for VraResource<K> {
    /// Null when the object does not exist anymore
    type State<'a> = Value<K::State<'a>>;
    type PrivateState<'a> = ValueEmpty;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(<K::State<'static> as WithSchema>::schema())
    }

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::State<'a>) -> Option<()> {
        if let Value::Value(config) = &config {
            config.validate(diags, Default::default());
        }

        if diags.errors.is_empty() {
            Some(())
        } else {
            None
        }
    }

    async fn read<'a>(
        &self,
        diags: &mut Diagnostics,
        state: Self::State<'a>,
        private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let mut state = match state {
            Value::Value(state) => state,
            state => return Some((state, private_state)),
        };
        let client = self.client(diags)?;

        if let Err(err) = self.kind.read(client, &mut state).await {
            report(diags, "read", K::NAME, err);
            return None;
        }

        if state.id().is_null() {
            tracing::info!("{} is gone, removing it from the state", K::NAME);
            return Some((Value::Null, private_state));
        }
        Some((Value::Value(state), private_state))
    }

    async fn plan_create<'a>(
        &self,
        diags: &mut Diagnostics,
        proposed_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let mut state = proposed_state;
        if let Value::Value(state) = &mut state {
            *state.id_mut() = Value::Unknown;
            state.unknown_computed();
            state.normalize(diags);
        }

        Some((state, Default::default()))
    }

    async fn plan_update<'a>(
        &self,
        diags: &mut Diagnostics,
        prior_state: Self::State<'a>,
        proposed_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        prior_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(
        Self::State<'a>,
        Self::PrivateState<'a>,
        Vec<tf_provider::AttributePath>,
    )> {
        let mut state = proposed_state;
        let mut replace = Vec::new();
        if let Value::Value(state) = &mut state {
            state.normalize(diags);
            if let Value::Value(prior) = &prior_state {
                replace = self.kind.replaced_attributes(prior, state);
            }
            if !replace.is_empty() {
                tracing::info!("{} will be replaced, {:?} changed", K::NAME, replace);
            }
            // Computed values may all change once the update is applied
            if Value::Value(state.clone()) != prior_state {
                state.unknown_computed();
            }
        }

        Some((
            state,
            prior_private_state,
            replace.into_iter().map(AttributePath::new).collect(),
        ))
    }

    async fn plan_destroy<'a>(
        &self,
        _diags: &mut Diagnostics,
        _prior_state: Self::State<'a>,
        prior_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<Self::PrivateState<'a>> {
        Some(prior_private_state)
    }

    async fn create<'a>(
        &self,
        diags: &mut Diagnostics,
        planned_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let Value::Value(mut state) = planned_state else {
            diags.root_error(
                format!("Failed to apply {}", K::NAME),
                "the planned state is not known",
            );
            return None;
        };
        let client = self.client(diags)?;

        if let Err(err) = self.kind.create(client, &mut state).await {
            report(diags, "create", K::NAME, err);
            return None;
        }

        if state.id().is_null() {
            diags.root_error(
                format!("Failed to create {}", K::NAME),
                "the object disappeared right after its creation",
            );
            return None;
        }
        Some((Value::Value(state), private_state))
    }

    async fn update<'a>(
        &self,
        diags: &mut Diagnostics,
        _prior_state: Self::State<'a>,
        planned_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let Value::Value(mut state) = planned_state else {
            diags.root_error(
                format!("Failed to apply {}", K::NAME),
                "the planned state is not known",
            );
            return None;
        };
        let client = self.client(diags)?;

        if let Err(err) = self.kind.update(client, &mut state).await {
            report(diags, "update", K::NAME, err);
            return None;
        }

        Some((Value::Value(state), private_state))
    }

    async fn destroy<'a>(
        &self,
        diags: &mut Diagnostics,
        state: Self::State<'a>,
        _planned_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<()> {
        let Value::Value(mut state) = state else {
            return Some(());
        };
        let client = self.client(diags)?;

        match self.kind.delete(client, &mut state).await {
            Ok(()) => Some(()),
            Err(err) => {
                report(diags, "delete", K::NAME, err);
                None
            }
        }
    }

    async fn import<'a>(
        &self,
        diags: &mut Diagnostics,
        id: String,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        if id.is_empty() {
            diags.root_error(
                format!("Failed to import {}", K::NAME),
                "the import id is empty",
            );
            return None;
        }

        // The framework reads the object right after the import
        let mut state: K::State<'a> = Default::default();
        *state.id_mut() = Value::Value(Cow::Owned(id));
        Some((Value::Value(state), Default::default()))
    }
}

fn report(diags: &mut Diagnostics, operation: &str, kind: &str, err: VraError) {
    tracing::warn!("failed to {operation} {kind}: {err}");
    match err {
        VraError::Validation { attribute, message } => {
            diags.error(
                format!("Invalid `{attribute}`"),
                message,
                AttributePath::new(attribute),
            );
        }
        err => diags.root_error(format!("Failed to {operation} {kind}"), err.to_string()),
    }
}

/// Names of the attributes flagged as changed
pub(crate) fn changed(
    attributes: impl IntoIterator<Item = (&'static str, bool)>,
) -> Vec<&'static str> {
    attributes
        .into_iter()
        .filter_map(|(name, changed)| changed.then_some(name))
        .collect()
}

/// Fetch `{path}/{id}`, `None` when the server does not know the object
pub(crate) async fn fetch<T: DeserializeOwned>(
    client: &ApiClient,
    path: &str,
    id: &ValueString<'_>,
) -> Result<Option<T>, VraError> {
    let Some(id) = id.as_deref_option() else {
        return Ok(None);
    };
    match client.get(&format!("{path}/{id}")).await {
        Ok(object) => Ok(Some(object)),
        Err(err) if err.is_not_found() => {
            tracing::debug!("{path}/{id} not found");
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}

/// Delete `{path}/{id}`, an object already gone counts as deleted
pub(crate) async fn remove(
    client: &ApiClient,
    path: &str,
    id: &ValueString<'_>,
) -> Result<(), VraError> {
    let Some(id) = id.as_deref_option() else {
        return Ok(());
    };
    match client.delete(&format!("{path}/{id}")).await {
        Err(err) if !err.is_not_found() => Err(err.into()),
        _ => Ok(()),
    }
}

/// Id assigned by the server to a newly created object
pub(crate) fn created_id<'a>(kind: &str, id: String) -> Result<ValueString<'a>, VraError> {
    if id.is_empty() {
        Err(VraError::InvalidResponse(format!(
            "the created {kind} has no id"
        )))
    } else {
        Ok(Value::Value(Cow::Owned(id)))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use wiremock::MockServer;

    use crate::client::ApiClient;

    pub(crate) fn client(server: &MockServer) -> ApiClient {
        ApiClient::with_token(&server.uri(), "token", false).unwrap()
    }
}
