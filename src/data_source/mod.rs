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

use std::fmt::Debug;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use tf_provider::schema::{Attribute, AttributeConstraint, AttributeType, Description};
use tf_provider::value::{ValueEmpty, ValueString};
use tf_provider::schema::Schema;
use tf_provider::{AttributePath, DataSource, Diagnostics};

use crate::client::ApiClient;
use crate::error::VraError;
use crate::resource::ClientHandle;
use crate::utils::WithSchema;

mod network;
mod project;
mod zone;

pub use network::NetworkLookup;
pub use project::ProjectLookup;
pub use zone::ZoneLookup;

/// Kind of vRA object that can be looked up by id or by name
pub trait LookupKind: Debug + Default + Send + Sync + 'static {
    type State<'a>: WithSchema
        + Debug
        + Default
        + Clone
        + PartialEq
        + Send
        + Sync
        + Serialize
        + DeserializeOwned;
    type Object: DeserializeOwned + Send;

    /// Collection holding the objects
    const PATH: &'static str;
    /// Name of the objects in messages, plural
    const NAME: &'static str;

    /// `id` and `name` given in the configuration
    fn keys<'s>(state: &'s Self::State<'_>) -> (Option<&'s str>, Option<&'s str>);
    fn flatten<'a>(object: Self::Object) -> Self::State<'a>;
}

/// Optional+computed `id` and `name` attributes of a lookup
pub(crate) fn key_attribute(description: &str) -> Attribute {
    Attribute {
        attr_type: AttributeType::String,
        description: Description::plain(description),
        constraint: AttributeConstraint::OptionalComputed,
        ..Default::default()
    }
}

pub(crate) fn computed_attribute(attr_type: AttributeType, description: &str) -> Attribute {
    Attribute {
        attr_type,
        description: Description::plain(description),
        constraint: AttributeConstraint::Computed,
        ..Default::default()
    }
}

fn validate_keys(diags: &mut Diagnostics, keys: (Option<&str>, Option<&str>)) {
    match keys {
        (None, None) => {
            diags.error_short("One of `id` or `name` must be set", AttributePath::default());
        }
        (Some(_), Some(_)) => {
            diags.error_short(
                "`id` and `name` cannot be set together",
                AttributePath::new("name"),
            );
        }
        _ => (),
    }
}

/// Find an object of `path` by id, or by its exact name
pub async fn lookup<T: DeserializeOwned>(
    client: &ApiClient,
    path: &str,
    kind: &'static str,
    id: Option<&str>,
    name: Option<&str>,
) -> Result<T, VraError> {
    if let Some(id) = id {
        return Ok(client.get(&format!("{path}/{id}")).await?);
    }

    let filter = format!("name eq '{}'", name.unwrap_or_default().replace('\'', "''"));
    let mut page = client.list::<T>(path, &filter).await?;
    match page.content.pop() {
        Some(object) if page.content.is_empty() => Ok(object),
        object => Err(VraError::AmbiguousLookup {
            kind,
            filter,
            count: page.content.len() + usize::from(object.is_some()),
        }),
    }
}

#[derive(Debug, Default)]
pub struct VraDataSource<K: LookupKind> {
    client: ClientHandle,
    kind: K,
}

impl<K: LookupKind> VraDataSource<K> {
    pub fn new(client: ClientHandle) -> Self {
        Self {
            client,
            kind: K::default(),
        }
    }
}

#[async_trait]
impl<K: LookupKind> DataSource for VraDataSource<K> {
    type State<'a> = K::State<'a>;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(<K::State<'static> as WithSchema>::schema())
    }

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::State<'a>) -> Option<()> {
        validate_keys(diags, K::keys(&config));

        if diags.errors.is_empty() {
            Some(())
        } else {
            None
        }
    }

    async fn read<'a>(
        &self,
        diags: &mut Diagnostics,
        config: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<Self::State<'a>> {
        let Some(client) = self.client.get() else {
            diags.root_error(
                format!("Cannot read {} before the provider is configured", K::NAME),
                VraError::NotConfigured.to_string(),
            );
            return None;
        };
        tracing::debug!("looking up {:?}", self.kind);

        let (id, name) = K::keys(&config);
        match lookup::<K::Object>(client, K::PATH, K::NAME, id, name).await {
            Ok(object) => Some(K::flatten(object)),
            Err(err) => {
                tracing::warn!("failed to look up {}: {err}", K::NAME);
                diags.root_error(format!("Failed to read {}", K::NAME), err.to_string());
                None
            }
        }
    }
}

/// Helper for [`LookupKind::keys`]
pub(crate) fn config_keys<'s>(
    id: &'s ValueString<'_>,
    name: &'s ValueString<'_>,
) -> (Option<&'s str>, Option<&'s str>) {
    (id.as_deref_option(), name.as_deref_option())
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::client::models::Project;
    use crate::resource::{testing, PROJECTS_PATH};

    #[tokio::test]
    async fn lookup_by_name_uses_a_filter() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(PROJECTS_PATH))
            .and(query_param("$filter", "name eq 'o''brien'"))
            .and(query_param("apiVersion", "2019-01-15"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [{"id": "p1", "name": "o'brien", "zones": [{"zoneId": "z1"}]}],
                "totalElements": 1,
            })))
            .expect(1)
            .mount(&server)
            .await;

        let project: Project = lookup(
            &testing::client(&server),
            PROJECTS_PATH,
            "projects",
            None,
            Some("o'brien"),
        )
        .await
        .unwrap();
        assert_eq!(project.id, "p1");
        assert_eq!(project.zones[0].zone_id, "z1");
    }

    #[tokio::test]
    async fn lookup_by_name_needs_a_single_match() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(PROJECTS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [],
                "totalElements": 0,
            })))
            .mount(&server)
            .await;

        let err = lookup::<Project>(
            &testing::client(&server),
            PROJECTS_PATH,
            "projects",
            None,
            Some("web"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, VraError::AmbiguousLookup { count: 0, .. }));
    }

    #[tokio::test]
    async fn page_without_content_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(PROJECTS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let page = testing::client(&server)
            .list::<Project>(PROJECTS_PATH, "name eq 'web'")
            .await
            .unwrap();
        assert!(page.content.is_empty());
        assert_eq!(page.total_elements, 0);
    }

    #[tokio::test]
    async fn lookup_by_id_reports_missing_objects() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/iaas/api/projects/p404"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "no such project"})))
            .mount(&server)
            .await;

        let err = lookup::<Project>(
            &testing::client(&server),
            PROJECTS_PATH,
            "projects",
            Some("p404"),
            None,
        )
        .await
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "/iaas/api/projects/p404 not found: no such project"
        );
    }

    #[test]
    fn exactly_one_key_is_required() {
        let mut diags = Diagnostics::default();
        validate_keys(&mut diags, (Some("p1"), Some("web")));
        assert_eq!(diags.errors.len(), 1);

        let mut diags = Diagnostics::default();
        validate_keys(&mut diags, (None, None));
        assert_eq!(diags.errors.len(), 1);

        let mut diags = Diagnostics::default();
        validate_keys(&mut diags, (None, Some("web")));
        assert!(diags.errors.is_empty());
    }
}
