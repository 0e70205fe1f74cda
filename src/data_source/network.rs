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

use serde::{Deserialize, Serialize};

use tf_provider::schema::{AttributeType, Block, Description};
use tf_provider::value::{Value, ValueBool, ValueString};
use tf_provider::map;
use tf_provider::schema::Schema;

use crate::client::models::Network;
use crate::resource::expand::{optional_string, self_link, value_string};
use crate::resource::NETWORKS_PATH;
use crate::utils::WithSchema;

use super::{computed_attribute, config_keys, key_attribute, LookupKind};

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkDataState<'a> {
    pub id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub description: ValueString<'a>,
    pub project_id: ValueString<'a>,
    pub cidr: ValueString<'a>,
    pub outbound_access: ValueBool,
    pub external_id: ValueString<'a>,
    pub external_zone_id: ValueString<'a>,
    pub self_link: ValueString<'a>,
}

impl<'a> WithSchema for NetworkDataState<'a> {
    fn schema() -> Schema {
        let computed = |description| computed_attribute(AttributeType::String, description);
        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "id" => key_attribute("Id of the network, conflicts with `name`"),
                    "name" => key_attribute("Name of the network, conflicts with `id`"),
                    "description" => computed("Description of the network"),
                    "project_id" => computed("Id of the project the network belongs to"),
                    "cidr" => computed("Address range of the network"),
                    "outbound_access" => computed_attribute(
                        AttributeType::Bool,
                        "Whether the network can reach the outside world",
                    ),
                    "external_id" => computed("Id of the network on the cloud provider"),
                    "external_zone_id" => computed("Id of the zone on the cloud provider"),
                    "self_link" => computed("Reference of the network"),
                },
                description: Description::plain("Look up a network by id or by name"),
                ..Default::default()
            },
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct NetworkLookup;

impl LookupKind for NetworkLookup {
    type State<'a> = NetworkDataState<'a>;
    type Object = Network;

    const PATH: &'static str = NETWORKS_PATH;
    const NAME: &'static str = "networks";

    fn keys<'s>(state: &'s NetworkDataState<'_>) -> (Option<&'s str>, Option<&'s str>) {
        config_keys(&state.id, &state.name)
    }

    fn flatten<'a>(network: Network) -> NetworkDataState<'a> {
        NetworkDataState {
            self_link: optional_string(self_link(&network.links)),
            id: value_string(network.id),
            name: optional_string(network.name),
            description: optional_string(network.description),
            project_id: optional_string(network.project_id),
            cidr: optional_string(network.cidr),
            outbound_access: network.outbound_access.map_or(Value::Null, Value::Value),
            external_id: optional_string(network.external_id),
            external_zone_id: optional_string(network.external_zone_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::data_source::lookup;
    use crate::resource::testing;

    #[tokio::test]
    async fn network_found_by_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/iaas/api/networks/n1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "n1",
                "name": "backend",
                "cidr": "10.1.0.0/24",
                "outboundAccess": true,
                "_links": {"self": {"href": "/iaas/api/networks/n1"}},
            })))
            .expect(1)
            .mount(&server)
            .await;

        let network: Network = lookup(
            &testing::client(&server),
            NetworkLookup::PATH,
            NetworkLookup::NAME,
            Some("n1"),
            None,
        )
        .await
        .unwrap();
        let state = NetworkLookup::flatten(network);

        assert_eq!(state.name, value_string("backend"));
        assert_eq!(state.cidr, value_string("10.1.0.0/24"));
        assert_eq!(state.outbound_access, Value::Value(true));
        assert_eq!(state.self_link, value_string("/iaas/api/networks/n1"));
        assert_eq!(state.project_id, Value::Null);
    }
}
