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
use tf_provider::value::ValueString;
use tf_provider::map;
use tf_provider::schema::Schema;

use crate::client::models::Zone;
use crate::resource::expand::{optional_string, region_id_from_links, value_string};
use crate::resource::ZONES_PATH;
use crate::utils::WithSchema;

use super::{computed_attribute, config_keys, key_attribute, LookupKind};

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneDataState<'a> {
    pub id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub description: ValueString<'a>,
    pub region_id: ValueString<'a>,
    pub placement_policy: ValueString<'a>,
    pub folder: ValueString<'a>,
    pub cloud_account_id: ValueString<'a>,
    pub external_region_id: ValueString<'a>,
}

impl<'a> WithSchema for ZoneDataState<'a> {
    fn schema() -> Schema {
        let computed = |description| computed_attribute(AttributeType::String, description);
        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "id" => key_attribute("Id of the zone, conflicts with `name`"),
                    "name" => key_attribute("Name of the zone, conflicts with `id`"),
                    "description" => computed("Description of the zone"),
                    "region_id" => computed("Id of the region the zone belongs to"),
                    "placement_policy" => computed("Placement policy of the zone"),
                    "folder" => computed("Folder of the machines placed in the zone"),
                    "cloud_account_id" => computed("Id of the cloud account of the zone"),
                    "external_region_id" => computed("Id of the region on the cloud provider"),
                },
                description: Description::plain("Look up a zone by id or by name"),
                ..Default::default()
            },
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct ZoneLookup;

impl LookupKind for ZoneLookup {
    type State<'a> = ZoneDataState<'a>;
    type Object = Zone;

    const PATH: &'static str = ZONES_PATH;
    const NAME: &'static str = "zones";

    fn keys<'s>(state: &'s ZoneDataState<'_>) -> (Option<&'s str>, Option<&'s str>) {
        config_keys(&state.id, &state.name)
    }

    fn flatten<'a>(zone: Zone) -> ZoneDataState<'a> {
        ZoneDataState {
            region_id: optional_string(region_id_from_links(&zone.links)),
            id: value_string(zone.id),
            name: optional_string(zone.name),
            description: optional_string(zone.description),
            placement_policy: optional_string(zone.placement_policy),
            folder: optional_string(zone.folder),
            cloud_account_id: optional_string(zone.cloud_account_id),
            external_region_id: optional_string(zone.external_region_id),
        }
    }
}
