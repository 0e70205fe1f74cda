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

use tf_provider::schema::{AttributeConstraint, AttributeType, Block, Description};
use tf_provider::value::{ValueList, ValueString};
use tf_provider::map;
use tf_provider::schema::Schema;

use crate::client::models::Project;
use crate::resource::expand::{flatten_string_list, optional_string, value_string, ValueSet};
use crate::resource::{flatten_users, users_attribute, PROJECTS_PATH};
use crate::utils::WithSchema;

use super::{computed_attribute, config_keys, key_attribute, LookupKind};

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectDataState<'a> {
    pub id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub description: ValueString<'a>,
    pub administrators: ValueSet<ValueString<'a>>,
    pub members: ValueSet<ValueString<'a>>,
    pub zone_ids: ValueList<ValueString<'a>>,
}

impl<'a> WithSchema for ProjectDataState<'a> {
    fn schema() -> Schema {
        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "id" => key_attribute("Id of the project, conflicts with `name`"),
                    "name" => key_attribute("Name of the project, conflicts with `id`"),
                    "description" => computed_attribute(AttributeType::String, "Description of the project"),
                    "administrators" => users_attribute(
                        "Emails of the project administrators",
                        AttributeConstraint::Computed,
                    ),
                    "members" => users_attribute(
                        "Emails of the project members",
                        AttributeConstraint::Computed,
                    ),
                    "zone_ids" => computed_attribute(
                        AttributeType::List(Box::new(AttributeType::String)),
                        "Ids of the zones assigned to the project",
                    ),
                },
                description: Description::plain("Look up a project by id or by name"),
                ..Default::default()
            },
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct ProjectLookup;

impl LookupKind for ProjectLookup {
    type State<'a> = ProjectDataState<'a>;
    type Object = Project;

    const PATH: &'static str = PROJECTS_PATH;
    const NAME: &'static str = "projects";

    fn keys<'s>(state: &'s ProjectDataState<'_>) -> (Option<&'s str>, Option<&'s str>) {
        config_keys(&state.id, &state.name)
    }

    fn flatten<'a>(project: Project) -> ProjectDataState<'a> {
        let zone_ids = project
            .zones
            .into_iter()
            .map(|zone| zone.zone_id)
            .collect::<Vec<_>>();
        ProjectDataState {
            id: value_string(project.id),
            name: optional_string(project.name),
            description: optional_string(project.description),
            administrators: flatten_users(&project.administrators),
            members: flatten_users(&project.members),
            zone_ids: flatten_string_list(&zone_ids),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tf_provider::value::Value;

    use super::*;

    #[test]
    fn project_is_flattened() {
        let project: Project = serde_json::from_value(json!({
            "id": "p1",
            "name": "web",
            "administrators": [{"email": "admin@example.com"}],
            "zones": [{"zoneId": "z1"}, {"zoneId": "z2"}],
        }))
        .unwrap();

        let state = ProjectLookup::flatten(project);
        assert_eq!(state.id, value_string("p1"));
        assert_eq!(state.description, Value::Null);
        assert_eq!(
            state.zone_ids,
            flatten_string_list(&[String::from("z1"), String::from("z2")])
        );
        assert_eq!(
            state.administrators,
            Value::Value([value_string("admin@example.com")].into_iter().collect())
        );
        assert_eq!(ProjectLookup::keys(&state), (Some("p1"), Some("web")));
    }
}
