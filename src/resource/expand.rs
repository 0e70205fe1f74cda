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

//! Conversions between Terraform values and API models.
//!
//! `expand_*` turns a state value into what the API expects, `flatten_*` does
//! the opposite. Null and unknown values expand to empty collections.

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tf_provider::schema::{Attribute, AttributeConstraint, AttributeType, Block, Description, NestedBlock};
use tf_provider::value::{Value, ValueBool, ValueList, ValueMap, ValueNumber, ValueString};
use tf_provider::{map, AttributePath, Diagnostics};

use crate::client::models::{
    BootConfig, Constraint, DiskAttachmentSpecification, Links, NicSpecification, Tag,
};
use crate::error::VraError;
use crate::utils::DisplayJoinable;

pub const REGION_PREFIX: &str = "/iaas/api/regions/";

pub type ValueSet<T> = Value<BTreeSet<T>>;
pub type TagsState<'a> = ValueSet<Value<TagState<'a>>>;

pub fn value_string<'a>(value: impl Into<String>) -> ValueString<'a> {
    Value::Value(Cow::Owned(value.into()))
}

/// Empty and missing strings are both null for Terraform
pub fn optional_string<'a>(value: Option<String>) -> ValueString<'a> {
    match value {
        Some(value) if !value.is_empty() => Value::Value(Cow::Owned(value)),
        _ => Value::Null,
    }
}

pub fn expand_string(value: &ValueString<'_>) -> String {
    value.as_str().to_owned()
}

pub fn expand_optional(value: &ValueString<'_>) -> Option<String> {
    value
        .as_deref_option()
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
}

pub fn expand_bool(value: &ValueBool) -> Option<bool> {
    match value {
        Value::Value(value) => Some(*value),
        _ => None,
    }
}

pub fn expand_number(value: &ValueNumber) -> Option<i64> {
    match value {
        Value::Value(value) => Some(*value),
        _ => None,
    }
}

pub fn expand_string_list(list: &ValueList<ValueString<'_>>) -> Vec<String> {
    list.iter()
        .flatten()
        .filter_map(|value| value.as_deref_option())
        .map(str::to_owned)
        .collect()
}

pub fn flatten_string_list<'a>(list: &[String]) -> ValueList<ValueString<'a>> {
    Value::Value(list.iter().map(value_string).collect())
}

pub fn expand_string_set(set: &ValueSet<ValueString<'_>>) -> Vec<String> {
    set.iter()
        .flatten()
        .filter_map(|value| value.as_deref_option())
        .map(str::to_owned)
        .collect()
}

pub fn flatten_string_set<'a>(set: impl IntoIterator<Item = String>) -> ValueSet<ValueString<'a>> {
    Value::Value(set.into_iter().map(value_string).collect())
}

pub fn expand_custom_properties(map: &ValueMap<'_, ValueString<'_>>) -> BTreeMap<String, String> {
    map.iter()
        .flatten()
        .filter_map(|(key, value)| Some((key.to_string(), value.as_deref_option()?.to_owned())))
        .collect()
}

pub fn flatten_custom_properties<'a>(
    properties: &BTreeMap<String, String>,
) -> ValueMap<'a, ValueString<'a>> {
    Value::Value(
        properties
            .iter()
            .map(|(key, value)| (Cow::Owned(key.clone()), value_string(value.as_str())))
            .collect(),
    )
}

/// Reject lists holding the same value twice
pub fn check_unique(attribute: &'static str, values: &[String]) -> Result<(), VraError> {
    let mut seen = BTreeSet::new();
    let duplicates = values
        .iter()
        .filter(|value| !seen.insert(value.as_str()))
        .collect::<BTreeSet<_>>();

    if duplicates.is_empty() {
        Ok(())
    } else {
        Err(VraError::Validation {
            attribute,
            message: format!(
                "specified {attribute} are not unique: {}",
                duplicates.into_iter().join_with(", ")
            ),
        })
    }
}

/// Same as [`check_unique`], reported as a diagnostic during validation
pub fn validate_unique(
    diags: &mut Diagnostics,
    attr_path: AttributePath,
    attribute: &'static str,
    list: &ValueList<ValueString<'_>>,
) {
    if let Err(err) = check_unique(attribute, &expand_string_list(list)) {
        diags.error(
            format!("Invalid `{attribute}`"),
            err.to_string(),
            attr_path.attribute(attribute),
        );
    }
}

/// Id of an object from one of its references
pub fn strip_id(reference: &str, prefix: &str) -> String {
    reference
        .strip_prefix(prefix)
        .unwrap_or(reference)
        .to_owned()
}

/// Order the enabled regions of a cloud account like the user submitted them
///
/// The API returns `enabled` and the matching region `hrefs` in its own order.
/// When `enabled` holds exactly the `submitted` regions, both lists are
/// rearranged in `submitted` order; otherwise the server order is kept.
/// Returns the regions and the ids of the region objects.
pub fn normalize_regions(
    submitted: &[String],
    enabled: &[String],
    hrefs: &[String],
) -> Result<(Vec<String>, Vec<String>), VraError> {
    if enabled.len() != hrefs.len() {
        return Err(VraError::InvalidResponse(format!(
            "{} enabled regions but {} region links",
            enabled.len(),
            hrefs.len()
        )));
    }

    let hrefs = enabled
        .iter()
        .map(String::as_str)
        .zip(hrefs.iter().map(String::as_str))
        .collect::<HashMap<_, _>>();

    let same_regions = submitted.len() == enabled.len()
        && submitted.iter().all(|region| hrefs.contains_key(region.as_str()));
    let regions = (if same_regions { submitted } else { enabled }).to_vec();

    let region_ids = regions
        .iter()
        .filter_map(|region| hrefs.get(region.as_str()))
        .map(|href| strip_id(href, REGION_PREFIX))
        .collect();

    Ok((regions, region_ids))
}

/// Regions of a cloud account as state lists, see [`normalize_regions`]
///
/// An account created without regions keeps a null `regions`.
pub fn flatten_regions<'a>(
    submitted: &ValueList<ValueString<'_>>,
    enabled: &[String],
    links: &Links,
) -> Result<(ValueList<ValueString<'a>>, ValueList<ValueString<'a>>), VraError> {
    let hrefs = links
        .get("regions")
        .map(|link| link.hrefs.as_slice())
        .unwrap_or_default();
    let (regions, region_ids) = normalize_regions(&expand_string_list(submitted), enabled, hrefs)?;

    if regions.is_empty() && submitted.is_null() {
        return Ok((Value::Null, flatten_string_list(&region_ids)));
    }
    Ok((flatten_string_list(&regions), flatten_string_list(&region_ids)))
}

/// Reference of an object to itself
pub fn self_link(links: &Links) -> Option<String> {
    links.get("self").and_then(|link| link.href.clone())
}

/// Region id from the `region` link of an object
pub fn region_id_from_links(links: &Links) -> Option<String> {
    links
        .get("region")
        .and_then(|link| link.href.as_deref())
        .map(|href| strip_id(href, REGION_PREFIX))
}

#[derive(Debug, Default, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TagState<'a> {
    pub key: ValueString<'a>,
    pub value: ValueString<'a>,
}

pub fn tags_schema(description: &str) -> NestedBlock {
    NestedBlock::Set(Block {
        attributes: map! {
            "key" => Attribute {
                attr_type: AttributeType::String,
                description: Description::plain("Tag key"),
                constraint: AttributeConstraint::Required,
                ..Default::default()
            },
            "value" => Attribute {
                attr_type: AttributeType::String,
                description: Description::plain("Tag value"),
                constraint: AttributeConstraint::Required,
                ..Default::default()
            },
        },
        description: Description::plain(description),
        ..Default::default()
    })
}

pub fn expand_tags(tags: &TagsState<'_>) -> Vec<Tag> {
    tags.iter()
        .flatten()
        .filter_map(Value::as_ref_option)
        .map(|tag| Tag {
            key: expand_string(&tag.key),
            value: expand_string(&tag.value),
        })
        .collect()
}

pub fn flatten_tags<'a>(tags: &[Tag]) -> TagsState<'a> {
    Value::Value(
        tags.iter()
            .map(|tag| {
                Value::Value(TagState {
                    key: value_string(tag.key.as_str()),
                    value: value_string(tag.value.as_str()),
                })
            })
            .collect(),
    )
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintState<'a> {
    pub mandatory: ValueBool,
    pub expression: ValueString<'a>,
}

pub fn constraints_schema() -> NestedBlock {
    NestedBlock::List(Block {
        attributes: map! {
            "mandatory" => Attribute {
                attr_type: AttributeType::Bool,
                description: Description::plain("Whether the constraint must be satisfied"),
                constraint: AttributeConstraint::Required,
                ..Default::default()
            },
            "expression" => Attribute {
                attr_type: AttributeType::String,
                description: Description::plain("Constraint expression, like `environment:prod`"),
                constraint: AttributeConstraint::Required,
                ..Default::default()
            },
        },
        description: Description::plain("Placement constraints"),
        ..Default::default()
    })
}

pub fn expand_constraints(constraints: &ValueList<Value<ConstraintState<'_>>>) -> Vec<Constraint> {
    constraints
        .iter()
        .flatten()
        .filter_map(Value::as_ref_option)
        .map(|constraint| Constraint {
            mandatory: expand_bool(&constraint.mandatory).unwrap_or(false),
            expression: expand_string(&constraint.expression),
        })
        .collect()
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct NicState<'a> {
    pub name: ValueString<'a>,
    pub description: ValueString<'a>,
    pub network_id: ValueString<'a>,
    pub device_index: ValueNumber,
    pub addresses: ValueList<ValueString<'a>>,
    pub security_group_ids: ValueList<ValueString<'a>>,
    pub custom_properties: ValueMap<'a, ValueString<'a>>,
}

pub fn nics_schema() -> NestedBlock {
    NestedBlock::List(Block {
        attributes: map! {
            "name" => Attribute {
                attr_type: AttributeType::String,
                description: Description::plain("Name of the network interface"),
                constraint: AttributeConstraint::Optional,
                ..Default::default()
            },
            "description" => Attribute {
                attr_type: AttributeType::String,
                description: Description::plain("Description of the network interface"),
                constraint: AttributeConstraint::Optional,
                ..Default::default()
            },
            "network_id" => Attribute {
                attr_type: AttributeType::String,
                description: Description::plain("Id of the network the interface is attached to"),
                constraint: AttributeConstraint::Required,
                ..Default::default()
            },
            "device_index" => Attribute {
                attr_type: AttributeType::Number,
                description: Description::plain("Index of the interface on the machine"),
                constraint: AttributeConstraint::Optional,
                ..Default::default()
            },
            "addresses" => Attribute {
                attr_type: AttributeType::List(Box::new(AttributeType::String)),
                description: Description::plain("Static IP addresses of the interface"),
                constraint: AttributeConstraint::Optional,
                ..Default::default()
            },
            "security_group_ids" => Attribute {
                attr_type: AttributeType::List(Box::new(AttributeType::String)),
                description: Description::plain("Security groups applied to the interface"),
                constraint: AttributeConstraint::Optional,
                ..Default::default()
            },
            "custom_properties" => Attribute {
                attr_type: AttributeType::Map(Box::new(AttributeType::String)),
                description: Description::plain("Additional properties of the interface"),
                constraint: AttributeConstraint::Optional,
                ..Default::default()
            },
        },
        description: Description::plain("Network interfaces"),
        ..Default::default()
    })
}

pub fn expand_nics(nics: &ValueList<Value<NicState<'_>>>) -> Vec<NicSpecification> {
    nics.iter()
        .flatten()
        .filter_map(Value::as_ref_option)
        .map(|nic| NicSpecification {
            name: expand_optional(&nic.name),
            description: expand_optional(&nic.description),
            network_id: expand_string(&nic.network_id),
            device_index: expand_number(&nic.device_index),
            addresses: expand_string_list(&nic.addresses),
            security_group_ids: expand_string_list(&nic.security_group_ids),
            custom_properties: expand_custom_properties(&nic.custom_properties),
        })
        .collect()
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiskState<'a> {
    pub block_device_id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub description: ValueString<'a>,
}

pub fn disks_schema() -> NestedBlock {
    NestedBlock::List(Block {
        attributes: map! {
            "block_device_id" => Attribute {
                attr_type: AttributeType::String,
                description: Description::plain("Id of the block device to attach"),
                constraint: AttributeConstraint::Required,
                ..Default::default()
            },
            "name" => Attribute {
                attr_type: AttributeType::String,
                description: Description::plain("Name of the attachment"),
                constraint: AttributeConstraint::Optional,
                ..Default::default()
            },
            "description" => Attribute {
                attr_type: AttributeType::String,
                description: Description::plain("Description of the attachment"),
                constraint: AttributeConstraint::Optional,
                ..Default::default()
            },
        },
        description: Description::plain("Block devices attached to the machine"),
        ..Default::default()
    })
}

pub fn expand_disks(disks: &ValueList<Value<DiskState<'_>>>) -> Vec<DiskAttachmentSpecification> {
    disks
        .iter()
        .flatten()
        .filter_map(Value::as_ref_option)
        .map(|disk| DiskAttachmentSpecification {
            block_device_id: expand_string(&disk.block_device_id),
            name: expand_optional(&disk.name),
            description: expand_optional(&disk.description),
        })
        .collect()
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct BootConfigState<'a> {
    pub content: ValueString<'a>,
}

pub fn boot_config_schema() -> NestedBlock {
    NestedBlock::List(Block {
        attributes: map! {
            "content" => Attribute {
                attr_type: AttributeType::String,
                description: Description::plain("cloud-init or cloudbase-init document"),
                constraint: AttributeConstraint::Optional,
                ..Default::default()
            },
        },
        description: Description::plain("Machine boot configuration, at most one block"),
        ..Default::default()
    })
}

pub fn expand_boot_config(boot_config: &ValueList<Value<BootConfigState<'_>>>) -> Option<BootConfig> {
    boot_config
        .iter()
        .flatten()
        .filter_map(Value::as_ref_option)
        .map(|boot_config| BootConfig {
            content: expand_optional(&boot_config.content),
        })
        .next()
}
