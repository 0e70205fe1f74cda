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

//! Request and response payloads of the vRA IaaS API.
//!
//! Specifications are what the provider sends, the other structures are what
//! the server answers. Every response field is defaulted: the API omits
//! empty values.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub key: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Href {
    pub href: Option<String>,
    pub hrefs: Vec<String>,
}

pub type Links = BTreeMap<String, Href>;

/// Server side record of an asynchronous operation
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RequestTracker {
    pub id: String,
    pub name: Option<String>,
    pub status: String,
    pub message: Option<String>,
    pub progress: Option<i64>,
    pub resources: Vec<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub content: Vec<T>,
    #[serde(default)]
    pub total_elements: i64,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
    pub mandatory: bool,
    pub expression: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NicSpecification {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub network_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_index: Option<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub addresses: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub security_group_ids: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_properties: BTreeMap<String, String>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiskAttachmentSpecification {
    pub block_device_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct BootConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineSpecification {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub image: String,
    pub flavor: String,
    pub project_id: String,
    pub machine_count: i64,
    pub constraints: Vec<Constraint>,
    pub tags: Vec<Tag>,
    pub custom_properties: BTreeMap<String, String>,
    pub nics: Vec<NicSpecification>,
    pub disks: Vec<DiskAttachmentSpecification>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boot_config: Option<BootConfig>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Machine {
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub power_state: Option<String>,
    pub address: Option<String>,
    pub external_zone_id: Option<String>,
    pub external_region_id: Option<String>,
    pub external_id: Option<String>,
    pub project_id: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub owner: Option<String>,
    pub org_id: Option<String>,
    pub custom_properties: BTreeMap<String, String>,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudAccountAwsSpecification {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub region_ids: Vec<String>,
    pub create_default_zones: bool,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudAccountAzureSpecification {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub subscription_id: String,
    pub tenant_id: String,
    pub client_application_id: String,
    pub client_application_secret_key: String,
    pub region_ids: Vec<String>,
    pub create_default_zones: bool,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudAccountGcpSpecification {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub client_email: String,
    pub private_key_id: String,
    pub private_key: String,
    pub project_id: String,
    pub region_ids: Vec<String>,
    pub create_default_zones: bool,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudAccountNsxVSpecification {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub host_name: String,
    pub dcid: String,
    pub username: String,
    pub password: String,
    pub accept_self_signed_certificate: bool,
    pub tags: Vec<Tag>,
}

/// Update body shared by the cloud accounts bound to regions (AWS, Azure, GCP)
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRegionalCloudAccountSpecification {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub region_ids: Vec<String>,
    pub create_default_zones: bool,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCloudAccountSpecification {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub tags: Vec<Tag>,
}

/// Cloud account as returned by any of the `cloud-accounts-*` endpoints
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CloudAccount {
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub enabled_region_ids: Vec<String>,
    pub access_key_id: Option<String>,
    pub subscription_id: Option<String>,
    pub tenant_id: Option<String>,
    pub client_application_id: Option<String>,
    pub client_email: Option<String>,
    pub private_key_id: Option<String>,
    pub project_id: Option<String>,
    pub host_name: Option<String>,
    pub dcid: Option<String>,
    pub username: Option<String>,
    pub accept_self_signed_certificate: Option<bool>,
    pub tags: Vec<Tag>,
    #[serde(rename = "_links")]
    pub links: Links,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSpecification {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub project_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outbound_access: Option<bool>,
    pub constraints: Vec<Constraint>,
    pub tags: Vec<Tag>,
    pub custom_properties: BTreeMap<String, String>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Network {
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub cidr: Option<String>,
    pub project_id: Option<String>,
    pub outbound_access: Option<bool>,
    pub external_id: Option<String>,
    pub external_zone_id: Option<String>,
    pub updated_at: Option<String>,
    pub owner: Option<String>,
    pub org_id: Option<String>,
    pub custom_properties: BTreeMap<String, String>,
    pub tags: Vec<Tag>,
    #[serde(rename = "_links")]
    pub links: Links,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct User {
    pub email: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ZoneAssignment {
    pub zone_id: String,
    pub priority: i64,
    pub max_number_instances: i64,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSpecification {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub zone_assignment_configurations: Vec<ZoneAssignment>,
    pub administrators: Vec<User>,
    pub members: Vec<User>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub zones: Vec<ZoneAssignment>,
    pub administrators: Vec<User>,
    pub members: Vec<User>,
    pub org_id: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneSpecification {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub region_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placement_policy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
    pub tags: Vec<Tag>,
    pub tags_to_match: Vec<Tag>,
    pub custom_properties: BTreeMap<String, String>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Zone {
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub placement_policy: Option<String>,
    pub folder: Option<String>,
    pub external_region_id: Option<String>,
    pub cloud_account_id: Option<String>,
    pub tags: Vec<Tag>,
    pub tags_to_match: Vec<Tag>,
    pub custom_properties: BTreeMap<String, String>,
    #[serde(rename = "_links")]
    pub links: Links,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Route {
    pub protocol: String,
    pub port: String,
    pub member_protocol: String,
    pub member_port: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancerSpecification {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub project_id: String,
    pub nics: Vec<NicSpecification>,
    pub routes: Vec<Route>,
    pub target_links: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internet_facing: Option<bool>,
    pub tags: Vec<Tag>,
    pub custom_properties: BTreeMap<String, String>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoadBalancer {
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub project_id: Option<String>,
    pub external_id: Option<String>,
    pub external_zone_id: Option<String>,
    pub external_region_id: Option<String>,
    pub routes: Vec<Route>,
    pub custom_properties: BTreeMap<String, String>,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageProfileSpecification {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub region_id: String,
    pub default_item: bool,
    pub disk_properties: BTreeMap<String, String>,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StorageProfile {
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub default_item: bool,
    pub external_region_id: Option<String>,
    pub disk_properties: BTreeMap<String, String>,
    pub tags: Vec<Tag>,
    #[serde(rename = "_links")]
    pub links: Links,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FlavorMapping {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_count: Option<i64>,
    #[serde(rename = "memoryInMB", skip_serializing_if = "Option::is_none")]
    pub memory_in_mb: Option<i64>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlavorProfileSpecification {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub region_id: String,
    pub flavor_mapping: BTreeMap<String, FlavorMapping>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Mappings<T> {
    pub mapping: BTreeMap<String, T>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FlavorProfile {
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub external_region_id: Option<String>,
    pub flavor_mappings: Mappings<FlavorMapping>,
    #[serde(rename = "_links")]
    pub links: Links,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImageMapping {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloud_config: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageProfileSpecification {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub region_id: String,
    pub image_mapping: BTreeMap<String, ImageMapping>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImageProfile {
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub external_region_id: Option<String>,
    pub image_mappings: Mappings<ImageMapping>,
    #[serde(rename = "_links")]
    pub links: Links,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(super) struct ErrorBody {
    pub message: Option<String>,
    pub status_code: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct LoginRequest<'a> {
    pub refresh_token: &'a str,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(super) struct LoginResponse {
    pub token_type: Option<String>,
    pub token: String,
}
