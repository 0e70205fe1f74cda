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

use std::time::Duration;

use thiserror::Error;

use crate::client::ApiError;

/// Failure of a resource lifecycle operation
#[derive(Debug, Error)]
pub enum VraError {
    /// Rejected locally, before any call to the API
    #[error("{message}")]
    Validation {
        attribute: &'static str,
        message: String,
    },

    #[error(transparent)]
    Api(#[from] ApiError),

    /// The request tracker reported a failure
    #[error("{0}")]
    RequestFailed(String),

    #[error("request {id} did not complete within {timeout:?}")]
    Timeout { id: String, timeout: Duration },

    #[error("request tracker returned an unknown status: {0}")]
    UnknownStatus(String),

    #[error("{0} update not implemented")]
    NotImplemented(&'static str),

    #[error("total number of {kind} created was not 1 (found {count})")]
    UnexpectedCount { kind: &'static str, count: usize },

    #[error("found {count} {kind} matching {filter}, expected exactly one")]
    AmbiguousLookup {
        kind: &'static str,
        filter: String,
        count: usize,
    },

    #[error("invalid response from the API: {0}")]
    InvalidResponse(String),

    #[error("the provider has not been configured")]
    NotConfigured,
}
