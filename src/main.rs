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

use anyhow::anyhow;
use tracing_subscriber::EnvFilter;

use crate::vra_provider::VraProvider;

mod client;
mod data_source;
mod error;
mod resource;
mod tracker;
mod utils;
mod vra_provider;

/// Variable holding the log filter, like `debug` or `terraform_provider_vra=trace`
const LOG_ENV: &str = "TF_PROVIDER_VRA_LOG";

fn init_logging() {
    // stdout is reserved for the plugin handshake
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    tf_provider::serve("vra", VraProvider::default())
        .await
        .map_err(|err| anyhow!("{err}"))
}
