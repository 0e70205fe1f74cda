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

use reqwest::{Client, Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use url::Url;

mod error;
pub mod models;

pub use error::ApiError;

use models::{ErrorBody, LoginRequest, LoginResponse, Page, RequestTracker};

/// Version of the IaaS API the payloads are written against
pub const API_VERSION: &str = "2019-01-15";

pub const LOGIN_PATH: &str = "/iaas/api/login";
pub const REQUEST_TRACKER_PATH: &str = "/iaas/api/request-tracker";

#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    AccessToken(String),
    RefreshToken(String),
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::AccessToken(_) => f.write_str("AccessToken(***)"),
            Credentials::RefreshToken(_) => f.write_str("RefreshToken(***)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub url: String,
    pub credentials: Credentials,
    pub insecure: bool,
}

/// Authenticated handle on the vRA API
///
/// Built once when the provider is configured, then shared read-only by every
/// resource.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
    token: String,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Build a client, exchanging the refresh token for an access token if needed
    pub async fn connect(config: &ClientConfig) -> Result<Self, ApiError> {
        match &config.credentials {
            Credentials::AccessToken(token) => Self::with_token(&config.url, token, config.insecure),
            Credentials::RefreshToken(refresh_token) => {
                let mut client = Self::with_token(&config.url, "", config.insecure)?;
                client.token = client.login(refresh_token).await?;
                Ok(client)
            }
        }
    }

    pub fn with_token(url: &str, token: &str, insecure: bool) -> Result<Self, ApiError> {
        let http = Client::builder()
            .user_agent(concat!("terraform-provider-vra/", env!("CARGO_PKG_VERSION")))
            .danger_accept_invalid_certs(insecure)
            .build()?;

        // Paths are joined relative to the url, which must then end with a slash
        let mut base_url = Url::parse(url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            http,
            base_url,
            token: token.to_owned(),
        })
    }

    async fn login(&self, refresh_token: &str) -> Result<String, ApiError> {
        tracing::debug!("POST {LOGIN_PATH}");
        let url = self.url(LOGIN_PATH)?;
        let response = self
            .http
            .post(url)
            .json(&LoginRequest { refresh_token })
            .send()
            .await?;
        let login: LoginResponse = check(LOGIN_PATH, response).await?.json().await?;
        Ok(login.token)
    }

    /// `path` under the base url, keeping any prefix the base url has
    fn url(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let url = self.url(path)?;
        Ok(self
            .http
            .request(method, url)
            .bearer_auth(&self.token)
            .query(&[("apiVersion", API_VERSION)]))
    }

    async fn send<T: DeserializeOwned>(
        &self,
        path: &str,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = check(path, request.send().await?).await?;
        Ok(response.json().await?)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        tracing::debug!("GET {path}");
        self.send(path, self.request(Method::GET, path)?).await
    }

    /// List the objects of a collection matching an OData `$filter`
    pub async fn list<T: DeserializeOwned>(
        &self,
        path: &str,
        filter: &str,
    ) -> Result<Page<T>, ApiError> {
        tracing::debug!("GET {path} $filter={filter}");
        let request = self
            .request(Method::GET, path)?
            .query(&[("$filter", filter)]);
        self.send(path, request).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        tracing::debug!("POST {path}");
        self.send(path, self.request(Method::POST, path)?.json(body))
            .await
    }

    pub async fn patch<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        tracing::debug!("PATCH {path}");
        self.send(path, self.request(Method::PATCH, path)?.json(body))
            .await
    }

    /// Delete an object, the body of the answer is ignored
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        tracing::debug!("DELETE {path}");
        check(path, self.request(Method::DELETE, path)?.send().await?).await?;
        Ok(())
    }

    pub async fn get_request_tracker(&self, id: &str) -> Result<RequestTracker, ApiError> {
        self.get(&format!("{REQUEST_TRACKER_PATH}/{id}")).await
    }
}

async fn check(path: &str, response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|error| error.message)
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| {
            if body.is_empty() {
                status.to_string()
            } else {
                body
            }
        });
    tracing::debug!("{path} answered {status}: {message}");

    if status == reqwest::StatusCode::NOT_FOUND {
        Err(ApiError::NotFound {
            path: path.to_owned(),
            message,
        })
    } else {
        Err(ApiError::Status {
            status: status.as_u16(),
            message,
        })
    }
}
