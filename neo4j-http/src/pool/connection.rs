// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! A single persistent HTTP connection

use reqwest::blocking::{Client as HttpClient, RequestBuilder};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, LOCATION};
use serde_json::Value;

use crate::config::Config;
use crate::error::{Error, Result};

/// Status, headers of interest and the fully drained body of a response
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub url: String,
    /// `Location` header, if present
    pub location: Option<String>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// One keep-alive connection to the server's base URL
///
/// The underlying client keeps at most one idle socket, so a checked-out
/// `Connection` maps onto one persistent TCP connection.
pub struct Connection {
    id: usize,
    http: HttpClient,
    base_url: String,
    user: Option<String>,
    password: Option<String>,
}

impl Connection {
    pub(crate) fn open(id: usize, config: &Config) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json;charset=UTF-8"),
        );

        let http = HttpClient::builder()
            .timeout(config.request_timeout())
            .pool_max_idle_per_host(1)
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .build()?;

        Ok(Self {
            id,
            http,
            base_url: config.base_url().to_string(),
            user: config.user.clone(),
            password: config.password.clone(),
        })
    }

    /// Pool-assigned identifier, stable for the connection's lifetime
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a path below the base URL
    pub fn url(&self, path: &str) -> String {
        if path.is_empty() || path == "/" {
            format!("{}/", self.base_url)
        } else if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    pub fn get(&self, path: &str) -> Result<HttpResponse> {
        self.send(self.http.get(self.url(path)))
    }

    pub fn post(&self, path: &str, body: &Value, headers: &[(&str, &str)]) -> Result<HttpResponse> {
        let mut request = self.http.post(self.url(path)).json(body);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        self.send(request)
    }

    pub fn delete(&self, path: &str) -> Result<HttpResponse> {
        self.send(self.http.delete(self.url(path)))
    }

    fn send(&self, request: RequestBuilder) -> Result<HttpResponse> {
        let request = match &self.user {
            Some(user) => request.basic_auth(user, self.password.as_deref()),
            None => request,
        };

        let response = request.send().map_err(Error::from)?;
        let status = response.status().as_u16();
        let url = response.url().to_string();
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        // Reading to the end hands the socket back for keep-alive reuse.
        let body = response.text().map_err(Error::from)?;

        Ok(HttpResponse {
            status,
            url,
            location,
            body,
        })
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("base_url", &self.base_url)
            .field("user", &self.user)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_join_paths_onto_base_url() {
        let config = Config::default().with_uri("http://db:7474/");
        let connection = Connection::open(1, &config).expect("Failed to open connection");

        assert_eq!(connection.url("/db/neo4j/tx"), "http://db:7474/db/neo4j/tx");
        assert_eq!(connection.url("db/neo4j/tx"), "http://db:7474/db/neo4j/tx");
        assert_eq!(connection.url(""), "http://db:7474/");
    }

    #[test]
    fn should_not_leak_password_in_debug_output() {
        let config = Config::default().with_credentials("neo4j", "secret");
        let connection = Connection::open(1, &config).expect("Failed to open connection");

        assert!(!format!("{:?}", connection).contains("secret"));
    }
}
