//! HTTP(S) source using reqwest

use super::Fetcher;
use crate::error::{Error, Result};
use crate::types::Dependency;
use async_trait::async_trait;
use reqwest::{Certificate, Client};
use tracing::debug;

/// Fetches fragments over HTTP(S)
///
/// A bearer token takes precedence over basic auth. A CA bundle in the
/// credentials is trusted for the request; without one, certificates are
/// not verified.
#[derive(Debug, Clone, Default)]
pub struct HttpSource;

impl HttpSource {
    fn client(dependency: &Dependency) -> Result<Client> {
        let builder = Client::builder();

        let builder = match &dependency.auth.ca_content {
            Some(ca) if !ca.is_empty() => {
                debug!(url = %dependency.path, "using CA for authentication for remote URL");
                let certificate = Certificate::from_pem(ca.as_bytes())
                    .map_err(|e| Error::fetch(&dependency.path, e))?;
                builder.add_root_certificate(certificate)
            }
            _ => {
                debug!(url = %dependency.path, "skipping TLS verification");
                builder.danger_accept_invalid_certs(true)
            }
        };

        builder
            .build()
            .map_err(|e| Error::fetch(&dependency.path, e))
    }
}

#[async_trait]
impl Fetcher for HttpSource {
    async fn fetch(&self, dependency: &Dependency) -> Result<String> {
        let client = Self::client(dependency)?;
        let auth = &dependency.auth;

        let mut request = client.get(&dependency.path);
        if let Some(token) = auth.bearer_token.as_deref().filter(|t| !t.is_empty()) {
            debug!(url = %dependency.path, "using token based auth for remote URL");
            request = request.bearer_auth(token);
        } else if let (Some(user), Some(password)) = (
            auth.username.as_deref().filter(|u| !u.is_empty()),
            auth.password.as_deref().filter(|p| !p.is_empty()),
        ) {
            debug!(url = %dependency.path, "using basic auth for remote URL");
            request = request.basic_auth(user, Some(password));
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::fetch(&dependency.path, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::fetch(
                &dependency.path,
                format!("server responded with {status}"),
            ));
        }

        response
            .text()
            .await
            .map_err(|e| Error::fetch(&dependency.path, e))
    }
}
