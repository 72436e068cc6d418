//! Keycloak implementation of the account provisioning seam.
//!
//! Uses the admin REST API: a client-credentials token against the realm,
//! then a user creation call. Keycloak returns the new user's URL in the
//! Location header; the trailing segment is the user id.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use super::BaseAccountProvisioner;

#[derive(Debug, Clone)]
pub struct KeycloakOptions {
    pub base_url: String,
    pub realm: String,
    pub client_id: String,
    pub client_secret: String,
}

pub struct KeycloakClient {
    options: KeycloakOptions,
    client: Client,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl KeycloakClient {
    pub fn new(options: KeycloakOptions) -> Self {
        Self {
            options,
            client: Client::new(),
        }
    }

    async fn admin_token(&self) -> Result<String> {
        let url = format!(
            "{}/realms/{}/protocol/openid-connect/token",
            self.options.base_url, self.options.realm
        );

        let response = self
            .client
            .post(&url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.options.client_id.as_str()),
                ("client_secret", self.options.client_secret.as_str()),
            ])
            .send()
            .await
            .context("Keycloak token request failed")?;

        if !response.status().is_success() {
            bail!("Keycloak token request returned {}", response.status());
        }

        let token: TokenResponse = response
            .json()
            .await
            .context("Failed to parse Keycloak token response")?;
        Ok(token.access_token)
    }
}

#[async_trait]
impl BaseAccountProvisioner for KeycloakClient {
    async fn create_account(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
        phone_number: &str,
        password: &str,
    ) -> Result<String> {
        let token = self.admin_token().await?;

        let url = format!(
            "{}/admin/realms/{}/users",
            self.options.base_url, self.options.realm
        );

        let body = json!({
            "username": email,
            "email": email,
            "firstName": first_name,
            "lastName": last_name,
            "enabled": true,
            "emailVerified": true,
            "attributes": { "phoneNumber": [phone_number] },
            "credentials": [{
                "type": "password",
                "value": password,
                "temporary": false,
            }],
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .context("Keycloak user creation request failed")?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            bail!("Keycloak user creation returned {}: {}", status, detail);
        }

        let location = response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| anyhow!("Keycloak response missing Location header"))?;

        let user_id = location
            .rsplit('/')
            .next()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| anyhow!("Keycloak Location header has no user id: {}", location))?;

        Ok(user_id.to_string())
    }
}
