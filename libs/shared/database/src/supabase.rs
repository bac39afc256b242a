use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Method,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

use shared_config::AppConfig;
use shared_models::BackendErrorBody;

#[derive(Debug, Error)]
pub enum SupabaseError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("authentication rejected ({status}): {message}")]
    Unauthorized { status: u16, message: String },

    #[error("resource not found: {message}")]
    NotFound { message: String },

    #[error("backend error ({status}): {message}")]
    Backend { status: u16, message: String },
}

impl SupabaseError {
    pub fn is_auth(&self) -> bool {
        matches!(self, SupabaseError::Unauthorized { .. })
    }
}

pub struct SupabaseClient {
    client: Client,
    base_url: String,
    functions_base_url: String,
    anon_key: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.clone(),
            functions_base_url: config.functions_base_url.clone(),
            anon_key: config.supabase_anon_key.clone(),
        }
    }

    fn get_headers(&self, auth_token: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();

        headers.insert("apikey", HeaderValue::from_str(&self.anon_key).unwrap());
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(token) = auth_token {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
            );
        }

        headers
    }

    /// Sends a request to a Supabase REST path and decodes the JSON response.
    pub async fn request<T>(
        &self,
        method: Method,
        path: &str,
        auth_token: Option<&str>,
        body: Option<Value>,
    ) -> Result<T, SupabaseError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        self.dispatch(method, &url, auth_token, body).await
    }

    /// Invokes a serverless function under the functions base URL.
    pub async fn invoke_function<T>(
        &self,
        method: Method,
        function_path: &str,
        auth_token: Option<&str>,
        body: Option<Value>,
    ) -> Result<T, SupabaseError>
    where
        T: DeserializeOwned,
    {
        let url = self.function_url(function_path);
        self.dispatch(method, &url, auth_token, body).await
    }

    async fn dispatch<T>(
        &self,
        method: Method,
        url: &str,
        auth_token: Option<&str>,
        body: Option<Value>,
    ) -> Result<T, SupabaseError>
    where
        T: DeserializeOwned,
    {
        debug!("Making request to {}", url);

        let headers = self.get_headers(auth_token);

        let mut req = self.client.request(method, url).headers(headers);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("API error ({}): {}", status, error_text);

            let message = BackendErrorBody::message_from(&error_text);
            return Err(match status.as_u16() {
                401 | 403 => SupabaseError::Unauthorized {
                    status: status.as_u16(),
                    message,
                },
                404 => SupabaseError::NotFound { message },
                _ => SupabaseError::Backend {
                    status: status.as_u16(),
                    message,
                },
            });
        }

        let data = response.json::<T>().await?;
        Ok(data)
    }

    fn function_url(&self, function_path: &str) -> String {
        format!(
            "{}/{}",
            self.functions_base_url.trim_end_matches('/'),
            function_path.trim_start_matches('/')
        )
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }

    pub fn get_functions_base_url(&self) -> &str {
        &self.functions_base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(base: &str) -> AppConfig {
        AppConfig {
            supabase_url: base.to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            functions_base_url: format!("{}/functions/v1", base),
            jitsi_base_url: "https://meet.jit.si".to_string(),
        }
    }

    #[test]
    fn function_url_joins_cleanly() {
        let client = SupabaseClient::new(&test_config("https://proj.supabase.co"));
        assert_eq!(
            client.function_url("gerar-sala-jitsi/abc-1"),
            "https://proj.supabase.co/functions/v1/gerar-sala-jitsi/abc-1"
        );
        assert_eq!(
            client.function_url("/finalizar-consulta"),
            "https://proj.supabase.co/functions/v1/finalizar-consulta"
        );
    }

    #[tokio::test]
    async fn sends_apikey_and_bearer_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/functions/v1/ping"))
            .and(header("apikey", "test-anon-key"))
            .and(header("authorization", "Bearer token-123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let client = SupabaseClient::new(&test_config(&server.uri()));
        let body: Value = client
            .invoke_function(Method::GET, "ping", Some("token-123"), None)
            .await
            .unwrap();
        assert_eq!(body, json!({"ok": true}));
    }

    #[tokio::test]
    async fn classifies_auth_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/functions/v1/ping"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"error": "JWT expired"})),
            )
            .mount(&server)
            .await;

        let client = SupabaseClient::new(&test_config(&server.uri()));
        let result: Result<Value, _> = client
            .invoke_function(Method::GET, "ping", Some("stale"), None)
            .await;

        assert_matches!(
            result,
            Err(SupabaseError::Unauthorized { status: 401, ref message }) if message == "JWT expired"
        );
        assert!(result.unwrap_err().is_auth());
    }

    #[tokio::test]
    async fn classifies_backend_failures_with_raw_bodies() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/functions/v1/finalizar-consulta"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
            .mount(&server)
            .await;

        let client = SupabaseClient::new(&test_config(&server.uri()));
        let result: Result<Value, _> = client
            .invoke_function(
                Method::POST,
                "finalizar-consulta",
                Some("token"),
                Some(json!({})),
            )
            .await;

        assert_matches!(
            result,
            Err(SupabaseError::Backend { status: 500, ref message }) if message == "upstream exploded"
        );
    }
}
