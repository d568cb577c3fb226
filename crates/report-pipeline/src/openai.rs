//! OpenAI-compatible chat completions client

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::ServiceError;
use crate::generator::{GenerateOptions, TextGenerator};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
        }
    }

    /// Read the API key from an environment variable
    pub fn from_env(var: &str) -> Result<Self, ServiceError> {
        match std::env::var(var) {
            Ok(key) if !key.trim().is_empty() => Ok(Self::new(key.trim())),
            _ => Err(ServiceError::MissingApiKey(var.to_string())),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

fn request_body<'a>(prompt: &'a str, options: &'a GenerateOptions) -> ChatRequest<'a> {
    ChatRequest {
        model: &options.model,
        messages: [ChatMessage {
            role: "user",
            content: prompt,
        }],
        temperature: options.temperature,
        max_tokens: options.max_tokens,
    }
}

fn extract_content(response: ChatResponse) -> Result<String, ServiceError> {
    let content = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ServiceError::MalformedResponse("no choices in response".to_string()))?
        .message
        .content
        .unwrap_or_default();
    if content.trim().is_empty() {
        return Err(ServiceError::MalformedResponse(
            "response message has no content".to_string(),
        ));
    }
    Ok(content)
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerateOptions,
    ) -> Result<String, ServiceError> {
        debug!(model = %options.model, prompt_chars = prompt.len(), "Requesting completion");
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request_body(prompt, options))
            .send()
            .await
            .map_err(|e| ServiceError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::Status {
                status: status.as_u16(),
                body: body.trim().chars().take(500).collect(),
            });
        }

        let body = response
            .json::<ChatResponse>()
            .await
            .map_err(|e| ServiceError::MalformedResponse(e.to_string()))?;
        extract_content(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response and hand back the raw request
    async fn serve_once(status: &'static str, body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request);
                if let Some(header_end) = text.find("\r\n\r\n") {
                    let length = text[..header_end]
                        .lines()
                        .find_map(|l| {
                            let (name, value) = l.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if request.len() >= header_end + 4 + length {
                        break;
                    }
                }
            }
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&request).into_owned()
        });
        (url, handle)
    }

    #[test]
    fn test_request_body_shape() {
        let options = GenerateOptions {
            max_tokens: Some(900),
            ..GenerateOptions::default()
        };
        let json = serde_json::to_value(request_body("Assess Acme", &options)).unwrap();
        assert_eq!(json["model"], "gpt-4-turbo-preview");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "Assess Acme");
        assert_eq!(json["max_tokens"], 900);
    }

    #[test]
    fn test_empty_choices_are_malformed() {
        let response: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(matches!(
            extract_content(response),
            Err(ServiceError::MalformedResponse(_))
        ));
        let response: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":null}}]}"#).unwrap();
        assert!(extract_content(response).is_err());
    }

    #[test]
    fn test_missing_env_key() {
        let err = OpenAiClient::from_env("ESG_TEST_KEY_THAT_IS_NOT_SET").unwrap_err();
        assert_eq!(
            err,
            ServiceError::MissingApiKey("ESG_TEST_KEY_THAT_IS_NOT_SET".to_string())
        );
    }

    #[tokio::test]
    async fn test_generate_reads_first_choice() {
        let (url, server) = serve_once(
            "200 OK",
            r#"{"choices":[{"message":{"role":"assistant","content":"Narrative text"}}]}"#,
        )
        .await;
        let client = OpenAiClient::new("sk-test").with_base_url(format!("{}/", url));
        let text = client
            .generate("Assess Acme", &GenerateOptions::default())
            .await
            .unwrap();
        assert_eq!(text, "Narrative text");

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /chat/completions"));
        assert!(request.to_ascii_lowercase().contains("authorization: bearer sk-test"));
        assert!(request.contains("Assess Acme"));
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let (url, server) = serve_once(
            "429 Too Many Requests",
            r#"{"error":{"message":"quota exceeded"}}"#,
        )
        .await;
        let client = OpenAiClient::new("sk-test").with_base_url(url);
        let err = client
            .generate("Assess Acme", &GenerateOptions::default())
            .await
            .unwrap_err();
        match err {
            ServiceError::Status { status, body } => {
                assert_eq!(status, 429);
                assert!(body.contains("quota exceeded"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        server.await.unwrap();
    }
}
