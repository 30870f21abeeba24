use std::time::Duration;

use reqwest::StatusCode;

use crate::config;

const TEMPERATURE: f32 = 0.7;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("generation api rejected the configured credential")]
    Auth,
    #[error("generation api rate limited the request")]
    RateLimited,
    #[error("generation api did not answer within the configured timeout")]
    Timeout,
    #[error("generation api request failed")]
    Upstream(#[source] UpstreamError),
}

#[derive(thiserror::Error, Debug)]
pub enum UpstreamError {
    #[error("unexpected status {0}")]
    Status(StatusCode),
    #[error(transparent)]
    Http(reqwest::Error),
    #[error("empty or missing completion text")]
    EmptyCompletion,
}

#[derive(serde::Serialize, Debug)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<CompletionMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(serde::Serialize, Debug)]
struct CompletionMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(serde::Deserialize, Debug)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(serde::Deserialize, Debug)]
struct CompletionChoice {
    message: ResponseMessage,
}

#[derive(serde::Deserialize, Debug)]
struct ResponseMessage {
    content: Option<String>,
}

/// Client for an OpenAI-compatible chat-completions endpoint. One outbound
/// request per invocation, no retries, no caching.
#[derive(Debug)]
pub struct FactGenerator {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl FactGenerator {
    pub fn new(conf: &config::Generator) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(conf.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            endpoint: conf.endpoint.clone(),
            api_key: conf.api_key.clone(),
            model: conf.model.clone(),
            max_tokens: conf.max_tokens,
        })
    }

    /// Awaits a single completion for the given prompt. The returned text is
    /// trimmed and guaranteed non-empty.
    pub async fn generate(&self, prompt: &str) -> Result<String, Error> {
        let request = CompletionRequest {
            model: &self.model,
            messages: vec![CompletionMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: self.max_tokens,
            temperature: TEMPERATURE,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(request_error)?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => return Err(Error::Auth),
            StatusCode::TOO_MANY_REQUESTS => return Err(Error::RateLimited),
            status if !status.is_success() => {
                return Err(Error::Upstream(UpstreamError::Status(status)))
            }
            _ => (),
        }

        let completion = response
            .json::<CompletionResponse>()
            .await
            .map_err(request_error)?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(Error::Upstream(UpstreamError::EmptyCompletion))
    }
}

fn request_error(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::Timeout
    } else {
        Error::Upstream(UpstreamError::Http(err))
    }
}
