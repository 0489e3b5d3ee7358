//! Script and search-term generation via an OpenAI-compatible chat API.

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{ProviderError, ProviderResult};

/// Generates the narration script and stock-footage search terms.
///
/// An empty or failed result is treated by the orchestrator the same
/// as "no script" / "no terms".
#[async_trait]
pub trait ScriptGenerator: Send + Sync {
    /// Generate a narration script for a subject.
    async fn generate_script(
        &self,
        subject: &str,
        language: &str,
        paragraph_count: u32,
    ) -> ProviderResult<String>;

    /// Generate search terms for stock footage.
    async fn generate_terms(
        &self,
        subject: &str,
        script: &str,
        count: u32,
    ) -> ProviderResult<Vec<String>>;
}

/// Configuration for the chat completions client.
#[derive(Debug, Clone)]
pub struct ChatClientConfig {
    /// Base URL of the OpenAI-compatible API
    pub base_url: String,
    /// API key
    pub api_key: String,
    /// Model name
    pub model: String,
    /// Request timeout
    pub timeout: Duration,
}

impl ChatClientConfig {
    /// Create config from environment variables.
    pub fn from_env() -> ProviderResult<Self> {
        let api_key = std::env::var("LLM_API_KEY")
            .map_err(|_| ProviderError::config_error("LLM_API_KEY not set"))?;

        Ok(Self {
            base_url: std::env::var("LLM_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            api_key,
            model: std::env::var("LLM_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            timeout: Duration::from_secs(
                std::env::var("LLM_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(120),
            ),
        })
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// OpenAI-compatible chat completions client.
pub struct ChatClient {
    http: Client,
    config: ChatClientConfig,
}

impl ChatClient {
    /// Create a new chat client.
    pub fn new(config: ChatClientConfig) -> ProviderResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ProviderError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> ProviderResult<Self> {
        Self::new(ChatClientConfig::from_env()?)
    }

    /// Send a single-user-message completion and return the content.
    async fn complete(&self, prompt: &str) -> ProviderResult<String> {
        let url = format!("{}/chat/completions", self.config.base_url);
        debug!("Requesting completion from {}", url);

        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage { role: "user", content: prompt }],
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::generation_failed(format!(
                "chat API returned {}: {}",
                status, body
            )));
        }

        let parsed: ChatResponse = response.json().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(ProviderError::EmptyResponse);
        }
        Ok(content)
    }
}

#[async_trait]
impl ScriptGenerator for ChatClient {
    async fn generate_script(
        &self,
        subject: &str,
        language: &str,
        paragraph_count: u32,
    ) -> ProviderResult<String> {
        info!("Generating script for subject: {}", subject);

        let response = self
            .complete(&script_prompt(subject, language, paragraph_count))
            .await?;
        let script = clean_script(&response, paragraph_count);

        if script.is_empty() {
            warn!("Script generation produced an empty script");
            return Err(ProviderError::EmptyResponse);
        }
        Ok(script)
    }

    async fn generate_terms(
        &self,
        subject: &str,
        script: &str,
        count: u32,
    ) -> ProviderResult<Vec<String>> {
        info!("Generating {} search terms for subject: {}", count, subject);

        let response = self.complete(&terms_prompt(subject, script, count)).await?;
        let terms = parse_terms(&response);
        if terms.is_empty() {
            warn!("Could not parse search terms from response");
        }
        Ok(terms)
    }
}

fn script_prompt(subject: &str, language: &str, paragraph_count: u32) -> String {
    let mut prompt = format!(
        "# Role: Video Script Generator\n\n\
         ## Goals:\n\
         Generate a brief script for a video, depending on the subject of the video.\n\n\
         ## Constraints:\n\
         1. return the script as plain text with the specified number of paragraphs.\n\
         2. get straight to the point; do not open with greetings or filler.\n\
         3. never use markdown, titles, or any formatting in the script.\n\
         4. do not include speaker labels such as \"voiceover\" or \"narrator\".\n\
         5. never mention this prompt, the script itself, or the paragraph count.\n\
         6. respond in the same language as the video subject.\n\n\
         # Initialization:\n\
         - video subject: {}\n\
         - number of paragraphs: {}",
        subject, paragraph_count
    );
    if !language.is_empty() {
        prompt.push_str(&format!("\n- language: {}", language));
    }
    prompt
}

fn terms_prompt(subject: &str, script: &str, count: u32) -> String {
    format!(
        "# Role: Video Search Terms Generator\n\n\
         ## Goals:\n\
         Generate {count} search terms for stock videos, depending on the subject of a video.\n\n\
         ## Constraints:\n\
         1. return the search terms as a json-array of strings.\n\
         2. each search term should consist of 1-3 words.\n\
         3. return only the json-array of strings; never return the script or anything else.\n\
         4. the search terms must be related to the subject of the video.\n\
         5. reply in the same language as the video subject.\n\n\
         ## Output Example:\n\
         [\"search term 1\", \"search term 2\", \"search term 3\"]\n\n\
         ## Context:\n\
         ### Video Subject\n{subject}\n\n\
         ### Video Script\n{script}",
        count = count,
        subject = subject,
        script = script
    )
}

/// Strip markdown remnants and trim to the requested paragraph count.
pub fn clean_script(response: &str, paragraph_count: u32) -> String {
    static BRACKETS: OnceLock<Regex> = OnceLock::new();
    static PARENS: OnceLock<Regex> = OnceLock::new();
    let brackets = BRACKETS.get_or_init(|| Regex::new(r"\[[^\]]*\]").unwrap());
    let parens = PARENS.get_or_init(|| Regex::new(r"\([^)]*\)").unwrap());

    let cleaned = response.replace(['*', '#'], "");
    let cleaned = brackets.replace_all(&cleaned, "");
    let cleaned = parens.replace_all(&cleaned, "");

    let paragraphs: Vec<&str> = cleaned
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .take(paragraph_count.max(1) as usize)
        .collect();

    paragraphs.join("\n\n")
}

/// Parse a JSON string array, recovering an embedded array from
/// surrounding prose before giving up and returning empty.
pub fn parse_terms(response: &str) -> Vec<String> {
    if let Ok(terms) = serde_json::from_str::<Vec<String>>(response.trim()) {
        return terms;
    }

    static EMBEDDED: OnceLock<Regex> = OnceLock::new();
    let embedded = EMBEDDED.get_or_init(|| {
        Regex::new(r#"\[\s*"(?:[^"\\]|\\.)*"(?:\s*,\s*"(?:[^"\\]|\\.)*")*\s*\]"#).unwrap()
    });

    if let Some(found) = embedded.find(response) {
        if let Ok(terms) = serde_json::from_str::<Vec<String>>(found.as_str()) {
            return terms;
        }
    }

    warn!("Search term response is not a recoverable json array");
    Vec::new()
}
