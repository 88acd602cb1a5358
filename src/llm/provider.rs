//! Provider-specific URL layout and authentication.
//!
//! Every supported backend speaks the Chat Completions wire format; they only
//! differ in where the endpoint lives and how the key is presented.

/// Default Azure `OpenAI` API version.
pub const DEFAULT_AZURE_API_VERSION: &str = "2024-08-01-preview";

/// Supported completion providers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provider {
    /// `OpenAI` (api.openai.com)
    OpenAI,
    /// Azure `OpenAI` Service
    AzureOpenAI {
        /// Deployment name, used in place of the model in the URL.
        deployment_name: String,
        /// API version query parameter.
        api_version: String,
    },
    /// `OpenRouter` (openrouter.ai)
    OpenRouter,
    /// Together AI (together.ai, together.xyz)
    TogetherAI,
    /// Groq (groq.com)
    Groq,
    /// Any other OpenAI-compatible server.
    Generic,
}

/// How the API key is attached to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    /// `Authorization: Bearer <key>`
    Bearer,
    /// `api-key: <key>`
    ApiKeyHeader,
}

impl Provider {
    /// Detect the provider from a base URL.
    ///
    /// Azure deployments are detected with an empty deployment name; callers
    /// fill it in with [`Provider::with_azure_deployment`].
    #[must_use]
    pub fn detect_from_url(base_url: &str) -> Self {
        let lower = base_url.to_lowercase();

        if lower.contains("openai.azure.com") {
            Self::AzureOpenAI {
                deployment_name: String::new(),
                api_version: DEFAULT_AZURE_API_VERSION.to_string(),
            }
        } else if lower.contains("openrouter.ai") {
            Self::OpenRouter
        } else if lower.contains("together.ai") || lower.contains("together.xyz") {
            Self::TogetherAI
        } else if lower.contains("groq.com") {
            Self::Groq
        } else if lower.contains("openai.com") {
            Self::OpenAI
        } else {
            Self::Generic
        }
    }

    /// Attach Azure deployment details. No-op for other providers.
    #[must_use]
    pub fn with_azure_deployment(self, deployment: Option<String>, version: Option<String>) -> Self {
        match self {
            Self::AzureOpenAI {
                deployment_name,
                api_version,
            } => Self::AzureOpenAI {
                deployment_name: deployment.unwrap_or(deployment_name),
                api_version: version.unwrap_or(api_version),
            },
            other => other,
        }
    }

    /// Auth scheme expected by this provider.
    #[must_use]
    pub fn auth_scheme(&self) -> AuthScheme {
        match self {
            Self::AzureOpenAI { .. } => AuthScheme::ApiKeyHeader,
            _ => AuthScheme::Bearer,
        }
    }

    /// Build the chat completions URL for this provider.
    ///
    /// Accepts base URLs with or without a trailing `/v1`.
    #[must_use]
    pub fn chat_url(&self, base_url: &str) -> String {
        let base = base_url.trim_end_matches('/');

        match self {
            Self::AzureOpenAI {
                deployment_name,
                api_version,
            } => format!(
                "{base}/openai/deployments/{deployment_name}/chat/completions?api-version={api_version}"
            ),
            _ if base.ends_with("/v1") => format!("{base}/chat/completions"),
            _ => format!("{base}/v1/chat/completions"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_openai() {
        assert_eq!(
            Provider::detect_from_url("https://api.openai.com"),
            Provider::OpenAI
        );
    }

    #[test]
    fn test_detect_azure() {
        let provider = Provider::detect_from_url("https://my-resource.openai.azure.com");
        assert!(matches!(provider, Provider::AzureOpenAI { .. }));
        assert_eq!(provider.auth_scheme(), AuthScheme::ApiKeyHeader);
    }

    #[test]
    fn test_detect_groq_and_generic() {
        assert_eq!(
            Provider::detect_from_url("https://api.groq.com/openai"),
            Provider::Groq
        );
        assert_eq!(
            Provider::detect_from_url("http://localhost:11434"),
            Provider::Generic
        );
    }

    #[test]
    fn test_chat_url_variants() {
        assert_eq!(
            Provider::OpenAI.chat_url("https://api.openai.com/"),
            "https://api.openai.com/v1/chat/completions"
        );
        assert_eq!(
            Provider::OpenRouter.chat_url("https://openrouter.ai/api/v1"),
            "https://openrouter.ai/api/v1/chat/completions"
        );
    }

    #[test]
    fn test_azure_deployment_url() {
        let provider = Provider::detect_from_url("https://res.openai.azure.com")
            .with_azure_deployment(Some("jarvis".to_string()), None);
        assert_eq!(
            provider.chat_url("https://res.openai.azure.com"),
            "https://res.openai.azure.com/openai/deployments/jarvis/chat/completions?api-version=2024-08-01-preview"
        );
    }

    #[test]
    fn test_with_azure_deployment_ignored_elsewhere() {
        let provider = Provider::Groq.with_azure_deployment(Some("x".to_string()), None);
        assert_eq!(provider, Provider::Groq);
    }
}
