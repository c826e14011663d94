//! Text generator abstraction.

use std::future::Future;

use super::gemini::GeminiGenerator;
use crate::error::GenerationError;
use crate::storage::GeneratorConfig;

/// Asynchronous prompt-to-text capability.
///
/// Calls are independent and stateless. Implementations report every
/// failure as a [`GenerationError`]; callers decide whether to fall back.
pub trait TextGenerator: Send + Sync {
    fn generate(
        &self,
        prompt: &str,
    ) -> impl Future<Output = Result<String, GenerationError>> + Send;
}

/// Generator used when no service is configured. Always fails, which
/// routes every caller to its local fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineGenerator;

impl TextGenerator for OfflineGenerator {
    fn generate(
        &self,
        _prompt: &str,
    ) -> impl Future<Output = Result<String, GenerationError>> + Send {
        async { Err(GenerationError::Unavailable("no generator configured".into())) }
    }
}

/// Generator picked from configuration at startup.
pub enum ConfiguredGenerator {
    Gemini(GeminiGenerator),
    Offline(OfflineGenerator),
}

impl ConfiguredGenerator {
    /// Use the Gemini service when its API key is present in the
    /// environment, otherwise run offline.
    pub fn from_config(config: &GeneratorConfig) -> Self {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty());
        let Some(api_key) = api_key else {
            tracing::info!(env = %config.api_key_env, "no API key set, generator offline");
            return ConfiguredGenerator::Offline(OfflineGenerator);
        };
        match GeminiGenerator::new(config, api_key) {
            Ok(gemini) => ConfiguredGenerator::Gemini(gemini),
            Err(err) => {
                tracing::warn!(error = %err, "invalid generator config, generator offline");
                ConfiguredGenerator::Offline(OfflineGenerator)
            }
        }
    }

    pub fn is_online(&self) -> bool {
        matches!(self, ConfiguredGenerator::Gemini(_))
    }
}

impl TextGenerator for ConfiguredGenerator {
    fn generate(
        &self,
        prompt: &str,
    ) -> impl Future<Output = Result<String, GenerationError>> + Send {
        async move {
            match self {
                ConfiguredGenerator::Gemini(gemini) => gemini.generate(prompt).await,
                ConfiguredGenerator::Offline(offline) => offline.generate(prompt).await,
            }
        }
    }
}
