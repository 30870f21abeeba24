use std::path::Path;

use config::{Config, ConfigError, Environment};

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

const ENV_PREFIX: &str = "GEOFACTBOT";

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("failed to read config")]
    Read(#[source] ConfigError),
    #[error("failed to parse config")]
    Parse(#[source] ConfigError),
    #[error("bot.telegram_token must not be empty")]
    MissingTelegramToken,
    #[error("generator.api_key must not be empty")]
    MissingApiKey,
    #[error("generator.model must not be empty")]
    MissingModel,
    #[error("generator.max_tokens must be between 1 and 4096")]
    InvalidMaxTokens,
    #[error("generator.timeout_secs must be between 1 and 120")]
    InvalidTimeout,
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct Bot {
    pub telegram_token: String,
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct Generator {
    pub api_key: String,
    pub model: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct Health {
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for Health {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct App {
    pub bot: Bot,
    pub generator: Generator,
    #[serde(default)]
    pub health: Health,
}

impl App {
    /// Loads config from an optional file, overridden by `GEOFACTBOT__*`
    /// environment variables. Missing credentials abort startup.
    pub fn parse(path: Option<&Path>) -> Result<Self, Error> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }

        let config = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .map_err(Error::Read)?
            .try_deserialize::<App>()
            .map_err(Error::Parse)?;

        if config.bot.telegram_token.is_empty() {
            return Err(Error::MissingTelegramToken);
        }

        if config.generator.api_key.is_empty() {
            return Err(Error::MissingApiKey);
        }

        if config.generator.model.is_empty() {
            return Err(Error::MissingModel);
        }

        if !(1..=4096).contains(&config.generator.max_tokens) {
            return Err(Error::InvalidMaxTokens);
        }

        if !(1..=120).contains(&config.generator.timeout_secs) {
            return Err(Error::InvalidTimeout);
        }

        Ok(config)
    }
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_max_tokens() -> u32 {
    300
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_port() -> u16 {
    8000
}

#[cfg(test)]
mod tests {
    use std::{fs, path::PathBuf};

    use super::*;

    fn write_config(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("geofactbot-{name}.toml"));
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn parses_full_config() {
        let path = write_config(
            "full",
            r#"
            [bot]
            telegram_token = "123:abc"

            [generator]
            api_key = "sk-test"
            model = "gpt-4o-mini"
            max_tokens = 200
            timeout_secs = 10

            [health]
            port = 9000
            "#,
        );

        let conf = App::parse(Some(&path)).unwrap();

        assert_eq!(conf.bot.telegram_token, "123:abc");
        assert_eq!(conf.generator.model, "gpt-4o-mini");
        assert_eq!(conf.generator.max_tokens, 200);
        assert_eq!(conf.generator.timeout_secs, 10);
        assert_eq!(conf.health.port, 9000);
    }

    #[test]
    fn applies_defaults() {
        let path = write_config(
            "defaults",
            r#"
            [bot]
            telegram_token = "123:abc"

            [generator]
            api_key = "sk-test"
            model = "gpt-4o-mini"
            "#,
        );

        let conf = App::parse(Some(&path)).unwrap();

        assert_eq!(conf.generator.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(conf.generator.max_tokens, 300);
        assert_eq!(conf.generator.timeout_secs, 30);
        assert_eq!(conf.health.port, 8000);
    }

    #[test]
    fn rejects_empty_telegram_token() {
        let path = write_config(
            "no-token",
            r#"
            [bot]
            telegram_token = ""

            [generator]
            api_key = "sk-test"
            model = "gpt-4o-mini"
            "#,
        );

        assert!(matches!(
            App::parse(Some(&path)),
            Err(Error::MissingTelegramToken)
        ));
    }

    #[test]
    fn rejects_empty_api_key() {
        let path = write_config(
            "no-key",
            r#"
            [bot]
            telegram_token = "123:abc"

            [generator]
            api_key = ""
            model = "gpt-4o-mini"
            "#,
        );

        assert!(matches!(App::parse(Some(&path)), Err(Error::MissingApiKey)));
    }

    #[test]
    fn rejects_invalid_timeout() {
        let path = write_config(
            "bad-timeout",
            r#"
            [bot]
            telegram_token = "123:abc"

            [generator]
            api_key = "sk-test"
            model = "gpt-4o-mini"
            timeout_secs = 0
            "#,
        );

        assert!(matches!(App::parse(Some(&path)), Err(Error::InvalidTimeout)));
    }

    #[test]
    fn rejects_missing_required_section() {
        let path = write_config(
            "no-generator",
            r#"
            [bot]
            telegram_token = "123:abc"
            "#,
        );

        assert!(matches!(App::parse(Some(&path)), Err(Error::Parse(_))));
    }
}
