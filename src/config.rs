use serde::{Deserialize, Serialize};

use std::{env, fs, path::Path};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_POOL_MAX_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    /// Raw error details are only sent to clients outside production.
    pub const fn exposes_error_details(self) -> bool {
        matches!(self, Self::Development)
    }

    fn parse(value: &str) -> Result<Self, String> {
        match value.trim().to_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(format!("unknown environment '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database_url: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_pool_max_size")]
    pub pool_max_size: usize,
    #[serde(default)]
    pub environment: Environment,
}

const fn default_port() -> u16 {
    DEFAULT_PORT
}

const fn default_pool_max_size() -> usize {
    DEFAULT_POOL_MAX_SIZE
}

fn parse_yaml(contents: &str) -> Result<Config, Box<dyn std::error::Error>> {
    serde_yaml::from_str(contents).map_err(Into::into)
}

fn load_from_env() -> Result<Config, Box<dyn std::error::Error>> {
    let database_url =
        env::var("DATABASE_URL").map_err(|_| "DATABASE_URL environment variable is required")?;

    let port = match env::var("PORT") {
        Ok(value) => value
            .parse::<u16>()
            .map_err(|e| format!("Failed to parse PORT: {e}"))?,
        Err(_) => DEFAULT_PORT,
    };

    let pool_max_size = match env::var("DB_POOL_MAX_SIZE") {
        Ok(value) => value
            .parse::<usize>()
            .map_err(|e| format!("Failed to parse DB_POOL_MAX_SIZE: {e}"))?,
        Err(_) => DEFAULT_POOL_MAX_SIZE,
    };

    let environment = match env::var("APP_ENV") {
        Ok(value) => Environment::parse(&value)?,
        Err(_) => Environment::default(),
    };

    Ok(Config {
        database_url,
        port,
        pool_max_size,
        environment,
    })
}

pub fn load_config() -> Result<Config, Box<dyn std::error::Error>> {
    // Retrieve env variable
    let config_path = env::var("NOTES_CONFIG").unwrap_or_else(|_| "config.yaml".to_string());

    // Try env path
    if Path::new(&config_path).exists() {
        let contents = fs::read_to_string(&config_path)?;
        return parse_yaml(&contents);
    }

    // Fallback to config.yaml
    if Path::new("config.yaml").exists() {
        tracing::warn!(
            "Config file '{}' not found, falling back to 'config.yaml'",
            config_path
        );
        let contents = fs::read_to_string("config.yaml")?;
        return parse_yaml(&contents);
    }

    // Fallback to config.example.yaml
    if Path::new("config.example.yaml").exists() {
        tracing::warn!(
            "Config file '{}' and 'config.yaml' not found, falling back to 'config.example.yaml'\
             \n This file should not be used and should be replaced with actual data",
            config_path
        );
        let contents = fs::read_to_string("config.example.yaml")?;
        return parse_yaml(&contents);
    }

    // Fallback to environment variables
    tracing::info!(
        "No config file found, attempting to load configuration from environment variables"
    );
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Successfully loaded configuration from environment variables");
            Ok(config)
        }
        Err(e) => Err(format!(
            "Config file not found and environment variables are incomplete. \
             Tried: '{config_path}', 'config.yaml', 'config.example.yaml', and environment variables. \
             Error: {e}"
        )
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_defaults_fill_optional_fields() {
        let config = parse_yaml("database_url: postgres://localhost/notes\n").unwrap();

        assert_eq!(config.database_url, "postgres://localhost/notes");
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.pool_max_size, DEFAULT_POOL_MAX_SIZE);
        assert_eq!(config.environment, Environment::Development);
    }

    #[test]
    fn yaml_reads_production_environment() {
        let config = parse_yaml(
            "database_url: postgres://db/notes\nport: 9000\npool_max_size: 4\nenvironment: production\n",
        )
        .unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.pool_max_size, 4);
        assert!(!config.environment.exposes_error_details());
    }

    #[test]
    fn yaml_without_database_url_is_rejected() {
        assert!(parse_yaml("port: 8080\n").is_err());
    }

    #[test]
    fn environment_names_are_case_insensitive() {
        assert_eq!(Environment::parse("PROD"), Ok(Environment::Production));
        assert_eq!(Environment::parse(" Development "), Ok(Environment::Development));
        assert!(Environment::parse("staging").is_err());
    }
}
