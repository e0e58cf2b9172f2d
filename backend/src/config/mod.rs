use config::{Config, ConfigError, Environment};
use dotenv::dotenv;
use serde::Deserialize;
use std::collections::HashMap;

/// Process-wide settings, built once in `main` and handed to [`crate::AppState`].
#[derive(Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub port: u16,
    pub jwt_secret: String,
    pub access_token_expire_minutes: i64,
    pub upload_dir: String,
    pub max_file_size: usize,
    pub allowed_extensions: String,
    pub max_image_width: u32,
    pub max_image_height: u32,
    pub image_quality: u8,
    pub cors_origins: String,
    pub admin_email: String,
    pub admin_password: String,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenv().ok(); // Load .env file if present
        Self::build(Environment::default().try_parsing(true))
    }

    /// Same as [`AppConfig::load`] but reads variables from `vars` instead of the process
    /// environment.
    pub fn from_map(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::build(Environment::default().try_parsing(true).source(Some(vars)))
    }

    fn build(env: Environment) -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("port", 8000)?
            .set_default("access_token_expire_minutes", 60)?
            .set_default("upload_dir", "uploads")?
            .set_default("max_file_size", 5_242_880)?
            .set_default("allowed_extensions", "jpg,jpeg,png,webp")?
            .set_default("max_image_width", 1200)?
            .set_default("max_image_height", 900)?
            .set_default("image_quality", 85)?
            .set_default(
                "cors_origins",
                "http://localhost:5173,http://localhost:3000",
            )?
            .set_default("admin_email", "admin@joramcars.co.ke")?
            .set_default("admin_password", "changeme123")?
            .add_source(env)
            .build()?
            .try_deserialize()
    }

    pub fn allowed_extensions(&self) -> Vec<String> {
        split_list(&self.allowed_extensions)
            .map(|ext| ext.trim_start_matches('.').to_lowercase())
            .collect()
    }

    pub fn cors_origins(&self) -> Vec<String> {
        split_list(&self.cors_origins).map(str::to_owned).collect()
    }
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|item| !item.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_fill_everything_but_secrets() {
        let config = AppConfig::from_map(vars(&[
            ("DATABASE_URL", "memory://"),
            ("JWT_SECRET", "secret"),
        ]))
        .unwrap();

        assert_eq!(config.port, 8000);
        assert_eq!(config.max_file_size, 5_242_880);
        assert_eq!(config.access_token_expire_minutes, 60);
        assert_eq!(config.allowed_extensions(), vec!["jpg", "jpeg", "png", "webp"]);
        assert_eq!(config.cors_origins().len(), 2);
    }

    #[test]
    fn missing_database_url_is_an_error() {
        assert!(AppConfig::from_map(vars(&[("JWT_SECRET", "secret")])).is_err());
    }

    #[test]
    fn extension_list_is_normalized() {
        let config = AppConfig::from_map(vars(&[
            ("DATABASE_URL", "memory://"),
            ("JWT_SECRET", "secret"),
            ("ALLOWED_EXTENSIONS", " JPG, .png ,,webp"),
            ("PORT", "9000"),
        ]))
        .unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.allowed_extensions(), vec!["jpg", "png", "webp"]);
    }
}
