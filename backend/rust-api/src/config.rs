use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub mongo_uri: String,
    pub mongo_database: String,
    pub jwt_secret: String,
    pub gemini_api_url: String,
    pub gemini_api_key: String,
    pub gemini_model: String,
    /// Applied to every provider call: generation, retry, improvement tip.
    pub provider_timeout_secs: u64,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        // Load environment variables from root .env file (two levels up)
        // Try root .env first, then fallback to local .env
        let skip_root_env = env::var("SKIP_ROOT_ENV").is_ok();
        if skip_root_env {
            dotenvy::dotenv().ok();
        } else if dotenvy::from_path("../../.env").is_err() {
            // Fallback to current directory .env for backward compatibility
            dotenvy::dotenv().ok();
        }

        // Determine environment (defaults to dev)
        let env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        // Build configuration from config/*.toml + ENV overrides
        let config_builder = config::Config::builder()
            // Load base config from TOML file
            .add_source(
                config::File::with_name(&format!("config/{}", env)).required(false), // Allow missing config file, fallback to ENV
            )
            // Override with environment variables (prefix: APP_)
            .add_source(config::Environment::with_prefix("APP").separator("__"));

        let settings = config_builder.build()?;

        let mongo_uri = settings
            .get_string("database.mongo_uri")
            .or_else(|_| env::var("MONGO_URI"))
            .unwrap_or_else(|_| "mongodb://localhost:27017/careercoach".to_string());

        let mongo_database = settings
            .get_string("database.mongo_database")
            .or_else(|_| env::var("MONGO_DATABASE"))
            .unwrap_or_else(|_| "careercoach".to_string());

        let jwt_secret = settings
            .get_string("auth.jwt_secret")
            .or_else(|_| env::var("JWT_SECRET"))
            .unwrap_or_else(|_| {
                if env == "prod" {
                    panic!("FATAL: JWT_SECRET must be set in production!");
                }
                eprintln!("WARNING: Using default JWT_SECRET (dev mode only!)");
                "dev-secret-only-for-local-testing".to_string()
            });

        let gemini_api_url = settings
            .get_string("gemini.api_url")
            .or_else(|_| env::var("GEMINI_API_URL"))
            .unwrap_or_else(|_| "https://generativelanguage.googleapis.com".to_string());

        let gemini_api_key = settings
            .get_string("gemini.api_key")
            .or_else(|_| env::var("GEMINI_API_KEY"))
            .unwrap_or_else(|_| {
                if env == "prod" {
                    panic!("FATAL: GEMINI_API_KEY must be set in production!");
                }
                eprintln!("WARNING: GEMINI_API_KEY not set, provider calls will fail");
                String::new()
            });

        let gemini_model = settings
            .get_string("gemini.model")
            .or_else(|_| env::var("GEMINI_MODEL"))
            .unwrap_or_else(|_| "gemini-2.5-flash-lite".to_string());

        let provider_timeout_secs = settings
            .get_string("gemini.timeout_secs")
            .or_else(|_| env::var("PROVIDER_TIMEOUT_SECS"))
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(30);

        Ok(Config {
            mongo_uri,
            mongo_database,
            jwt_secret,
            gemini_api_url,
            gemini_api_key,
            gemini_model,
            provider_timeout_secs,
        })
    }
}
