pub mod domain;
pub mod identifier;
pub mod ingest;
pub mod pipeline;
pub mod storage;

pub mod config {
    use anyhow::Context;

    pub const DEFAULT_QUIVER_BASE_URL: &str = "https://api.quiverquant.com/beta";

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub quiver_api_key: Option<String>,
        pub quiver_base_url: String,
        pub sentry_dsn: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                quiver_api_key: std::env::var("QUIVER_API_KEY")
                    .ok()
                    .filter(|s| !s.trim().is_empty()),
                quiver_base_url: std::env::var("QUIVER_BASE_URL")
                    .ok()
                    .filter(|s| !s.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_QUIVER_BASE_URL.to_string()),
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
            })
        }

        pub fn require_quiver_api_key(&self) -> anyhow::Result<&str> {
            self.quiver_api_key
                .as_deref()
                .context("QUIVER_API_KEY is required")
        }
    }
}
