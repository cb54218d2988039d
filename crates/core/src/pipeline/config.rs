use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_DESTINATION: &str = "/temp-output-directory/alternative/quiver/twitter";
pub const DEFAULT_DATASET: &str = "twitter";
pub const DEFAULT_MARKET: &str = "usa";

const DEFAULT_MAX_ATTEMPTS: u32 = 5;
const DEFAULT_RETRY_COOLDOWN_MS: u64 = 1_000;
const DEFAULT_REQ_DELAY_MS: u64 = 30;
const DEFAULT_PROGRESS_EVERY: usize = 100;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Per-ticker files go here; universe files under `universe/`.
    pub destination: PathBuf,

    /// Vendor dataset in `historical/{dataset}/{ticker}`.
    pub dataset: String,

    /// Market used for identifier resolution.
    pub market: String,

    /// Attempts per ticker, including the first one.
    pub max_attempts: u32,

    /// Sleep after a failed attempt before the next one.
    pub retry_cooldown: Duration,

    /// Sleep after every request that got a response.
    pub request_delay: Duration,

    /// Log progress every N companies (0 disables).
    pub progress_every: usize,
}

impl PipelineConfig {
    pub fn new(destination: impl Into<PathBuf>) -> Self {
        Self {
            destination: destination.into(),
            dataset: DEFAULT_DATASET.to_string(),
            market: DEFAULT_MARKET.to_string(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_cooldown: Duration::from_millis(DEFAULT_RETRY_COOLDOWN_MS),
            request_delay: Duration::from_millis(DEFAULT_REQ_DELAY_MS),
            progress_every: DEFAULT_PROGRESS_EVERY,
        }
    }

    /// Applies `QUIVER_MAX_ATTEMPTS`, `QUIVER_RETRY_COOLDOWN_MS`, `QUIVER_REQ_DELAY_MS` and
    /// `QUIVER_PROGRESS_EVERY` when set and parseable.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(n) = env_parse::<u32>("QUIVER_MAX_ATTEMPTS") {
            self.max_attempts = n.max(1);
        }
        if let Some(ms) = env_parse::<u64>("QUIVER_RETRY_COOLDOWN_MS") {
            self.retry_cooldown = Duration::from_millis(ms);
        }
        if let Some(ms) = env_parse::<u64>("QUIVER_REQ_DELAY_MS") {
            self.request_delay = Duration::from_millis(ms);
        }
        if let Some(n) = env_parse::<usize>("QUIVER_PROGRESS_EVERY") {
            self.progress_every = n;
        }
        self
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse::<T>().ok())
}
