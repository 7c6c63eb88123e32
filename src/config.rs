use std::path::PathBuf;
use std::time::Duration;

use clap::Args;

use crate::storage::{default_dir, Storage};
use crate::sync::RetryPolicy;

/// Options shared by every subcommand. Each can also come from the
/// environment.
#[derive(Args, Debug, Clone)]
pub struct GlobalOpts {
    /// Backend base URL
    #[arg(long, global = true, env = "TODODECK_API_URL", default_value = "http://localhost:5000")]
    pub api_url: String,
    /// Directory for the local cache (todos.json, session.json)
    #[arg(long, global = true, env = "TODODECK_DIR")]
    pub data_dir: Option<PathBuf>,
    /// Work against the local cache only
    #[arg(long, global = true, env = "TODODECK_OFFLINE")]
    pub offline: bool,
    /// Attempts per request for transient failures
    #[arg(long, global = true, env = "TODODECK_RETRIES", default_value_t = 3)]
    pub retries: u32,
    /// Request timeout in seconds
    #[arg(long, global = true, env = "TODODECK_TIMEOUT", default_value_t = 10)]
    pub timeout: u64,
}

/// Resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub data_dir: PathBuf,
    pub offline: bool,
    pub retry: RetryPolicy,
    pub timeout: Duration,
}

impl Config {
    pub fn storage(&self) -> Storage {
        Storage::new(self.data_dir.clone())
    }
}

impl From<GlobalOpts> for Config {
    fn from(opts: GlobalOpts) -> Self {
        Config {
            api_url: opts.api_url,
            data_dir: opts.data_dir.unwrap_or_else(default_dir),
            offline: opts.offline,
            retry: RetryPolicy { attempts: opts.retries.max(1), ..RetryPolicy::default() },
            timeout: Duration::from_secs(opts.timeout.max(1)),
        }
    }
}
