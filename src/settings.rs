use config::{Config, ConfigError, File};
use serde::Deserialize;

fn default_pool_size() -> usize {
    10
}

/// Bridge endpoints and pool sizing. Addresses are `host:port` strings
/// resolved at dial time.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    /// Address the agreement engine accepts submissions on (control and
    /// pooled connections).
    pub send_address: String,
    /// Address the agreement engine serves the agreed-block stream on.
    pub recv_address: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
}

impl Settings {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        Config::builder().add_source(File::with_name(path)).build()?.try_deserialize()
    }
}
