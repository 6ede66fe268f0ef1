//! Command line arguments.
//!
//! Flags override the environment configuration (`DRIVEUP_*`, optionally
//! loaded from `.env`).

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use driveup_protocol::PayloadMode;
use driveup_relay::RelayConfig;

#[derive(Parser, Debug)]
#[command(name = "driveup", version)]
#[command(about = "Rename a file and upload it through the relay endpoint")]
pub struct Args {
    /// File to upload (Word, Excel, PDF or image, at most 30MB)
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// New base name; the original extension is kept
    #[arg(short, long, value_name = "NAME")]
    pub name: String,

    /// Payload mode: base64 or byteArray
    #[arg(long, value_name = "MODE")]
    pub mode: Option<PayloadMode>,

    /// Declared MIME type (detected from the extension if omitted)
    #[arg(long, value_name = "TYPE")]
    pub mime: Option<String>,

    /// Request timeout in milliseconds
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Relay endpoint URL
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,
}

impl Args {
    /// Applies command line overrides on top of `base`.
    pub fn relay_config(&self, base: RelayConfig) -> RelayConfig {
        let mut config = base;
        if let Some(endpoint) = self.endpoint.as_deref().map(str::trim)
            && !endpoint.is_empty()
        {
            config.endpoint_url = Some(endpoint.to_string());
        }
        if let Some(mode) = self.mode {
            config = config.with_payload_mode(mode);
        }
        if let Some(ms) = self.timeout_ms.filter(|ms| *ms > 0) {
            config = config.with_timeout(Duration::from_millis(ms));
        }
        config
    }
}
