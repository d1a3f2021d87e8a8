use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Where to send and how chatty to be. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeSettings {
    pub host: String,
    pub port: u16,
    pub logging: bool,
    pub verbose: bool,
    pub poll_ms: u64,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7777,
            logging: true,
            verbose: false,
            poll_ms: 10,
        }
    }
}

impl BridgeSettings {
    /// `host:port`, bracketing IPv6 literals.
    pub fn target(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.poll_ms == 0 {
            bail!("poll_ms must be at least 1");
        }
        Ok(())
    }

    /// Apply positional arguments: `<port>` or `<host> <port>`.
    pub fn apply_target(&mut self, args: &[String]) -> anyhow::Result<()> {
        match args {
            [] => {}
            [port] => self.port = parse_port(port)?,
            [host, port] => {
                self.host = host.clone();
                self.port = parse_port(port)?;
            }
            _ => bail!(
                "strange number of non-option arguments: {} (expected [host] [port])",
                args.len()
            ),
        }
        Ok(())
    }
}

fn parse_port(raw: &str) -> anyhow::Result<u16> {
    raw.parse::<u16>()
        .with_context(|| format!("invalid port: {raw}"))
}

pub fn parse_settings(raw: &str) -> anyhow::Result<BridgeSettings> {
    if raw.trim().is_empty() {
        return Ok(BridgeSettings::default());
    }
    let settings: BridgeSettings = serde_yaml::from_str(raw).context("decoding settings")?;
    settings.validate()?;
    Ok(settings)
}

pub fn load_settings_file(path: impl AsRef<Path>) -> anyhow::Result<BridgeSettings> {
    let path = path.as_ref();
    let raw =
        fs::read_to_string(path).with_context(|| format!("reading settings: {}", path.display()))?;
    parse_settings(&raw).with_context(|| format!("parsing yaml: {}", path.display()))
}
