use std::collections::HashMap;
use std::fs;
use std::time::Duration;

const DEFAULT_ICE_SERVER: &str = "stun:stun.l.google.com:19302";
const DEFAULT_STALL_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_LOG_QUEUE_CAP: usize = 4_096;
const DEFAULT_CONSOLE_CAP: usize = 256;
const DEFAULT_CONSOLE_SAMPLE_EVERY: u32 = 1;

/// INI-style configuration: `[Section]` headers, `key = value` pairs, `#`
/// comments. Keys before the first header are globals.
#[derive(Debug)]
pub struct Config {
    pub globals: HashMap<String, String>,
    pub sections: HashMap<String, HashMap<String, String>>,
}

impl Config {
    pub fn load(path: &str) -> Result<Self, String> {
        let content =
            fs::read_to_string(path).map_err(|e| format!("Error reading file {path}: {e}"))?;
        Ok(Self::parse(&content))
    }

    #[must_use]
    pub fn parse(content: &str) -> Self {
        let mut globals = HashMap::new();
        let mut sections: HashMap<String, HashMap<String, String>> = HashMap::new();
        let mut current_section: Option<String> = None;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                current_section = Some(name.trim().to_string());
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim().to_string();
                let value = value.trim().trim_matches('"').to_string();

                match &current_section {
                    None => {
                        globals.insert(key, value);
                    }
                    Some(sec) => {
                        sections.entry(sec.clone()).or_default().insert(key, value);
                    }
                }
            }
        }
        Config { globals, sections }
    }

    pub fn empty() -> Self {
        Self {
            globals: HashMap::new(),
            sections: HashMap::new(),
        }
    }

    #[must_use]
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|sec| sec.get(key))
            .map(|s| s.as_str())
    }

    #[must_use]
    pub fn get_non_empty(&self, section: &str, key: &str) -> Option<&str> {
        self.get(section, key).filter(|s| !s.is_empty())
    }

    #[must_use]
    pub fn get_global(&self, key: &str) -> Option<&str> {
        self.globals.get(key).map(|s| s.as_str())
    }

    #[must_use]
    pub fn get_or_default<'a>(&'a self, section: &str, key: &str, default: &'a str) -> &'a str {
        self.get(section, key)
            .or_else(|| self.get_global(key))
            .unwrap_or(default)
    }

    /// Parses a section value, falling back to `default` when the key is
    /// missing or does not parse.
    #[must_use]
    pub fn get_parsed_or<T: std::str::FromStr>(&self, section: &str, key: &str, default: T) -> T {
        self.get_non_empty(section, key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }
}

/// `[Logging]` section.
#[derive(Debug, Clone)]
pub struct LogSettings {
    pub log_path: Option<String>,
    pub log_filename: Option<String>,
    pub queue_capacity: usize,
    pub console_capacity: usize,
    pub console_sample_every: u32,
}

/// Typed view over the sections the handshake binary and library read.
#[derive(Debug, Clone)]
pub struct HandshakeSettings {
    /// STUN/TURN URLs handed to the engine; the core itself never dials them.
    pub ice_servers: Vec<String>,
    /// Advisory stall threshold for the connection monitor.
    pub stall_timeout: Duration,
    pub logging: LogSettings,
}

impl HandshakeSettings {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let ice_servers: Vec<String> = config
            .get_or_default("Negotiation", "ice_servers", DEFAULT_ICE_SERVER)
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .collect();

        let stall_ms = config.get_parsed_or("Monitor", "stall_timeout_ms", DEFAULT_STALL_TIMEOUT_MS);

        let logging = LogSettings {
            log_path: config.get_non_empty("Logging", "log_path").map(str::to_owned),
            log_filename: config
                .get_non_empty("Logging", "log_filename")
                .map(str::to_owned),
            queue_capacity: config.get_parsed_or("Logging", "queue_capacity", DEFAULT_LOG_QUEUE_CAP),
            console_capacity: config.get_parsed_or("Logging", "console_capacity", DEFAULT_CONSOLE_CAP),
            console_sample_every: config.get_parsed_or(
                "Logging",
                "console_sample_every",
                DEFAULT_CONSOLE_SAMPLE_EVERY,
            ),
        };

        Self {
            ice_servers,
            stall_timeout: Duration::from_millis(stall_ms),
            logging,
        }
    }
}

impl Default for HandshakeSettings {
    fn default() -> Self {
        Self::from_config(&Config::empty())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    const SAMPLE: &str = r#"
# handshake demo
log_filename = "global-name"

[Negotiation]
ice_servers = stun:stun.example.org:3478, turn:turn.example.org:3478

[Monitor]
stall_timeout_ms = 2500

[Logging]
log_path = /tmp/handshake
console_sample_every = nope
"#;

    #[test]
    fn parses_sections_and_globals() {
        let cfg = Config::parse(SAMPLE);
        assert_eq!(cfg.get_global("log_filename"), Some("global-name"));
        assert_eq!(cfg.get("Monitor", "stall_timeout_ms"), Some("2500"));
        assert_eq!(cfg.get("Monitor", "missing"), None);
    }

    #[test]
    fn settings_read_typed_values_with_fallbacks() {
        let settings = HandshakeSettings::from_config(&Config::parse(SAMPLE));
        assert_eq!(
            settings.ice_servers,
            vec!["stun:stun.example.org:3478", "turn:turn.example.org:3478"]
        );
        assert_eq!(settings.stall_timeout, Duration::from_millis(2500));
        assert_eq!(settings.logging.log_path.as_deref(), Some("/tmp/handshake"));
        // Unparseable value falls back to the default.
        assert_eq!(settings.logging.console_sample_every, DEFAULT_CONSOLE_SAMPLE_EVERY);
    }

    #[test]
    fn empty_config_uses_public_stun_server() {
        let settings = HandshakeSettings::default();
        assert_eq!(settings.ice_servers, vec![DEFAULT_ICE_SERVER]);
        assert_eq!(settings.stall_timeout, Duration::from_millis(DEFAULT_STALL_TIMEOUT_MS));
        assert!(settings.logging.log_path.is_none());
    }
}
