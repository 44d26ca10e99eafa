use std::time::Duration;

/// Port the server listens on when `OLLAMA_HOST` names only a host.
pub const DEFAULT_PORT: u16 = 11434;

pub const DEFAULT_HOST: &str = "http://127.0.0.1:11434";

/// Capacity of the channel between the pull stream and the progress notifier.
const DEFAULT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the server, scheme and port included, no trailing slash.
    pub host: String,
    pub connect_timeout: Duration,
    pub channel_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            connect_timeout: Duration::from_secs(10),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl Config {
    /// Reads `OLLAMA_HOST`, falling back to the local default.
    pub fn from_env() -> Self {
        match std::env::var("OLLAMA_HOST") {
            Ok(raw) if !raw.trim().is_empty() => Self::default().with_host(&raw),
            _ => Self::default(),
        }
    }

    pub fn with_host(mut self, raw: &str) -> Self {
        self.host = normalize_host(raw);
        self
    }

    /// Joins an API path such as `/api/pull` onto the host.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.host, path)
    }
}

/// Turns the loose forms accepted in `OLLAMA_HOST` (`localhost`,
/// `0.0.0.0:11434`, `https://box.lan/`) into a base URL.
pub fn normalize_host(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');

    // An explicit scheme keeps its protocol port; a bare host gets the server's.
    let (scheme, rest, default_port) = match trimmed.split_once("://") {
        Some((scheme, rest)) => {
            let scheme = scheme.to_ascii_lowercase();
            let port = match scheme.as_str() {
                "https" => 443,
                "http" => 80,
                _ => DEFAULT_PORT,
            };
            (scheme, rest, port)
        }
        None => ("http".to_string(), trimmed, DEFAULT_PORT),
    };

    let (authority, path) = match rest.find('/') {
        Some(idx) => (&rest[..idx], &rest[idx..]),
        None => (rest, ""),
    };
    let authority = if authority.is_empty() { "127.0.0.1" } else { authority };

    // Bracketed IPv6 literals carry colons of their own.
    let has_port = match authority.rfind(']') {
        Some(end) => authority[end..].contains(':'),
        None => authority.contains(':'),
    };

    if has_port {
        format!("{}://{}{}", scheme, authority, path)
    } else {
        format!("{}://{}:{}{}", scheme, authority, default_port, path)
    }
}
