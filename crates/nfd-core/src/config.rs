use std::{
    env, fmt, fs,
    net::SocketAddr,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{domain::ChatId, errors::Error, Result};

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8787";
pub const DEFAULT_WEBHOOK_PATH: &str = "/endpoint";
pub const DEFAULT_STORE_PATH: &str = "nfd-store.json";
pub const DEFAULT_NOTIFY_INTERVAL: Duration = Duration::from_millis(3600 * 1000);

pub const DEFAULT_FRAUD_DB_URL: &str =
    "https://raw.githubusercontent.com/LloydAsp/nfd/main/data/fraud.db";
pub const DEFAULT_NOTIFICATION_URL: &str =
    "https://raw.githubusercontent.com/LloydAsp/nfd/main/data/notification.txt";
pub const DEFAULT_START_MESSAGE_URL: &str =
    "https://raw.githubusercontent.com/a153315062/nfd/refs/heads/main/data/startMessage.md";

/// Where the three remote text documents live.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentUrls {
    pub start_message: String,
    pub notification: String,
    pub fraud_db: String,
}

impl Default for DocumentUrls {
    fn default() -> Self {
        Self {
            start_message: DEFAULT_START_MESSAGE_URL.to_string(),
            notification: DEFAULT_NOTIFICATION_URL.to_string(),
            fraud_db: DEFAULT_FRAUD_DB_URL.to_string(),
        }
    }
}

/// Typed configuration for one relay instance.
///
/// Built once at startup and handed to the router and the gateway as an
/// `Arc<Config>`; nothing reads the environment after that.
#[derive(Clone)]
pub struct Config {
    // Required
    pub bot_token: String,
    pub bot_secret: String,
    pub admin_chat_id: ChatId,

    // HTTP
    pub listen_addr: SocketAddr,
    pub webhook_path: String,
    pub public_url: Option<String>,

    // Storage
    pub store_path: PathBuf,

    // Notifications
    pub notify_interval: Duration,
    pub enable_notification: bool,

    pub documents: DocumentUrls,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bot_token", &"<redacted>")
            .field("bot_secret", &"<redacted>")
            .field("admin_chat_id", &self.admin_chat_id)
            .field("listen_addr", &self.listen_addr)
            .field("webhook_path", &self.webhook_path)
            .field("public_url", &self.public_url)
            .field("store_path", &self.store_path)
            .field("notify_interval", &self.notify_interval)
            .field("enable_notification", &self.enable_notification)
            .field("documents", &self.documents)
            .finish()
    }
}

impl Config {
    /// Load from the process environment, after merging a `.env` file in the
    /// working directory (existing variables win).
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let bot_token = required(&lookup, "ENV_BOT_TOKEN")?;
        let bot_secret = required(&lookup, "ENV_BOT_SECRET")?;
        let admin_raw = required(&lookup, "ENV_ADMIN_UID")?;
        let admin_chat_id = admin_raw
            .trim()
            .parse::<i64>()
            .map(ChatId)
            .map_err(|_| Error::Config(format!("ENV_ADMIN_UID is not a chat id: {admin_raw}")))?;

        let listen_addr = listen_addr(&lookup)?;

        let webhook_path = lookup("NFD_WEBHOOK_PATH")
            .and_then(non_empty)
            .unwrap_or_else(|| DEFAULT_WEBHOOK_PATH.to_string());
        if !webhook_path.starts_with('/') {
            return Err(Error::Config(format!(
                "NFD_WEBHOOK_PATH must start with '/': {webhook_path}"
            )));
        }
        let public_url = lookup("NFD_PUBLIC_URL")
            .and_then(non_empty)
            .map(|u| u.trim_end_matches('/').to_string());

        let store_path = PathBuf::from(
            lookup("NFD_STORE_PATH")
                .and_then(non_empty)
                .unwrap_or_else(|| DEFAULT_STORE_PATH.to_string()),
        );

        let notify_interval = match lookup("NFD_NOTIFY_INTERVAL_MS").and_then(non_empty) {
            Some(raw) => Duration::from_millis(raw.trim().parse::<u64>().map_err(|_| {
                Error::Config(format!("NFD_NOTIFY_INTERVAL_MS is not a number: {raw}"))
            })?),
            None => DEFAULT_NOTIFY_INTERVAL,
        };
        let enable_notification = lookup("NFD_ENABLE_NOTIFICATION")
            .map(|s| parse_bool(&s))
            .unwrap_or(true);

        let defaults = DocumentUrls::default();
        let documents = DocumentUrls {
            start_message: lookup("NFD_START_MESSAGE_URL")
                .and_then(non_empty)
                .unwrap_or(defaults.start_message),
            notification: lookup("NFD_NOTIFICATION_URL")
                .and_then(non_empty)
                .unwrap_or(defaults.notification),
            fraud_db: lookup("NFD_FRAUD_DB_URL")
                .and_then(non_empty)
                .unwrap_or(defaults.fraud_db),
        };

        Ok(Self {
            bot_token,
            bot_secret,
            admin_chat_id,
            listen_addr,
            webhook_path,
            public_url,
            store_path,
            notify_interval,
            enable_notification,
            documents,
        })
    }
}

/// Listen address on its own, so an unconfigured instance can still bind and
/// report what is missing.
pub fn listen_addr(lookup: impl Fn(&str) -> Option<String>) -> Result<SocketAddr> {
    let raw = lookup("NFD_LISTEN_ADDR")
        .and_then(non_empty)
        .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());
    raw.trim()
        .parse::<SocketAddr>()
        .map_err(|_| Error::Config(format!("NFD_LISTEN_ADDR is not a socket address: {raw}")))
}

fn required(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String> {
    lookup(key)
        .and_then(non_empty)
        .ok_or_else(|| Error::Config(format!("{key} environment variable is required")))
}

pub fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        env::set_var(key, unquote(v.trim()));
    }
}

fn unquote(val: &str) -> &str {
    if val.len() >= 2
        && ((val.starts_with('"') && val.ends_with('"'))
            || (val.starts_with('\'') && val.ends_with('\'')))
    {
        &val[1..val.len() - 1]
    } else {
        val
    }
}

fn parse_bool(s: &str) -> bool {
    matches!(
        s.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("ENV_BOT_TOKEN", "123:abc"),
        ("ENV_BOT_SECRET", "s3cret"),
        ("ENV_ADMIN_UID", "777"),
    ];

    #[test]
    fn required_values_and_defaults() {
        let cfg = Config::from_lookup(lookup_from(&REQUIRED)).unwrap();
        assert_eq!(cfg.bot_token, "123:abc");
        assert_eq!(cfg.bot_secret, "s3cret");
        assert_eq!(cfg.admin_chat_id, ChatId(777));
        assert_eq!(cfg.webhook_path, DEFAULT_WEBHOOK_PATH);
        assert_eq!(cfg.notify_interval, Duration::from_millis(3_600_000));
        assert!(cfg.enable_notification);
        assert_eq!(cfg.documents, DocumentUrls::default());
        assert_eq!(cfg.listen_addr.port(), 8787);
        assert!(cfg.public_url.is_none());
    }

    #[test]
    fn each_required_value_is_checked() {
        for missing in ["ENV_BOT_TOKEN", "ENV_BOT_SECRET", "ENV_ADMIN_UID"] {
            let pairs: Vec<(&str, &str)> = REQUIRED
                .iter()
                .copied()
                .filter(|(k, _)| *k != missing)
                .collect();
            let err = Config::from_lookup(lookup_from(&pairs)).unwrap_err();
            assert!(err.to_string().contains(missing), "{err}");
        }
    }

    #[test]
    fn blank_required_value_counts_as_missing() {
        let err = Config::from_lookup(lookup_from(&[
            ("ENV_BOT_TOKEN", "  "),
            ("ENV_BOT_SECRET", "s"),
            ("ENV_ADMIN_UID", "1"),
        ]))
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn admin_uid_must_be_numeric() {
        let err = Config::from_lookup(lookup_from(&[
            ("ENV_BOT_TOKEN", "t"),
            ("ENV_BOT_SECRET", "s"),
            ("ENV_ADMIN_UID", "admin"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("ENV_ADMIN_UID"));
    }

    #[test]
    fn optional_overrides() {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend([
            ("NFD_WEBHOOK_PATH", "/hook"),
            ("NFD_PUBLIC_URL", "https://relay.example.com/"),
            ("NFD_NOTIFY_INTERVAL_MS", "1000"),
            ("NFD_ENABLE_NOTIFICATION", "off"),
            ("NFD_LISTEN_ADDR", "127.0.0.1:9000"),
            ("NFD_FRAUD_DB_URL", "http://localhost/fraud.db"),
        ]);
        let cfg = Config::from_lookup(lookup_from(&pairs)).unwrap();
        assert_eq!(cfg.webhook_path, "/hook");
        assert_eq!(cfg.public_url.as_deref(), Some("https://relay.example.com"));
        assert_eq!(cfg.notify_interval, Duration::from_secs(1));
        assert!(!cfg.enable_notification);
        assert_eq!(cfg.listen_addr, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(cfg.documents.fraud_db, "http://localhost/fraud.db");
        assert_eq!(cfg.documents.notification, DEFAULT_NOTIFICATION_URL);
    }

    #[test]
    fn webhook_path_must_be_absolute() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("NFD_WEBHOOK_PATH", "endpoint"));
        assert!(Config::from_lookup(lookup_from(&pairs)).is_err());
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let cfg = Config::from_lookup(lookup_from(&REQUIRED)).unwrap();
        let dbg = format!("{cfg:?}");
        assert!(!dbg.contains("123:abc"));
        assert!(!dbg.contains("s3cret"));
    }

    #[test]
    fn unquote_strips_matching_quotes_only() {
        assert_eq!(unquote("\"abc\""), "abc");
        assert_eq!(unquote("'abc'"), "abc");
        assert_eq!(unquote("\"abc'"), "\"abc'");
        assert_eq!(unquote("abc"), "abc");
    }
}
