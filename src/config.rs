use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:3000";
pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 15_000;
pub const DEFAULT_DASHBOARD_REFRESH_SECS: u64 = 5 * 60;

/// Runtime configuration. Built once at startup and handed to the backend and
/// state explicitly; nothing reads the environment after that.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// Backend origin without a trailing slash. Admin routes live under `/admin`.
    pub api_url: String,
    pub http_timeout: Duration,
    pub dashboard_refresh: Duration,
    /// Directory that holds local thumbnail previews.
    pub preview_dir: PathBuf,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            http_timeout: Duration::from_millis(DEFAULT_HTTP_TIMEOUT_MS),
            dashboard_refresh: Duration::from_secs(DEFAULT_DASHBOARD_REFRESH_SECS),
            preview_dir: env::temp_dir().join("eduadmind-previews"),
        }
    }
}

impl AdminConfig {
    /// Environment overrides win over the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let api_url = lookup("EDUADMIN_API_URL")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(|v| normalize_base_url(&v))
            .unwrap_or(defaults.api_url);
        let http_timeout = lookup("EDUADMIN_HTTP_TIMEOUT_MS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
            .unwrap_or(defaults.http_timeout);
        let dashboard_refresh = lookup("EDUADMIN_DASHBOARD_REFRESH_SECS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.dashboard_refresh);
        let preview_dir = lookup("EDUADMIN_PREVIEW_DIR")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.preview_dir);

        Self {
            api_url,
            http_timeout,
            dashboard_refresh,
            preview_dir,
        }
    }

    pub fn admin_url(&self, path: &str) -> String {
        format!("{}/admin/{}", self.api_url, path.trim_start_matches('/'))
    }

    /// Absolute URL for an uploaded asset path such as `uploads/boards/x.png`.
    pub fn asset_url(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path.trim_start_matches('/'))
    }
}

fn normalize_base_url(raw: &str) -> String {
    raw.trim_end_matches('/').to_string()
}
