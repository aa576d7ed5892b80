// # supsync - Suppression-List Sync Runner
//
// Thin integration layer only:
// 1. Reading configuration from environment variables
// 2. Initializing tracing and the runtime
// 3. Wiring the Brevo source, the CSV table store and the engine
// 4. Running one sync pass and reporting the outcome
//
// All sync logic lives in supsync-core; the Brevo specifics live in
// supsync-provider-brevo. Configuration is via environment variables
// ONLY.
//
// ## Configuration
//
// ### Credentials (one of the two blocks)
// - `SUPSYNC_API_TOKEN`: Brevo API key
// - `SUPSYNC_OAUTH_CLIENT_ID` / `SUPSYNC_OAUTH_CLIENT_SECRET` /
//   `SUPSYNC_OAUTH_REFRESH_TOKEN` / `SUPSYNC_OAUTH_TOKEN_URL`:
//   OAuth refresh-token credentials
//
// ### Streams
// - `SUPSYNC_TRANSACTIONAL`: fetch blocked transactional contacts (true/false)
// - `SUPSYNC_MARKETING`: fetch marketing contacts (true/false)
// - `SUPSYNC_START_DATE` / `SUPSYNC_END_DATE`: optional YYYY-MM-DD bounds
//
// ### Output
// - `SUPSYNC_OUTPUT_DIR`: output directory (default: data/out/tables)
//
// ### Tuning
// - `SUPSYNC_MAX_ATTEMPTS`: fetch attempts including the first (default: 3)
// - `SUPSYNC_RETRY_BASE_DELAY_MS`: backoff base delay (default: 1000)
// - `SUPSYNC_MARKETING_CAP`: marketing record cap (default: 30000)
// - `SUPSYNC_TRANSACTIONAL_CAP`: transactional record cap (default: unbounded)
// - `SUPSYNC_RETENTION_FLOOR`: merge safety floor (default: 0.9)
// - `SUPSYNC_LOG_LEVEL`: trace/debug/info/warn/error (default: info)
//
// ## Example
//
// ```bash
// export SUPSYNC_API_TOKEN=xkeysib-...
// export SUPSYNC_TRANSACTIONAL=true
// export SUPSYNC_MARKETING=true
// export SUPSYNC_OUTPUT_DIR=data/out/tables
//
// supsync
// ```

use anyhow::Result;
use chrono::NaiveDate;
use std::env;
use std::process::ExitCode;
use std::sync::Arc;
use supsync_core::config::{AuthConfig, DateRange, SyncConfig};
use supsync_core::engine::{SyncEngine, SyncReport};
use supsync_core::store::CsvTableStore;
use supsync_core::traits::{AccessTokenProvider, StaticTokenProvider};
use supsync_provider_brevo::{BrevoClient, BrevoConfig, OAuthTokenProvider};
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for different termination scenarios
///
/// - 0: Sync completed
/// - 1: Configuration or credential error (operator must act)
/// - 2: Runtime error (unexpected, worth retrying the run)
#[derive(Debug, Clone, Copy)]
enum SupsyncExitCode {
    Success = 0,
    UserError = 1,
    RuntimeError = 2,
}

impl From<SupsyncExitCode> for ExitCode {
    fn from(code: SupsyncExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
struct Config {
    api_token: Option<String>,
    oauth_client_id: Option<String>,
    oauth_client_secret: Option<String>,
    oauth_refresh_token: Option<String>,
    oauth_token_url: Option<String>,
    transactional: bool,
    marketing: bool,
    start_date: Option<String>,
    end_date: Option<String>,
    output_dir: Option<String>,
    max_attempts: Option<u32>,
    retry_base_delay_ms: Option<u64>,
    marketing_cap: Option<usize>,
    transactional_cap: Option<usize>,
    retention_floor: Option<f64>,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Ok(Self {
            api_token: env::var("SUPSYNC_API_TOKEN").ok(),
            oauth_client_id: env::var("SUPSYNC_OAUTH_CLIENT_ID").ok(),
            oauth_client_secret: env::var("SUPSYNC_OAUTH_CLIENT_SECRET").ok(),
            oauth_refresh_token: env::var("SUPSYNC_OAUTH_REFRESH_TOKEN").ok(),
            oauth_token_url: env::var("SUPSYNC_OAUTH_TOKEN_URL").ok(),
            transactional: parse_bool_var("SUPSYNC_TRANSACTIONAL")?,
            marketing: parse_bool_var("SUPSYNC_MARKETING")?,
            start_date: env::var("SUPSYNC_START_DATE").ok(),
            end_date: env::var("SUPSYNC_END_DATE").ok(),
            output_dir: env::var("SUPSYNC_OUTPUT_DIR").ok(),
            max_attempts: parse_num_var("SUPSYNC_MAX_ATTEMPTS")?,
            retry_base_delay_ms: parse_num_var("SUPSYNC_RETRY_BASE_DELAY_MS")?,
            marketing_cap: parse_num_var("SUPSYNC_MARKETING_CAP")?,
            transactional_cap: parse_num_var("SUPSYNC_TRANSACTIONAL_CAP")?,
            retention_floor: parse_num_var("SUPSYNC_RETENTION_FLOOR")?,
            log_level: env::var("SUPSYNC_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Validate the configuration
    ///
    /// This performs comprehensive validation including:
    /// - Credential presence (API token or a complete OAuth block)
    /// - Placeholder-token detection (common copy-paste mistake)
    /// - Date format validation
    /// - Numeric range validation
    fn validate(&self) -> Result<()> {
        let has_token = self.api_token.as_ref().is_some_and(|t| !t.is_empty());
        let has_oauth = self.oauth_client_id.is_some()
            || self.oauth_client_secret.is_some()
            || self.oauth_refresh_token.is_some()
            || self.oauth_token_url.is_some();

        if !has_token && !has_oauth {
            anyhow::bail!(
                "Credentials are required. \
                Set SUPSYNC_API_TOKEN or the SUPSYNC_OAUTH_* variables."
            );
        }

        if let Some(ref token) = self.api_token {
            if token.is_empty() {
                anyhow::bail!("SUPSYNC_API_TOKEN cannot be empty");
            }

            // Check for obvious placeholder tokens (common mistake)
            let token_lower = token.to_lowercase();
            if token_lower.contains("your_token")
                || token_lower.contains("replace_me")
                || token_lower.contains("example")
                || token_lower == "token"
            {
                anyhow::bail!(
                    "SUPSYNC_API_TOKEN appears to be a placeholder. \
                    Use an actual Brevo API key."
                );
            }
        }

        if has_oauth
            && (self.oauth_client_id.as_ref().is_none_or(|v| v.is_empty())
                || self.oauth_client_secret.as_ref().is_none_or(|v| v.is_empty())
                || self.oauth_refresh_token.as_ref().is_none_or(|v| v.is_empty())
                || self.oauth_token_url.as_ref().is_none_or(|v| v.is_empty()))
        {
            anyhow::bail!(
                "Incomplete OAuth credentials. All of SUPSYNC_OAUTH_CLIENT_ID, \
                SUPSYNC_OAUTH_CLIENT_SECRET, SUPSYNC_OAUTH_REFRESH_TOKEN and \
                SUPSYNC_OAUTH_TOKEN_URL are required."
            );
        }

        if !self.transactional && !self.marketing {
            anyhow::bail!(
                "No stream enabled. \
                Set SUPSYNC_TRANSACTIONAL=true and/or SUPSYNC_MARKETING=true."
            );
        }

        for (name, value) in [
            ("SUPSYNC_START_DATE", &self.start_date),
            ("SUPSYNC_END_DATE", &self.end_date),
        ] {
            if let Some(value) = value
                && NaiveDate::parse_from_str(value, "%Y-%m-%d").is_err()
            {
                anyhow::bail!("{} must be a YYYY-MM-DD date. Got: {}", name, value);
            }
        }

        if let Some(max_attempts) = self.max_attempts
            && !(1..=10).contains(&max_attempts)
        {
            anyhow::bail!(
                "SUPSYNC_MAX_ATTEMPTS must be between 1 and 10. Got: {}",
                max_attempts
            );
        }

        for (name, cap) in [
            ("SUPSYNC_MARKETING_CAP", self.marketing_cap),
            ("SUPSYNC_TRANSACTIONAL_CAP", self.transactional_cap),
        ] {
            if cap == Some(0) {
                anyhow::bail!("{} must be at least 1", name);
            }
        }

        if let Some(floor) = self.retention_floor
            && !(floor > 0.0 && floor <= 1.0)
        {
            anyhow::bail!(
                "SUPSYNC_RETENTION_FLOOR must be in (0, 1]. Got: {}",
                floor
            );
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "SUPSYNC_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }

    /// Build the engine configuration
    ///
    /// `validate()` must have passed; dates parse cleanly here.
    fn sync_config(&self) -> SyncConfig {
        let auth = if let Some(ref token) = self.api_token {
            AuthConfig::ApiKey {
                api_token: token.clone(),
            }
        } else {
            AuthConfig::OAuth {
                client_id: self.oauth_client_id.clone().unwrap_or_default(),
                client_secret: self.oauth_client_secret.clone().unwrap_or_default(),
                refresh_token: self.oauth_refresh_token.clone().unwrap_or_default(),
                token_url: self.oauth_token_url.clone().unwrap_or_default(),
            }
        };

        let mut config = SyncConfig::new(auth);
        config.transactional = self.transactional;
        config.marketing = self.marketing;
        config.date_range = DateRange {
            start: self
                .start_date
                .as_deref()
                .and_then(|v| NaiveDate::parse_from_str(v, "%Y-%m-%d").ok()),
            end: self
                .end_date
                .as_deref()
                .and_then(|v| NaiveDate::parse_from_str(v, "%Y-%m-%d").ok()),
        };
        if let Some(ref dir) = self.output_dir {
            config.output_dir = dir.into();
        }
        if let Some(max_attempts) = self.max_attempts {
            config.retry.max_attempts = max_attempts;
        }
        if let Some(delay) = self.retry_base_delay_ms {
            config.retry.base_delay_ms = delay;
        }
        if let Some(floor) = self.retention_floor {
            config.retention_floor = floor;
        }
        config
    }
}

/// Parse an optional boolean environment variable
///
/// Accepts true/false, 1/0, yes/no (case-insensitive); unset is false.
fn parse_bool_var(name: &str) -> Result<bool> {
    match env::var(name) {
        Err(_) => Ok(false),
        Ok(value) => match value.to_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" | "" => Ok(false),
            other => anyhow::bail!("{} must be a boolean. Got: {}", name, other),
        },
    }
}

/// Parse an optional numeric environment variable
fn parse_num_var<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match env::var(name) {
        Err(_) => Ok(None),
        Ok(value) => value
            .parse()
            .map(Some)
            .map_err(|_| anyhow::anyhow!("{} must be a number. Got: {}", name, value)),
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return SupsyncExitCode::UserError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return SupsyncExitCode::UserError.into();
    }

    // Initialize tracing
    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return SupsyncExitCode::UserError.into();
    }

    info!("Starting supsync");

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return SupsyncExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        match run_sync(config).await {
            Ok(report) => {
                log_report(&report);
                SupsyncExitCode::Success
            }
            Err(e @ (supsync_core::Error::Authentication(_) | supsync_core::Error::Config(_))) => {
                error!("Sync failed: {}", e);
                SupsyncExitCode::UserError
            }
            Err(e) => {
                error!("Sync failed: {}", e);
                SupsyncExitCode::RuntimeError
            }
        }
    })
    .into()
}

/// Wire the components and run one sync pass
async fn run_sync(config: Config) -> supsync_core::Result<SyncReport> {
    let sync_config = config.sync_config();

    let token_provider: Arc<dyn AccessTokenProvider> = match &sync_config.auth {
        AuthConfig::ApiKey { api_token } => Arc::new(StaticTokenProvider::new(api_token)?),
        AuthConfig::OAuth {
            client_id,
            client_secret,
            refresh_token,
            token_url,
        } => Arc::new(OAuthTokenProvider::new(
            token_url,
            client_id,
            client_secret,
            refresh_token,
        )?),
    };

    let mut brevo_config = BrevoConfig::default();
    if let Some(cap) = config.marketing_cap {
        brevo_config.marketing_cap = cap;
    }
    brevo_config.transactional_cap = config.transactional_cap;
    let source = BrevoClient::new(brevo_config, token_provider)?;

    let store = CsvTableStore::new(&sync_config.output_dir).await?;

    let engine = SyncEngine::new(Box::new(source), Box::new(store), sync_config)?;
    engine.run().await
}

/// Log the per-stream outcomes of a finished run
fn log_report(report: &SyncReport) {
    for (name, stream) in [
        ("transactional", &report.transactional),
        ("marketing", &report.marketing),
    ] {
        if let Some(stream) = stream {
            info!(
                stream = name,
                fetched = stream.fetched,
                truncated = stream.truncated,
                rows_written = stream.rows_written,
                decision = ?stream.decision,
                "stream synced"
            );
        }
    }
    info!("Sync completed");
}
