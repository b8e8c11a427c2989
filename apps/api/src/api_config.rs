use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use guestbook_core::AppError;
use guestbook_domain::RetentionMinutes;
use tracing_subscriber::EnvFilter;

const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Where triggered purge jobs are queued and executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurgeDispatchMode {
    /// Jobs go to the PostgreSQL queue and a separate worker drains them.
    Queued,
    /// Jobs go to an in-memory queue drained by a task inside the API.
    InProcess,
}

impl PurgeDispatchMode {
    pub fn parse(value: &str) -> Result<Self, AppError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "queued" => Ok(Self::Queued),
            "in_process" => Ok(Self::InProcess),
            other => Err(AppError::Validation(format!(
                "PURGE_DISPATCH_MODE must be either 'queued' or 'in_process', got '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub migrate_only: bool,
    pub database_url: String,
    pub api_host: String,
    pub api_port: u16,
    pub default_retention: RetentionMinutes,
    pub purge_dispatch_mode: PurgeDispatchMode,
    pub purge_job_max_attempts: u32,
    pub image_storage_dir: PathBuf,
    pub public_base_url: String,
    pub max_upload_bytes: usize,
    pub in_process_worker_poll_interval_ms: u64,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let migrate_only = env::args().nth(1).as_deref() == Some("migrate");

        let database_url = required_env("DATABASE_URL")?;
        let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
        let api_port = env::var("API_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3001);

        let default_retention = match env::var("COMMENTS_RETENTION_MINUTES") {
            Ok(value) => RetentionMinutes::parse(value.as_str()).map_err(|error| {
                AppError::Validation(format!("invalid COMMENTS_RETENTION_MINUTES: {error}"))
            })?,
            Err(_) => RetentionMinutes::new(60)?,
        };

        let purge_dispatch_mode = PurgeDispatchMode::parse(
            env::var("PURGE_DISPATCH_MODE")
                .unwrap_or_else(|_| "queued".to_owned())
                .as_str(),
        )?;
        let purge_job_max_attempts = parse_env_u32("PURGE_JOB_MAX_ATTEMPTS", 5)?;
        if purge_job_max_attempts == 0 {
            return Err(AppError::Validation(
                "PURGE_JOB_MAX_ATTEMPTS must be greater than zero".to_owned(),
            ));
        }

        let image_storage_dir = PathBuf::from(
            env::var("IMAGE_STORAGE_DIR").unwrap_or_else(|_| "./data/images".to_owned()),
        );
        let public_base_url = env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("http://{api_host}:{api_port}"))
            .trim_end_matches('/')
            .to_owned();

        let max_upload_bytes = parse_env_usize("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?;
        if max_upload_bytes == 0 {
            return Err(AppError::Validation(
                "MAX_UPLOAD_BYTES must be greater than zero".to_owned(),
            ));
        }

        let in_process_worker_poll_interval_ms =
            parse_env_u64("IN_PROCESS_WORKER_POLL_INTERVAL_MS", 1000)?;
        if in_process_worker_poll_interval_ms == 0 {
            return Err(AppError::Validation(
                "IN_PROCESS_WORKER_POLL_INTERVAL_MS must be greater than zero".to_owned(),
            ));
        }

        Ok(Self {
            migrate_only,
            database_url,
            api_host,
            api_port,
            default_retention,
            purge_dispatch_mode,
            purge_job_max_attempts,
            image_storage_dir,
            public_base_url,
            max_upload_bytes,
            in_process_worker_poll_interval_ms,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

fn parse_env_usize(name: &str, default: usize) -> Result<usize, AppError> {
    match env::var(name) {
        Ok(value) => value.parse::<usize>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}

fn parse_env_u32(name: &str, default: u32) -> Result<u32, AppError> {
    match env::var(name) {
        Ok(value) => value.parse::<u32>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}

fn parse_env_u64(name: &str, default: u64) -> Result<u64, AppError> {
    match env::var(name) {
        Ok(value) => value.parse::<u64>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}
