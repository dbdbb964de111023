use clap::{Parser, Subcommand, ValueEnum};
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;
use std::time::Duration;
use ushort_core::ShortenPolicy;
use ushort_telemetry::{LogFormat, TelemetryConfig};

pub const LISTEN_ADDR_ENV: &str = "USHORT_LISTEN_ADDR";
pub const PUBLIC_BASE_URL_ENV: &str = "USHORT_PUBLIC_BASE_URL";
pub const STORAGE_BACKEND_ENV: &str = "USHORT_STORAGE_BACKEND";
pub const POSTGRES_DSN_ENV: &str = "USHORT_POSTGRES_DSN";
pub const POSTGRES_MAX_CONNECTIONS_ENV: &str = "USHORT_POSTGRES_MAX_CONNECTIONS";
pub const CACHE_BACKEND_ENV: &str = "USHORT_CACHE_BACKEND";
pub const REDIS_URL_ENV: &str = "USHORT_REDIS_URL";
pub const CACHE_CAPACITY_ENV: &str = "USHORT_CACHE_CAPACITY";
pub const CACHE_TTL_SECS_ENV: &str = "USHORT_CACHE_TTL_SECS";
pub const SHORTEN_POLICY_ENV: &str = "USHORT_SHORTEN_POLICY";
pub const REPAIR_ON_STARTUP_ENV: &str = "USHORT_REPAIR_ON_STARTUP";
pub const LOG_FORMAT_ENV: &str = "USHORT_LOG_FORMAT";
pub const OTLP_ENDPOINT_ENV: &str = "USHORT_OTLP_ENDPOINT";

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_POSTGRES_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_CACHE_CAPACITY: u64 = 10_000;
pub const DEFAULT_BATCH_SIZE: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackendArg {
    #[value(name = "in-memory")]
    InMemory,
    #[value(name = "postgres")]
    Postgres,
}

impl Display for StorageBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendArg::InMemory => write!(f, "in-memory"),
            StorageBackendArg::Postgres => write!(f, "postgres"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CacheBackendArg {
    None,
    Moka,
    Redis,
    Layered,
}

impl Display for CacheBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheBackendArg::None => write!(f, "none"),
            CacheBackendArg::Moka => write!(f, "moka"),
            CacheBackendArg::Redis => write!(f, "redis"),
            CacheBackendArg::Layered => write!(f, "layered"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ShortenPolicyArg {
    Idempotent,
    Strict,
}

impl From<ShortenPolicyArg> for ShortenPolicy {
    fn from(value: ShortenPolicyArg) -> Self {
        match value {
            ShortenPolicyArg::Idempotent => ShortenPolicy::Idempotent,
            ShortenPolicyArg::Strict => ShortenPolicy::Strict,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Text,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(value: LogFormatArg) -> Self {
        match value {
            LogFormatArg::Text => LogFormat::Text,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Serve the HTTP gateway (default).
    Serve,
    /// Give every link left without a token its derived token, then exit.
    Repair {
        #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
        batch_size: usize,
    },
    /// Check that every token encodes its link id, then exit.
    Audit {
        #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
        batch_size: usize,
    },
}

#[derive(Debug, Parser)]
#[command(name = "ushort-gateway", version, about = "URL shortener HTTP gateway")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[arg(long, env = LISTEN_ADDR_ENV, default_value = DEFAULT_LISTEN_ADDR)]
    pub listen_addr: SocketAddr,

    /// Prefix of the short URLs handed out to clients.
    #[arg(long, env = PUBLIC_BASE_URL_ENV, default_value = DEFAULT_PUBLIC_BASE_URL)]
    pub public_base_url: String,

    #[arg(
        long,
        env = STORAGE_BACKEND_ENV,
        value_enum,
        default_value_t = StorageBackendArg::InMemory
    )]
    pub storage: StorageBackendArg,

    #[arg(long, env = POSTGRES_DSN_ENV, required_if_eq("storage", "postgres"))]
    pub postgres_dsn: Option<String>,

    #[arg(
        long,
        env = POSTGRES_MAX_CONNECTIONS_ENV,
        default_value_t = DEFAULT_POSTGRES_MAX_CONNECTIONS
    )]
    pub postgres_max_connections: u32,

    #[arg(
        long,
        env = CACHE_BACKEND_ENV,
        value_enum,
        default_value_t = CacheBackendArg::Moka
    )]
    pub cache: CacheBackendArg,

    #[arg(
        long,
        env = REDIS_URL_ENV,
        required_if_eq_any([("cache", "redis"), ("cache", "layered")])
    )]
    pub redis_url: Option<String>,

    /// Maximum number of links held by the in-process cache.
    #[arg(long, env = CACHE_CAPACITY_ENV, default_value_t = DEFAULT_CACHE_CAPACITY)]
    pub cache_capacity: u64,

    #[arg(long, env = CACHE_TTL_SECS_ENV)]
    pub cache_ttl_secs: Option<u64>,

    #[arg(
        long,
        env = SHORTEN_POLICY_ENV,
        value_enum,
        default_value_t = ShortenPolicyArg::Idempotent
    )]
    pub shorten_policy: ShortenPolicyArg,

    #[arg(
        long,
        env = REPAIR_ON_STARTUP_ENV,
        default_value_t = true,
        action = clap::ArgAction::Set
    )]
    pub repair_on_startup: bool,

    #[arg(long, env = LOG_FORMAT_ENV, value_enum, default_value_t = LogFormatArg::Text)]
    pub log_format: LogFormatArg,

    #[arg(long, env = OTLP_ENDPOINT_ENV)]
    pub otlp_endpoint: Option<String>,
}

impl Cli {
    pub fn action(&self) -> Command {
        self.command.unwrap_or(Command::Serve)
    }

    pub fn cache_ttl(&self) -> Option<Duration> {
        self.cache_ttl_secs.map(Duration::from_secs)
    }

    pub fn telemetry_config(&self) -> TelemetryConfig {
        TelemetryConfig::builder()
            .service_name("ushort-gateway")
            .log_format(self.log_format.into())
            .otlp_endpoint(self.otlp_endpoint.clone())
            .build()
    }
}
