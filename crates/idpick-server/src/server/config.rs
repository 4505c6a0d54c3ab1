use anyhow::bail;
use clap::Parser;
use core::time::Duration;
use idpick_core::{DEFAULT_MAX_ID, DEFAULT_PAGE_SIZE, Id, MAX_ID_LIMIT};

/// Runtime configuration for the `idpick-server` binary.
///
/// All values are parsed from CLI arguments or environment variables (a `.env`
/// file is loaded first), with defaults matching the reference deployment of
/// one million dense identifiers.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "idpick-server",
    version,
    about = "An HTTP service for paging and ordering a large identifier selection"
)]
pub struct CliArgs {
    /// Upper bound of the dense identifier range `[1, max_id]`.
    ///
    /// Identifiers above this value can still be admitted at runtime as
    /// extras. Must not exceed 2^53 - 1.
    ///
    /// Environment variable: `MAX_ID`
    #[arg(long, env = "MAX_ID", default_value_t = DEFAULT_MAX_ID)]
    pub max_id: Id,

    /// Page size used when a request omits `limit` or sends a non-numeric one.
    ///
    /// Environment variable: `DEFAULT_PAGE_SIZE`
    #[arg(long, env = "DEFAULT_PAGE_SIZE", default_value_t = DEFAULT_PAGE_SIZE)]
    pub default_page_size: usize,

    /// Largest `limit` honored for a single unselected page. Larger requests
    /// are clamped.
    ///
    /// Environment variable: `MAX_PAGE_SIZE`
    #[arg(long, env = "MAX_PAGE_SIZE", default_value_t = 10_000)]
    pub max_page_size: usize,

    /// Seconds to wait for in-flight requests after a shutdown signal.
    ///
    /// Environment variable: `SHUTDOWN_TIMEOUT`
    #[arg(long, env = "SHUTDOWN_TIMEOUT", default_value_t = 5)]
    pub shutdown_timeout: u64,

    /// TCP address to listen on.
    ///
    /// Example: "0.0.0.0:3001"
    ///
    /// Environment variable: `SERVER_ADDR`
    #[arg(long, env = "SERVER_ADDR", default_value_t = String::from("0.0.0.0:3001"))]
    pub server_addr: String,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub max_id: Id,
    pub default_page_size: usize,
    pub max_page_size: usize,
    pub shutdown_timeout: Duration,
    pub server_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_id: DEFAULT_MAX_ID,
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: 10_000,
            shutdown_timeout: Duration::from_secs(5),
            server_addr: String::from("0.0.0.0:3001"),
        }
    }
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.max_id > MAX_ID_LIMIT {
            bail!(
                "MAX_ID ({}) exceeds the largest representable identifier ({})",
                args.max_id,
                MAX_ID_LIMIT
            );
        }

        if args.default_page_size == 0 {
            bail!("DEFAULT_PAGE_SIZE must be greater than 0");
        }

        if args.max_page_size < args.default_page_size {
            bail!(
                "MAX_PAGE_SIZE ({}) must be at least DEFAULT_PAGE_SIZE ({})",
                args.max_page_size,
                args.default_page_size
            );
        }

        Ok(Self {
            max_id: args.max_id,
            default_page_size: args.default_page_size,
            max_page_size: args.max_page_size,
            shutdown_timeout: Duration::from_secs(args.shutdown_timeout),
            server_addr: args.server_addr,
        })
    }
}
