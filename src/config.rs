//! Server configuration module

use std::path::PathBuf;

use clap::Parser;

use crate::{
    cart::{service::DEFAULT_MAX_WRITE_ATTEMPTS, CartSettings},
    catalog::service::DEFAULT_LATEST_PRODUCTS_LIMIT,
    identity::DEFAULT_IDENTITY_HEADER,
};

/// Storefront cart server configuration
#[derive(Debug, Parser)]
#[command(name = "storefront-cart", about = "Storefront cart server", long_about = None)]
pub struct Config {
    /// Server host address
    #[arg(short = 'H', long, env = "SERVER_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Server port
    #[arg(short, long, env = "SERVER_PORT", default_value = "8000")]
    pub port: u16,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Number of products returned by the latest products listing
    #[arg(long, env = "LATEST_PRODUCTS_LIMIT", default_value_t = DEFAULT_LATEST_PRODUCTS_LIMIT)]
    pub latest_products_limit: usize,

    /// JSON file with the product catalog; sample products when absent
    #[arg(long, env = "CATALOG_FILE")]
    pub catalog_file: Option<PathBuf>,

    /// Request header carrying the signed-in user id
    #[arg(long, env = "IDENTITY_HEADER", default_value = DEFAULT_IDENTITY_HEADER)]
    pub identity_header: String,

    /// Mint a session cookie for browsers that have none
    #[arg(
        long,
        env = "MINT_SESSION_COOKIE",
        default_value_t = true,
        action = clap::ArgAction::Set
    )]
    pub mint_session_cookie: bool,

    /// Attempts per cart write before giving up on concurrent updates
    #[arg(long, env = "MAX_WRITE_ATTEMPTS", default_value_t = DEFAULT_MAX_WRITE_ATTEMPTS)]
    pub max_write_attempts: u32,
}

impl Config {
    /// Load configuration from environment and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed
    pub fn load() -> Result<Self, clap::Error> {
        Self::try_parse()
    }

    /// Get the socket address for binding
    #[must_use]
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Service tunables derived from the flags
    #[must_use]
    pub fn settings(&self) -> CartSettings {
        CartSettings {
            latest_products_limit: self.latest_products_limit,
            mint_session_cookie: self.mint_session_cookie,
            max_write_attempts: self.max_write_attempts.max(1),
        }
    }
}
