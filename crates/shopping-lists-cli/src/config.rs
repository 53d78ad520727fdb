use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Configuration for the shopping-lists command line.
#[derive(Parser, Debug, Clone)]
#[command(name = "shopping-lists")]
#[command(about = "Browse and edit shopping lists kept in a record database")]
#[command(version)]
pub struct Config {
    /// Where records are stored
    #[arg(long, value_enum, default_value = "local", env = "SHOPPING_LISTS_BACKEND")]
    pub backend: Backend,

    /// Directory for the local record store
    #[arg(long, env = "SHOPPING_LISTS_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Cloudflare account ID (cloudflare backend)
    #[arg(long, env = "CLOUDFLARE_ACCOUNT_ID")]
    pub cloudflare_account_id: Option<String>,

    /// Cloudflare API token with D1 access (cloudflare backend)
    #[arg(long, env = "CLOUDFLARE_API_TOKEN", hide_env_values = true)]
    pub cloudflare_api_token: Option<String>,

    /// D1 database ID (cloudflare backend)
    #[arg(long, env = "D1_DATABASE_ID")]
    pub d1_database_id: Option<String>,

    /// Log at info level unless RUST_LOG says otherwise
    #[arg(short, long)]
    pub verbose: bool,

    /// Log the current user's record on startup
    #[arg(long)]
    pub diagnostics: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    Local,
    Cloudflare,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show every list
    List,
    /// Create a list
    Add { name: String },
    /// Rename the list at ROW (as numbered by `list`)
    Rename { row: usize, name: String },
    /// Delete the list at ROW (as numbered by `list`)
    Delete { row: usize },
}

impl Config {
    /// Default log filter when RUST_LOG is unset.
    pub fn default_log_filter(&self) -> &'static str {
        if self.verbose {
            "info"
        } else {
            "warn"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rename() {
        let config =
            Config::try_parse_from(["shopping-lists", "rename", "2", "Hardware store"]).unwrap();
        assert_eq!(config.backend, Backend::Local);
        assert_eq!(
            config.command,
            Command::Rename {
                row: 2,
                name: "Hardware store".into()
            }
        );
        assert_eq!(config.default_log_filter(), "warn");
    }

    #[test]
    fn test_parse_cloudflare_backend() {
        let config = Config::try_parse_from([
            "shopping-lists",
            "--backend",
            "cloudflare",
            "--cloudflare-account-id",
            "acct",
            "--cloudflare-api-token",
            "token",
            "--d1-database-id",
            "db",
            "-v",
            "list",
        ])
        .unwrap();
        assert_eq!(config.backend, Backend::Cloudflare);
        assert_eq!(config.d1_database_id.as_deref(), Some("db"));
        assert_eq!(config.default_log_filter(), "info");
    }

    #[test]
    fn test_missing_subcommand_is_rejected() {
        assert!(Config::try_parse_from(["shopping-lists"]).is_err());
    }
}
