use std::path::PathBuf;

use clap::{Args, ValueHint, builder::BoolishValueParser};

/// Configuration flags shared by every binary that embeds the client.
#[derive(Debug, Args, Default, Clone)]
pub struct ConfigArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "BAZAAR_CONFIG_FILE",
        value_name = "PATH",
        value_hint = ValueHint::FilePath,
        global = true
    )]
    pub config_file: Option<PathBuf>,

    /// Override the API base URL, e.g. `https://shop.example/api`.
    #[arg(long = "api-base", env = "BAZAAR_API_BASE", value_name = "URL", global = true)]
    pub api_base: Option<String>,

    /// Override the directory holding the persisted session token.
    #[arg(
        long = "token-dir",
        value_name = "PATH",
        value_hint = ValueHint::DirPath,
        global = true
    )]
    pub token_dir: Option<PathBuf>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,
}
