use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// WhatsApp shopping assistant: Odoo catalog + Gemini answers.
#[derive(Parser)]
#[command(name = "shopchat", version, about, long_about = None)]
pub struct Cli {
    /// Path to a YAML config file (default: ./shopchat.yml if present).
    #[arg(long, global = true, env = "SHOPCHAT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log filter such as `info` or `shopchat_agents=debug`.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP gateway (default).
    Serve,

    /// Print the published catalog as it is given to the model.
    Products,

    /// Print the stored conversation for a user.
    History {
        /// Phone number or API user id.
        user_id: String,
    },
}
