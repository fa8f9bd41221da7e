use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser, Clone)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        help = "Enable verbose logging (-v for debug, -vv for trace)"
    )]
    pub verbose: u8,

    /// Path to the YAML model catalog
    #[arg(
        short = 'c',
        long = "catalog",
        value_name = "CATALOG_PATH",
        default_value = "config/models.yaml",
        help = "Model catalog file path"
    )]
    pub catalog_path: PathBuf,

    /// Address the API server binds to
    #[arg(
        short = 'l',
        long = "listen",
        value_name = "LISTEN_ADDR",
        default_value = "0.0.0.0:8000",
        help = "Listen address for the API server"
    )]
    pub listen: SocketAddr,
}
