use std::{net::SocketAddr, path::PathBuf};

use clap::Parser;

/// Mirage deepfake-awareness relay
#[derive(Debug, Parser)]
#[command(name = "mirage", about = "Face-swap, media relay and voice cloning backend")]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "mirage.toml", env = "MIRAGE_CONFIG")]
    pub config: PathBuf,

    /// Override the listen address
    #[arg(long, env = "MIRAGE_LISTEN")]
    pub listen: Option<SocketAddr>,

    /// Log filter used when `RUST_LOG` is unset
    #[arg(long, default_value = "info", env = "MIRAGE_LOG")]
    pub log: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["mirage"]).unwrap();
        assert_eq!(args.config, PathBuf::from("mirage.toml"));
        assert_eq!(args.listen, None);
        assert_eq!(args.log, "info");
    }

    #[test]
    fn listen_override_parses() {
        let args = Args::try_parse_from(["mirage", "--listen", "127.0.0.1:9000", "-c", "/etc/mirage.toml"]).unwrap();
        assert_eq!(args.listen, Some("127.0.0.1:9000".parse().unwrap()));
        assert_eq!(args.config, PathBuf::from("/etc/mirage.toml"));
    }
}
