use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "podly")]
#[command(about = "Legacy podcast feed rewriting server", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve rewritten feeds and episode downloads
    Server(ServerArgs),
}

#[derive(clap::Args, Debug)]
pub struct ServerArgs {
    /// Address to bind the HTTP server to (overrides server.bind_addr)
    #[arg(long)]
    pub address: Option<SocketAddr>,

    /// Configuration file (defaults to $PODLY_CONFIG or config/podly.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_server_overrides() {
        let cli = Cli::parse_from([
            "podly",
            "server",
            "--address",
            "127.0.0.1:8000",
            "--config",
            "/etc/podly.toml",
        ]);

        let Commands::Server(args) = cli.command;
        assert_eq!(args.address, Some("127.0.0.1:8000".parse().unwrap()));
        assert_eq!(args.config, Some(PathBuf::from("/etc/podly.toml")));
    }
}
