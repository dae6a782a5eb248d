use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "livedoc")]
#[command(about = "Live document service", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP server
    Server(ServerArgs),
    /// Convert an HTML file and print the JSON conversion result
    Convert(ConvertArgs),
}

#[derive(clap::Args, Debug)]
pub struct ServerArgs {
    /// Address to bind the HTTP server to (defaults to server.bind_addr)
    #[arg(long)]
    pub address: Option<SocketAddr>,
}

#[derive(clap::Args, Debug)]
pub struct ConvertArgs {
    /// HTML file to convert
    #[arg(long)]
    pub input: PathBuf,

    /// Editor schema of the output
    #[arg(long, default_value = "document", value_parser = ["rich", "document"])]
    pub variant: String,
}
