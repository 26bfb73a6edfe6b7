use chatter::core::config::{self, CliOverrides};
use chatter::tui;
use clap::Parser;
use simplelog::{ConfigBuilder, WriteLogger};
use std::fs::File;

#[derive(Parser)]
#[command(name = "chatter", version, about = "Terminal client for a socket.io chat room")]
struct Args {
    /// Chat server URL; a path component selects the namespace
    #[arg(short, long)]
    url: Option<String>,

    /// Engine.IO mount path on the server
    #[arg(short, long)]
    path: Option<String>,
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    // A broken config file is fatal; a missing one is not.
    let file_config = config::load_config().map_err(std::io::Error::other)?;
    let resolved = config::resolve(
        &file_config,
        &CliOverrides {
            url: args.url,
            path: args.path,
        },
    );

    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();
    if let Ok(log_file) = File::create(&resolved.log_file) {
        let _ = WriteLogger::init(resolved.log_level, log_config, log_file);
    }

    // Config was read before the logger existed
    for notice in &resolved.notices {
        log::log!(notice.level, "{}", notice.message);
    }

    log::info!(
        "Chatter starting up against {} (path {})",
        resolved.server_url,
        resolved.socket_path
    );

    tui::run(resolved)
}
