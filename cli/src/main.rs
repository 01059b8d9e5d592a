mod commands;
mod terminal;

use commands::{CommandLine, scan};
use edgefind_common::config::Config;
use terminal::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let commands = CommandLine::parse_args();

    logging::init_logging();

    let cfg: Config = commands.to_config();
    scan::scan(&cfg, commands.provider).await
}
