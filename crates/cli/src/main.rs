mod inspect_commands;
mod repl_commands;

use std::path::PathBuf;

use {
    clap::{Parser, Subcommand},
    msgkit_config::MsgkitConfig,
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "msgkit", about = "msgkit: local playground for group chat bots")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file to load instead of discovering `msgkit.{toml,yaml,yml,json}`.
    #[arg(long, global = true, env = "MSGKIT_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the group bot in an in-memory group (default).
    Repl {
        /// Add the demo identities (alix, eva, bo) regardless of config.
        #[arg(long)]
        fixtures: bool,
    },
    /// Print the command listing.
    Commands,
    /// Print how a message parses, as JSON.
    Parse {
        /// Message text, e.g. "/add @alix".
        text: String,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr)
                    .with_ansi(true),
            )
            .init();
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<MsgkitConfig> {
    let mut config = match &cli.config {
        Some(path) => msgkit_config::load_config(path)?,
        None => msgkit_config::discover_and_load(),
    };
    msgkit_config::apply_env_overrides(&mut config);
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "msgkit starting");

    match &cli.command {
        None => repl_commands::run(load_config(&cli)?, false).await,
        Some(Commands::Repl { fixtures }) => {
            repl_commands::run(load_config(&cli)?, *fixtures).await
        },
        Some(Commands::Commands) => inspect_commands::print_commands(),
        Some(Commands::Parse { text }) => inspect_commands::print_parse(text),
    }
}

#[cfg(test)]
mod tests {
    use {super::*, std::io::Write};

    #[test]
    fn explicit_config_file_is_loaded() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[bot]\nname = \"gm-bot\"\nfixtures = true").unwrap();

        let cli = Cli::parse_from([
            "msgkit",
            "--config",
            file.path().to_str().unwrap(),
            "repl",
        ]);
        let config = load_config(&cli).unwrap();
        assert_eq!(config.bot.name, "gm-bot");
        assert!(config.bot.fixtures);
        assert!(matches!(cli.command, Some(Commands::Repl { fixtures: false })));
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let cli = Cli::parse_from(["msgkit", "--config", "/nonexistent/msgkit.toml"]);
        assert!(load_config(&cli).is_err());
    }
}
