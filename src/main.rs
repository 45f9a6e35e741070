// SSHE — Application Entry Point
//
// Parses CLI arguments, initializes structured logging on stderr (the filter
// never emits passwords or the secret key), loads the config and node store,
// and dispatches to the command handler.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use sshe::cli::{execute, Cli, Context};
use sshe::config::{AppPaths, Config};
use sshe::select::TerminalPrompter;
use sshe::session::Ssh2Launcher;
use sshe::store::{NodeStore, YamlFile};
use sshe::Result;

fn main() {
    // RUST_LOG=sshe=debug for verbose output. Logs go to stderr so prompts
    // and tables on stdout stay clean.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sshe=warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let paths = AppPaths::from_env()?;
    paths.ensure_dir()?;
    let config = Config::load_or_init(&paths.config_file())?;
    let mut store = NodeStore::open(YamlFile::new(paths.nodes_file()))?;

    let mut prompter = TerminalPrompter;
    let launcher = Ssh2Launcher;
    let mut out = std::io::stdout();

    let mut ctx = Context {
        config: &config,
        store: &mut store,
        prompter: &mut prompter,
        launcher: &launcher,
        out: &mut out,
    };
    execute(cli.command, &mut ctx)
}
