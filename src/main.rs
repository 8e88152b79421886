use std::path::PathBuf;

use clap::Parser;

use tandem::config;

#[derive(Parser)]
#[command(
    name = "tandem",
    about = "Side-by-side bilingual document viewer with synchronized scrolling"
)]
struct Cli {
    /// Original-language document (Markdown)
    original: PathBuf,

    /// Translated document (Markdown)
    translated: PathBuf,

    /// Start with scroll synchronization disabled (toggle with `s`)
    #[arg(long)]
    no_sync: bool,

    /// Disable automatic reload when either file changes
    #[arg(long)]
    no_watch: bool,

    /// Scroll step in rows (overrides config)
    #[arg(long)]
    scroll_step: Option<u32>,

    /// Log output file path (enables logging when specified)
    #[arg(long)]
    log: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    // The TUI owns stdout/stderr, so logging goes to a file or nowhere.
    if let Some(log_path) = &cli.log {
        let file = std::fs::File::create(log_path).expect("failed to open log file");
        env_logger::Builder::from_default_env()
            .target(env_logger::Target::Pipe(Box::new(file)))
            .init();
    }

    // Load config file and merge CLI overrides
    let mut cfg = match config::load_config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    };
    cfg.merge_cli(cli.scroll_step, cli.no_sync);
    let config = cfg.resolve();

    let result = tandem::viewer::run(cli.original, cli.translated, &config, !cli.no_watch);

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
