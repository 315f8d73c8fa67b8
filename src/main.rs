use clap::{Parser, Subcommand};
use kotoba::tasks::{Runner, Task};
use kotoba::{config, highlight, log, output, pages};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Parser)]
#[command(name = "kotoba")]
#[command(about = "Static book builder with highlighted code and a kana-ordered keyword index")]
#[command(long_about = "\
Static book builder with highlighted code and a kana-ordered keyword index

Markdown pages become HTML, style sheets are bundled, assets are copied.
Keywords marked anywhere in the book are collected into an index ordered by
reading, with voiced kana filed under their unvoiced row.

Project structure:

  book/
  ├── kotoba.toml                  # Project config (optional)
  ├── content/
  │   ├── hyoshi.md                # Page → dest/hyoshi.html (links the cover sheet)
  │   ├── index/                   # Chapters → dest/index.html
  │   │   ├── 010-intro.md         # Ordered by number prefix
  │   │   ├── 020-ownership.md
  │   │   └── 900-index.md         # Holds the keyword index
  │   └── assets/                  # Copied to dest/assets/
  └── style/
      ├── main.css                 # → dest/main.css + main.css.map
      └── hyoshi.css               # → dest/hyoshi.css

Markup inside content, as fenced blocks:

  ```define-keyword              one keyword per line; \"reading|Display\" sorts
  しょゆうけん|所有権              by the reading and shows the display text
  ```

  ```render-index                the keyword index goes here
  ```

  ```rust start=10               highlighted code with numbered lines from 10
  ```

Run 'kotoba gen-config' to generate a documented kotoba.toml.")]
#[command(version)]
struct Cli {
    /// Project root (contains content/, style/ and kotoba.toml)
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Config file (default: <root>/kotoba.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Show debug output
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Render pages, copy assets and compile styles (the default)
    #[command(alias = "default")]
    Build,
    /// Render content pages to HTML
    #[command(alias = "pug")]
    Pages,
    /// Replace the output assets with a fresh copy
    Assets,
    /// Bundle style sheets
    #[command(alias = "stylus")]
    Styles,
    /// Start the preview server with live reload
    #[command(alias = "browsersync")]
    Serve,
    /// Build, serve, and rebuild on change
    Watch,
    /// Compile styles and recompile on change
    #[command(name = "watch-styles", alias = "watch:stylus")]
    WatchStyles,
    /// Scan content and print the keyword index without writing anything
    Check,
    /// Print a stock kotoba.toml with all options documented
    GenConfig,
}

impl Command {
    fn task(&self) -> Option<Task> {
        match self {
            Command::Build => Some(Task::Build),
            Command::Pages => Some(Task::Pages),
            Command::Assets => Some(Task::Assets),
            Command::Styles => Some(Task::Styles),
            Command::Serve => Some(Task::Serve),
            Command::Watch => Some(Task::Watch),
            Command::WatchStyles => Some(Task::WatchStyles),
            Command::Check | Command::GenConfig => None,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    kotoba::logger::set_verbose(cli.verbose);
    let command = cli.command.unwrap_or(Command::Build);

    if let Command::GenConfig = command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let config = config::load_config(&cli.root, cli.config.as_deref())?;

    if let Command::Check = command {
        println!("==> Checking {}", config.content_dir().display());
        let highlighter = highlight::Highlighter::new(&config.highlight.class_prefix);
        let scan = pages::scan_pages(&config, &highlighter)?;
        output::print_keyword_index(&scan.index);
        for failure in &scan.failures {
            println!("Failed: {}: {}", failure.name, failure.reason);
        }
        println!("==> Scanned {} pages", scan.pages.len());
        return Ok(());
    }

    let Some(task) = command.task() else {
        return Ok(());
    };

    let shutdown = Arc::new(AtomicBool::new(false));
    if matches!(task, Task::Serve | Task::Watch | Task::WatchStyles) {
        let flag = Arc::clone(&shutdown);
        ctrlc::set_handler(move || {
            log!("kotoba"; "shutting down...");
            flag.store(true, Ordering::Relaxed);
        })?;
    }

    let mut runner = Runner::new(config, shutdown);
    runner.run(task)?;
    Ok(())
}
