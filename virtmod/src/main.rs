#![allow(clippy::uninlined_format_args)]

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use itertools::Itertools;
use log::info;
use std::path::PathBuf;
use std::sync::Arc;
use virtmod_rs::icon::IconRef;
use virtmod_rs::module_loader::{ModuleId, Resolution};
use virtmod_rs::watch::SpriteWatcher;
use virtmod_rs::{BuildSession, LoaderChain, PipelineConfig};

/// virtmod: Inspect virtual modules, SVG sprites and source patches of a build
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Path to JSON configuration file
    #[clap(short, long)]
    pub config: Option<String>,

    /// Project root (overrides the configuration file)
    #[clap(short, long)]
    pub root: Option<String>,

    /// Log debug output
    #[clap(short, long)]
    pub verbose: bool,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the canonical id a specifier resolves to
    Resolve {
        /// Import specifier, e.g. virtual:fib or ./src/main.ts
        specifier: String,

        /// File containing the import, for relative specifiers
        #[clap(long)]
        referrer: Option<String>,
    },

    /// Print the source text a specifier loads to
    Load {
        /// Import specifier, e.g. virtual:env
        specifier: String,

        /// File containing the import, for relative specifiers
        #[clap(long)]
        referrer: Option<String>,
    },

    /// List registered virtual module names
    Modules,

    /// Build the SVG sprite
    Sprite {
        /// Path to output file to be created (stdout when omitted)
        #[clap(short, long)]
        output: Option<String>,
    },

    /// Print the markup referencing one sprite icon
    Icon {
        /// Icon name (file stem)
        name: String,
    },

    /// Print a file after the configured patch rules
    Patch {
        /// Path to input file
        file: String,

        /// Path to output file to be created (stdout when omitted)
        #[clap(short, long)]
        output: Option<String>,
    },

    /// Rebuild the sprite whenever icon directories change
    Watch {
        /// Rewrite this file after every rebuild
        #[clap(short, long)]
        output: Option<String>,
    },
}

fn main() {
    let args: Args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    if let Err(err) = run(args) {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref(), args.root.as_deref())?;
    let session = Arc::new(BuildSession::new(config)?);

    match args.command {
        Commands::Resolve {
            specifier,
            referrer,
        } => {
            if let Resolution::Virtual(id) = session.resolve(&specifier) {
                println!("{}", id.as_str().escape_debug());
                return Ok(());
            }
            let chain = LoaderChain::for_session(session);
            let referrer = referrer.map(expand_path);
            match chain.resolve(&specifier, referrer.as_deref()) {
                Ok(id) => println!("{}", id),
                Err(_) => println!("not handled"),
            }
        }
        Commands::Load {
            specifier,
            referrer,
        } => {
            let chain = LoaderChain::for_session(session);
            let referrer = referrer.map(expand_path);
            let id = chain.resolve(&specifier, referrer.as_deref())?;
            let code = chain.load(&id)?;
            print!("{}", code);
            if let ModuleId::File(path) = id {
                info!("Loaded {}", path.display());
            }
        }
        Commands::Modules => {
            let registry = session.registry();
            let listing = registry
                .names()
                .into_iter()
                .filter_map(|name| {
                    registry
                        .get(name)
                        .map(|kind| format!("virtual:{} ({})", name, kind))
                })
                .join("\n");
            println!("{}", listing);
        }
        Commands::Sprite { output } => {
            let sprite = session.sprite();
            for warning in sprite.warnings() {
                eprintln!("warning: {}", warning);
            }
            write_output(output.as_deref(), sprite.markup())?;
        }
        Commands::Icon { name } => {
            let icon = IconRef::with_options(name, &session.config().icons);
            if !icon.is_available_in(&session.sprite()) {
                bail!("Icon `{}` is not in the sprite", icon.symbol_id());
            }
            println!("{}", icon.to_markup());
        }
        Commands::Patch { file, output } => {
            let path = expand_path(file);
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read input file: {}", path.display()))?;
            let path = path.canonicalize().unwrap_or(path);
            let patched = session.transform(&path, &text);
            write_output(output.as_deref(), &patched)?;
        }
        Commands::Watch { output } => {
            let output = output.map(expand_path);
            if let Some(output) = &output {
                std::fs::write(output, session.sprite().markup())?;
            }
            let watched = session.clone();
            let _watcher = SpriteWatcher::spawn_with(session, move |report| {
                eprintln!(
                    "sprite rebuilt: {} symbols, {} warnings ({:?})",
                    report.symbols,
                    report.warnings.len(),
                    report.outcome
                );
                if let Some(output) = &output {
                    if let Err(err) = std::fs::write(output, watched.sprite().markup()) {
                        eprintln!("Failed to write {}: {}", output.display(), err);
                    }
                }
            })?;
            eprintln!("Watching icon directories, press Ctrl-C to stop");
            loop {
                std::thread::park();
            }
        }
    }
    Ok(())
}

fn load_config(config: Option<&str>, root: Option<&str>) -> anyhow::Result<PipelineConfig> {
    let mut config = match config {
        Some(path) => {
            let path = expand_path(path.to_string());
            PipelineConfig::from_file(&path)
                .with_context(|| format!("Failed to load config {}", path.display()))?
        }
        None => {
            let mut config = PipelineConfig::default();
            config.resolve_paths(&std::env::current_dir()?)?;
            config
        }
    };
    if let Some(root) = root {
        let cwd = std::env::current_dir()?;
        let root = cwd.join(expand_path(root.to_string()));
        // Icon directories follow the new root when given relative to the old one
        let old_root = config.root.clone();
        for dir in config.icons.dirs.iter_mut() {
            if let Ok(rel) = dir.strip_prefix(&old_root).map(|rel| rel.to_path_buf()) {
                *dir = root.join(rel);
            }
        }
        config.root = root;
    }
    Ok(config)
}

fn expand_path(path: String) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path).as_ref())
}

fn write_output(output: Option<&str>, content: &str) -> anyhow::Result<()> {
    match output {
        Some(output) => {
            let path = expand_path(output.to_string());
            std::fs::write(&path, content)
                .with_context(|| format!("Failed to write output to {}", path.display()))?;
        }
        None => {
            print!("{}", content);
            if !content.ends_with('\n') {
                println!();
            }
        }
    }
    Ok(())
}
