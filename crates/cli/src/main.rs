use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use autodecomp_core::{Address, Config, FragmentEntry, FragmentKind};
use autodecomp_fragments::{find_entries, find_entry, promote_entry};
use autodecomp_pipeline::Orchestrator;
use autodecomp_source::MarkerLocator;
use autodecomp_symbols::{ClangExtractor, ParseProfile, SymbolSource};

#[derive(Parser)]
#[command(name = "autodecomp")]
#[command(about = "Decompile marked fragments in place, keeping only what still builds")]
struct Cli {
    /// Path to the JSON config (defaults are used if it does not exist)
    #[arg(short, long, global = true, default_value = "autodecomp.json")]
    config: PathBuf,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Attempt every marker of a source file
    Run {
        /// Source file to process (selected from the fragment config if omitted)
        file: Option<PathBuf>,

        /// Address of a `c` entry in the fragment config
        #[arg(short, long)]
        address: Option<Address>,
    },
    /// List the markers of a source file
    Markers {
        file: PathBuf,
    },
    /// List fragment config entries of one kind
    Entries {
        #[arg(short, long, default_value = "asm")]
        kind: String,
    },
    /// Turn an `asm` entry into a `c` entry with a generated stub file
    Promote {
        #[arg(short, long)]
        address: Address,
    },
    /// Print the variables a file declares
    Symbols {
        file: PathBuf,

        /// Parse without project headers
        #[arg(long)]
        permissive: bool,
    },
    /// Write the default config
    Init,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    execute(cli.command, &cli.config)
}

fn load_config(path: &Path) -> Result<Config> {
    Config::load_or_default(path).with_context(|| format!("failed to load {}", path.display()))
}

fn write_default_config(path: &Path) -> Result<()> {
    if path.exists() {
        bail!("{} already exists", path.display());
    }
    Config::default()
        .save(path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!("Wrote {}", path.display());
    Ok(())
}

fn execute(command: Commands, config_path: &Path) -> Result<()> {
    match command {
        Commands::Run { file, address } => {
            let config = &load_config(config_path)?;
            let file = match file {
                Some(file) => file,
                None => source_for_address(config, address)?,
            };
            let orchestrator = Orchestrator::new(config);
            let reports = orchestrator.run_file(&file)?;
            for report in &reports {
                match &report.reason {
                    None => println!(
                        "ok      {}:{} {}",
                        report.marker.file.display(),
                        report.marker.line,
                        report.marker.fragment.display()
                    ),
                    Some(reason) => println!(
                        "failed  {}:{} {} ({})",
                        report.marker.file.display(),
                        report.marker.line,
                        report.marker.fragment.display(),
                        reason
                    ),
                }
            }
            let kept = reports.iter().filter(|r| r.succeeded()).count();
            info!("{} of {} fragments verified", kept, reports.len());
        }
        Commands::Markers { file } => {
            let config = load_config(config_path)?;
            let locator = MarkerLocator::new(config.marker_prefix.clone(), config.fragment_root());
            for marker in locator.locate(&file)? {
                println!("{}:{} {}", marker.file.display(), marker.line, marker.fragment.display());
            }
        }
        Commands::Entries { kind } => {
            let config = load_config(config_path)?;
            let kind = FragmentKind::from(kind.as_str());
            let entries = find_entries(&config.segments_path(), &config.segments.section, &kind)?;
            for entry in &entries {
                print_entry(entry);
            }
        }
        Commands::Promote { address } => {
            let config = &load_config(config_path)?;
            let entry = find_entry(&config.segments_path(), &config.segments.section, address)?;
            let src = promote_entry(config, &entry)?;
            println!("{}", src.display());
        }
        Commands::Symbols { file, permissive } => {
            let config = &load_config(config_path)?;
            let profile = if permissive {
                ParseProfile::Permissive
            } else {
                ParseProfile::Strict
            };
            for symbol in ClangExtractor::from_config(config).extract(&file, profile)? {
                println!("{}", symbol);
            }
        }
        Commands::Init => write_default_config(config_path)?,
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Source file of the `c` entry at `address` (or the configured default)
fn source_for_address(config: &Config, address: Option<Address>) -> Result<PathBuf> {
    let Some(address) = address.or(config.segments.default_address) else {
        bail!("no source file given and no --address or default_address configured");
    };

    let entry = find_entry(&config.segments_path(), &config.segments.section, address)?;
    if entry.kind != FragmentKind::C {
        bail!(
            "entry {} is `{}`; run `autodecomp promote --address {}` first",
            entry.address,
            entry.kind,
            entry.address
        );
    }
    let name = entry
        .name
        .clone()
        .or_else(|| entry.derived_name())
        .with_context(|| format!("entry {} has no name", entry.address))?;

    let file = config
        .resolve(&config.segments.src_dir)
        .join(Path::new(&name).with_extension("c"));
    if !file.exists() {
        warn!("{} does not exist yet; did the build split it?", file.display());
    }
    Ok(file)
}

fn print_entry(entry: &FragmentEntry) {
    println!(
        "{:>5}  {:<10} {:<6} {:<20} {}",
        entry.line,
        entry.address.to_string(),
        entry.kind.as_str(),
        entry.name.as_deref().unwrap_or("-"),
        entry.segment.as_deref().unwrap_or("-")
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEGMENTS: &str = "\
segments:
  - name: game
    subsegments:
      - [0x1000, asm]
      - [0x1200, c, game_1200]
      - [0x1400, c]
";

    fn config(dir: &Path) -> Config {
        std::fs::write(dir.join("splat.yaml"), SEGMENTS).unwrap();
        Config {
            project_root: dir.to_path_buf(),
            ..Config::default()
        }
    }

    #[test]
    fn test_source_for_named_entry() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());

        let file = source_for_address(&config, Some(Address(0x1200))).unwrap();
        assert_eq!(file, dir.path().join("src/game_1200.c"));
    }

    #[test]
    fn test_source_for_unnamed_entry_uses_derived_name() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());

        let file = source_for_address(&config, Some(Address(0x1400))).unwrap();
        assert_eq!(file, dir.path().join("src/game_1400.c"));
    }

    #[test]
    fn test_source_falls_back_to_default_address() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        assert!(source_for_address(&config, None).is_err());

        config.segments.default_address = Some(Address(0x1200));
        let file = source_for_address(&config, None).unwrap();
        assert_eq!(file, dir.path().join("src/game_1200.c"));
    }

    #[test]
    fn test_source_rejects_asm_entry() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());

        let err = source_for_address(&config, Some(Address(0x1000))).unwrap_err();
        assert!(err.to_string().contains("promote"));
    }

    #[test]
    fn test_cli_parses_run_address() {
        let cli = Cli::parse_from(["autodecomp", "run", "--address", "0x1200"]);
        assert_eq!(cli.config, PathBuf::from("autodecomp.json"));
        match cli.command {
            Commands::Run { file, address } => {
                assert!(file.is_none());
                assert_eq!(address, Some(Address(0x1200)));
            }
            _ => panic!("expected run"),
        }
    }
}
