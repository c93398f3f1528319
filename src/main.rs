use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use git_diff_parse::{DiffEntry, DiffError, InputError};
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "git-diff-parse")]
#[command(about = "Parse git diff text into structured records")]
#[command(version)]
struct Cli {
    /// Log parser progress at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a diff and print its entries as JSON
    Parse {
        /// Diff file to read (stdin when omitted)
        file: Option<PathBuf>,
        /// Print JSON on a single line
        #[arg(long)]
        compact: bool,
    },
    /// Print one summary line per file
    Stat {
        /// Diff file to read (stdin when omitted)
        file: Option<PathBuf>,
    },
    /// Generate a shell completion script
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
    /// Generate a man page
    Man,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(if cli.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        })
        .parse_default_env()
        .init();

    let mut stdout = io::stdout().lock();

    match cli.command {
        Commands::Parse { file, compact } => {
            let entries = read_entries(file.as_deref())?;
            if compact {
                serde_json::to_writer(&mut stdout, &entries)?;
            } else {
                serde_json::to_writer_pretty(&mut stdout, &entries)?;
            }
            writeln!(stdout)?;
        }
        Commands::Stat { file } => {
            for entry in read_entries(file.as_deref())? {
                writeln!(stdout, "{}", entry.summary())?;
            }
        }
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "git-diff-parse", &mut stdout);
        }
        Commands::Man => {
            clap_mangen::Man::new(Cli::command()).render(&mut stdout)?;
        }
    }

    Ok(())
}

/// Parse the diff in `file`, or on stdin when no file is given
fn read_entries(file: Option<&Path>) -> Result<Vec<DiffEntry>, DiffError> {
    match file {
        Some(path) => {
            log::debug!("reading diff from {}", path.display());
            let file = File::open(path).map_err(|e| InputError::ReadFailed {
                message: format!("{}: {}", path.display(), e),
            })?;
            git_diff_parse::parse_reader(file)
        }
        None => {
            log::debug!("reading diff from stdin");
            git_diff_parse::parse_reader(io::stdin().lock())
        }
    }
}
