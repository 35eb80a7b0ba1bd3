use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use blockfix::{
    config::{DecodePolicy, JobConfig, ReplaceOptions, WriteMode},
    preset,
    replace::{replace_block, SearchMode, SearchSpec},
    utils::read_file,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Without a subcommand the `to-path-string` preset runs in literal mode
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    options: OptionArgs,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Args)]
struct OptionArgs {
    /// Replace invalid UTF-8 with U+FFFD instead of failing
    #[arg(long, global = true, conflicts_with = "drop_invalid")]
    lossy: bool,

    /// Remove invalid UTF-8 instead of failing
    #[arg(long, global = true)]
    drop_invalid: bool,

    /// Truncate and rewrite the file instead of renaming a temporary file over it
    #[arg(long, global = true)]
    in_place: bool,

    /// Copy the original to <file>.bak before writing
    #[arg(long, global = true)]
    backup: bool,

    /// Print the diff without writing
    #[arg(long, global = true)]
    dry_run: bool,

    /// Refuse to write if the file changed since it was read
    #[arg(long, global = true)]
    verify_unchanged: bool,
}

impl OptionArgs {
    /// Flags given on the command line override the base options
    fn apply(&self, mut options: ReplaceOptions) -> ReplaceOptions {
        if self.lossy {
            options.decode = DecodePolicy::Replace;
        }
        if self.drop_invalid {
            options.decode = DecodePolicy::Drop;
        }
        if self.in_place {
            options.write = WriteMode::InPlace;
        }
        options.backup |= self.backup;
        options.dry_run |= self.dry_run;
        options.verify_unchanged |= self.verify_unchanged;
        options
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run a built-in job
    Preset {
        /// Preset name (see `presets`)
        name: String,

        /// File to repair instead of the preset's default
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Locate the block by pattern instead of exact text
        #[arg(long)]
        regex: bool,
    },

    /// List built-in jobs
    Presets,

    /// Replace an exact block of text
    Literal {
        /// File to repair
        #[arg(short, long)]
        file: PathBuf,

        /// File holding the text to find (one trailing newline is ignored)
        #[arg(short, long)]
        search_file: PathBuf,

        /// File holding the replacement (one trailing newline is ignored)
        #[arg(short, long)]
        replace_file: PathBuf,
    },

    /// Replace every block from a start token to a closing line
    Pattern {
        /// File to repair
        #[arg(short, long)]
        file: PathBuf,

        /// Text the block's first line starts with
        #[arg(long)]
        start: String,

        /// Content of the line that closes the block
        #[arg(long, default_value = "}")]
        end: String,

        /// File holding the replacement (one trailing newline is ignored)
        #[arg(short, long)]
        replace_file: PathBuf,
    },

    /// Run a job described in a TOML, JSON or YAML file
    Run {
        /// Job file
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Read a text argument file, dropping one trailing line terminator
fn read_text_arg(path: &Path) -> Result<String> {
    let mut text = read_file(path, DecodePolicy::Strict)
        .with_context(|| format!("Failed to read {}", path.display()))?
        .content;
    if text.ends_with('\n') {
        text.pop();
        if text.ends_with('\r') {
            text.pop();
        }
    }
    Ok(text)
}

fn run_preset(name: &str, file: Option<PathBuf>, regex: bool, options: &ReplaceOptions) -> Result<()> {
    let preset = preset::find(name)?;
    let file = file.unwrap_or_else(|| preset.default_path());
    let mode = if regex {
        SearchMode::Pattern
    } else {
        SearchMode::Literal
    };

    info!("Running preset {} on {}", preset.name, file.display());
    execute(&file, &preset.search(mode), preset.replacement, options)
}

fn execute(file: &Path, search: &SearchSpec, replacement: &str, options: &ReplaceOptions) -> Result<()> {
    debug!("Options: {:?}", options);
    let report = replace_block(file, search, replacement, options)
        .with_context(|| format!("Failed to repair {}", file.display()))?;

    if let Some(diff) = &report.diff {
        print!("{}", diff);
    }
    if let Some(backup) = &report.backup {
        info!("Backup saved to {}", backup.display());
    }
    println!("{}", report.status_line());
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    blockfix::logging::init_logging(cli.verbose)?;

    let base = ReplaceOptions::default();

    match cli.command {
        None => run_preset(preset::DEFAULT_PRESET, None, false, &cli.options.apply(base)),
        Some(Commands::Preset { name, file, regex }) => {
            run_preset(&name, file, regex, &cli.options.apply(base))
        }
        Some(Commands::Presets) => {
            for preset in preset::PRESETS {
                println!("{}\t{}\t{}", preset.name, preset.default_file, preset.description);
            }
            Ok(())
        }
        Some(Commands::Literal {
            file,
            search_file,
            replace_file,
        }) => {
            let search = SearchSpec::literal(read_text_arg(&search_file)?);
            let replacement = read_text_arg(&replace_file)?;
            execute(&file, &search, &replacement, &cli.options.apply(base))
        }
        Some(Commands::Pattern {
            file,
            start,
            end,
            replace_file,
        }) => {
            let search = SearchSpec::pattern(start, end);
            let replacement = read_text_arg(&replace_file)?;
            execute(&file, &search, &replacement, &cli.options.apply(base))
        }
        Some(Commands::Run { config }) => {
            let job = JobConfig::load(&config)
                .with_context(|| format!("Failed to load job {}", config.display()))?;
            let options = cli.options.apply(job.options.clone());
            execute(&job.file, &job.search, &job.replacement, &options)
        }
    }
}
