//! CLI module - Command-line interface definitions and handlers

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::book::assemble::run_books;
use crate::book::BookSpec;
use crate::config::Config;
use crate::core::render::{OutputFormat, RenderConfig};
use crate::include::apply::{run_include, ApplyOptions};
use crate::include::rewriter::IncludeBase;

/// bookforge - assemble self-contained mdBook books from source trees.
#[derive(Parser, Debug)]
#[command(name = "bookforge")]
#[command(
    author,
    version,
    about,
    long_about = r#"bookforge resolves mdBook-style {{#include path:anchor}} directives and
assembles documentation source trees into self-contained books.

Every command prints a report of the files it touched in the selected format
(default: text). Logs go to stderr.

Examples:
    bookforge include docs/src
    bookforge book --src sway/docs/book/src --out dist/sway
    bookforge build --only sway --only fuels-rs
    bookforge combine dist --out dist/combined-docs.md
    bookforge anchors lint sway/examples
"#
)]
pub struct Cli {
    /// Report format (text/json/jsonl/md).
    #[arg(
        long,
        global = true,
        default_value = "text",
        value_name = "FORMAT",
        long_help = "Select the report format.\n\n\
Supported values:\n\
- text (default)\n\
- json\n\
- jsonl\n\
- md (markdown)"
    )]
    pub format: OutputFormat,

    /// Number of worker threads.
    #[arg(
        long,
        short = 'j',
        global = true,
        env = "BOOKFORGE_JOBS",
        value_name = "N",
        long_help = "Number of worker threads used for per-file work.\n\n\
Defaults to the `jobs` value of the config file, then to the available parallelism."
    )]
    pub jobs: Option<usize>,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Quiet mode (errors only on stderr).
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Verbose mode (debug logs on stderr).
    #[arg(
        short,
        long,
        global = true,
        long_help = "Enable debug logging. RUST_LOG is honoured when neither --verbose nor\n\
--quiet is given."
    )]
    pub verbose: bool,

    /// Pretty-print JSON/JSONL output with indentation.
    #[arg(long, global = true)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve include directives in place.
    #[command(
        long_about = "Rewrite {{#include}} directives in one markdown file, or in every markdown\n\
file under a directory, writing back only files whose content changed.\n\n\
Examples:\n\
  bookforge include docs/src\n\
  bookforge include docs/src/intro.md --base . --dry-run\n"
    )]
    Include {
        /// Markdown file or directory.
        #[arg(value_name = "PATH")]
        path: PathBuf,

        /// Resolve include paths against DIR instead of each file's directory.
        #[arg(long, value_name = "DIR")]
        base: Option<PathBuf>,

        /// Report what would change without writing.
        #[arg(long)]
        dry_run: bool,
    },

    /// Assemble one book.
    #[command(
        long_about = "Copy a source tree into OUT/src with every include resolved, then make\n\
sure OUT/book.toml and OUT/src/SUMMARY.md exist.\n\n\
Example:\n\
  bookforge book --src sway/docs/book/src --out dist/sway --include-root sway\n"
    )]
    Book {
        /// Source directory (the book's src/).
        #[arg(long, value_name = "DIR")]
        src: PathBuf,

        /// Output book directory.
        #[arg(long, value_name = "DIR")]
        out: PathBuf,

        /// Book name used in reports (defaults to the output directory name).
        #[arg(long, value_name = "NAME")]
        name: Option<String>,

        /// Resolve include paths against DIR instead of each file's directory.
        #[arg(long, value_name = "DIR")]
        include_root: Option<PathBuf>,

        /// book.toml to copy (defaults to SRC/../book.toml, generated if absent).
        #[arg(long, value_name = "FILE")]
        manifest: Option<PathBuf>,

        /// Title for a generated book.toml.
        #[arg(long, value_name = "TITLE")]
        title: Option<String>,

        /// Author for a generated book.toml (repeatable).
        #[arg(long = "author", value_name = "NAME")]
        authors: Vec<String>,

        /// Only process chapters linked from SUMMARY.md.
        #[arg(long)]
        summary_only: bool,

        /// Keep existing files in OUT/src.
        #[arg(long)]
        no_clean: bool,
    },

    /// Assemble every book listed in bookforge.toml.
    #[command(
        long_about = "Assemble the books defined by [[book]] tables in bookforge.toml. The file\n\
is searched for in the current directory and its parents unless --config is given.\n\n\
Examples:\n\
  bookforge build\n\
  bookforge build --config docs/bookforge.toml --only sway\n"
    )]
    Build {
        /// Config file path.
        #[arg(long, env = "BOOKFORGE_CONFIG", value_name = "FILE")]
        config: Option<PathBuf>,

        /// Only build the named book (repeatable).
        #[arg(long, value_name = "NAME")]
        only: Vec<String>,
    },

    /// Concatenate generated books into one markdown file.
    Combine {
        /// Directory containing one subdirectory per book.
        #[arg(value_name = "BOOKS_DIR")]
        books_dir: PathBuf,

        /// Output file.
        #[arg(long, value_name = "FILE")]
        out: PathBuf,
    },

    /// Inspect ANCHOR / ANCHOR_END markers.
    Anchors {
        #[command(subcommand)]
        action: AnchorCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum AnchorCommands {
    /// Report malformed anchor markers.
    #[command(
        long_about = "Check anchor markers in every text-like file under DIR: ANCHOR_END without\n\
a matching ANCHOR, unterminated anchors, reopened names and empty regions.\n\n\
Exits non-zero when errors are found, suitable for CI gating.\n"
    )]
    Lint {
        #[arg(value_name = "DIR", default_value = ".")]
        dir: PathBuf,
    },

    /// Print one anchor as it would be included.
    Get {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        #[arg(value_name = "NAME")]
        name: String,
    },
}

/// Run the CLI with parsed arguments
pub fn run(cli: Cli) -> Result<()> {
    let render_config = RenderConfig::with_pretty(cli.format, cli.pretty);
    let jobs = cli.jobs.unwrap_or(0);

    match cli.command {
        Commands::Include {
            path,
            base,
            dry_run,
        } => {
            let options = ApplyOptions {
                base: base.map(IncludeBase::Root).unwrap_or_default(),
                dry_run,
                jobs,
            };
            run_include(&path, &options, render_config)
        }

        Commands::Book {
            src,
            out,
            name,
            include_root,
            manifest,
            title,
            authors,
            summary_only,
            no_clean,
        } => {
            let name = name.unwrap_or_else(|| book_name(&out));
            let mut spec = BookSpec::new(name, src, out);
            spec.include_base = include_root.map(IncludeBase::Root).unwrap_or_default();
            spec.manifest = manifest;
            spec.title = title;
            spec.authors = authors;
            spec.summary_only = summary_only;
            spec.clean = !no_clean;
            run_books(&[spec], jobs, render_config)
        }

        Commands::Build { config, only } => {
            let config = Config::load(config.as_deref()).context("cannot load build config")?;
            let specs = config.book_specs(&only)?;
            let jobs = cli.jobs.or(config.jobs).unwrap_or(0);
            run_books(&specs, jobs, render_config)
        }

        Commands::Combine { books_dir, out } => {
            crate::flows::combine::run_combine(&books_dir, &out, render_config)
        }

        Commands::Anchors { action } => match action {
            AnchorCommands::Lint { dir } => crate::anchors::lint::run_lint(&dir, render_config),
            AnchorCommands::Get { file, name } => {
                crate::anchors::api::run_get(&file, &name, render_config)
            }
        },
    }
}

fn book_name(out: &std::path::Path) -> String {
    out.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "book".to_string())
}
