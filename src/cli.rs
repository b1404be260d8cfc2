use clap::Parser;

use crate::config::{DEFAULT_ARENA_CAPACITY, ExtractConfig};

#[derive(Parser, Debug)]
#[command(name = "epubinfo")]
#[command(version)]
#[command(about = "Print the metadata of an EPUB file", long_about = None)]
#[command(after_help = "Examples:\n  \
  epubinfo book.epub                    print title, authors, identifiers...\n  \
  epubinfo book.epub --cover cover.jpg  also save the cover image\n  \
  epubinfo -l book.epub                 list the archive entries")]
pub struct Cli {
    /// EPUB file path
    #[arg(value_name = "FILE")]
    pub file: String,

    /// Save the cover image to this path
    #[arg(long, value_name = "PATH")]
    pub cover: Option<String>,

    /// List archive entries
    #[arg(short = 'l')]
    pub list: bool,

    /// Arena size in bytes; bounds the size of any single tag or text run
    #[arg(long, value_name = "BYTES", default_value_t = DEFAULT_ARENA_CAPACITY)]
    pub arena_capacity: usize,

    /// Show debug diagnostics
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Quiet mode, only errors are reported
    #[arg(short = 'q')]
    pub quiet: bool,
}

impl Cli {
    pub fn config(&self) -> ExtractConfig {
        ExtractConfig::default().with_arena_capacity(self.arena_capacity)
    }

    /// Default log filter when `RUST_LOG` is unset
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else if self.verbose {
            "debug"
        } else {
            "warn"
        }
    }
}
