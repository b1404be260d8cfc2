//! Main entry point for the epubinfo CLI application.

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use epubinfo::{Cli, EpubDocument, ZipEntry};

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level())),
        )
        .with_writer(std::io::stderr)
        .init();

    let doc = EpubDocument::open_with(&cli.file, &cli.config())
        .with_context(|| format!("failed to open {}", cli.file))?;

    if cli.list {
        list_entries(doc.entries());
        println!();
    }

    print_metadata(&doc);

    if let Some(ref output) = cli.cover {
        doc.save_cover(output)
            .with_context(|| format!("failed to save cover to {output}"))?;
        if !cli.quiet {
            eprintln!("cover saved to {output}");
        }
    }

    Ok(())
}

/// Print one line per metadata field, followed by the list fields.
fn print_metadata<R: epubinfo::ReadAt>(doc: &EpubDocument<R>) {
    let fields = [
        ("title", doc.title()),
        ("subtitle", doc.subtitle()),
        ("language", doc.language()),
        ("publisher", doc.publisher()),
        ("description", doc.description()),
    ];
    for (name, value) in fields {
        if !value.is_empty() {
            println!("{name}: {value}");
        }
    }

    for i in 0..doc.author_count() {
        if let Some(author) = doc.author(i) {
            println!("author: {author}");
        }
    }
    for i in 0..doc.creator_count() {
        if let Some(creator) = doc.creator(i) {
            println!("creator: {creator}");
        }
    }
    for i in 0..doc.identifier_count() {
        if let Some(identifier) = doc.identifier(i) {
            println!("identifier: {identifier}");
        }
    }
}

/// Print the central directory as a table.
fn list_entries(entries: &[ZipEntry]) {
    println!("{:>10}  {:>10}  {:>6}  Name", "Length", "Size", "Method");
    println!("{}", "-".repeat(50));

    let mut total_uncompressed = 0u64;
    let mut total_compressed = 0u64;
    let mut file_count = 0usize;

    for entry in entries {
        println!(
            "{:>10}  {:>10}  {:>6}  {}",
            entry.uncompressed_size,
            entry.compressed_size,
            entry.compression_method.as_u16(),
            entry.file_name
        );
        if !entry.is_directory() {
            total_uncompressed += entry.uncompressed_size;
            total_compressed += entry.compressed_size;
            file_count += 1;
        }
    }

    println!("{}", "-".repeat(50));
    println!(
        "{:>10}  {:>10}  {:>6}  {} files",
        total_uncompressed, total_compressed, "", file_count
    );
}
