//! Offline chunking CLI: turns extracted reference pages into the chunk
//! source consumed by the vector index.
//!
//! Input is a JSON array of `{"page": n, "text": "..."}` objects in document
//! order (PDF text extraction itself happens upstream).
//!
//! Usage: extract_chunks <pages.json> [--out chunks.json]
//!        [--min-words 300] [--max-words 500] [--overlap-words 60]

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};

use aftercare_core::chunker::{chunk_pages, ChunkerConfig};
use aftercare_core::models::Page;

struct Args {
    input: PathBuf,
    out: PathBuf,
    min_words: usize,
    max_words: usize,
    overlap_words: usize,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut input: Option<PathBuf> = None;
    let mut out: Option<PathBuf> = None;
    let mut min_words = 300usize;
    let mut max_words = 500usize;
    let mut overlap_words = 60usize;

    let mut argv = std::env::args().skip(1);
    while let Some(arg) = argv.next() {
        match arg.as_str() {
            "--out" => {
                out = Some(argv.next().context("--out requires a path")?.into());
            }
            "--min-words" => {
                min_words = argv.next().context("--min-words requires a value")?.parse()?;
            }
            "--max-words" => {
                max_words = argv.next().context("--max-words requires a value")?.parse()?;
            }
            "--overlap-words" => {
                overlap_words = argv
                    .next()
                    .context("--overlap-words requires a value")?
                    .parse()?;
            }
            other if input.is_none() => input = Some(PathBuf::from(other)),
            other => bail!("unexpected argument: {other}"),
        }
    }

    let Some(input) = input else {
        bail!(
            "usage: extract_chunks <pages.json> [--out chunks.json] \
             [--min-words N] [--max-words N] [--overlap-words N]"
        );
    };
    Ok(Args {
        out: out.unwrap_or_else(|| PathBuf::from("chunks.json")),
        input,
        min_words,
        max_words,
        overlap_words,
    })
}

fn main() -> anyhow::Result<()> {
    let args = parse_args()?;

    let raw = std::fs::read_to_string(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;
    let pages: Vec<Page> = serde_json::from_str(&raw)?;

    let file_label = args
        .input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("reference")
        .to_string();
    let config = ChunkerConfig {
        min_words: args.min_words,
        max_words: args.max_words,
        overlap_words: args.overlap_words,
        file_label,
    };

    let chunks = chunk_pages(&pages, &config);

    if let Some(parent) = Path::new(&args.out).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(&args.out, serde_json::to_string(&chunks)?)?;
    println!("Wrote {} chunks to {}", chunks.len(), args.out.display());
    Ok(())
}
