mod audit;
mod cleaner;
mod collector;
mod combiner;
mod config;
mod extractor;
mod filter;
mod html;
mod numerals;
mod profiles;
mod progress;
mod records;
mod refs;
mod segment;
mod session;
mod urls;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use config::{Backend, Settings};
use numerals::NumeralStyle;
use profiles::{DocumentProfile, Family, Preset};
use records::Envelope;
use session::Session;

#[derive(Parser)]
#[command(name = "verse_scraper", about = "Sanskrit verse scraper and document segmenter")]
struct Cli {
    /// Page fetch backend (overrides config)
    #[arg(long, global = true)]
    backend: Option<Backend>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect document links from the listing page
    Collect {
        /// Listing page URL
        #[arg(long)]
        url: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Keep the links whose pages contain numbered verses
    Filter {
        #[arg(short, long)]
        input: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Extract verses from filtered pages into batch files
    Extract {
        #[arg(short, long)]
        input: Option<PathBuf>,
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// URLs per batch file
        #[arg(short = 'n', long)]
        batch_size: Option<usize>,
    },
    /// Merge batch files into one output file
    Combine {
        #[arg(long)]
        input_dir: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Keep batch refs as written (no separator rewrite)
        #[arg(long)]
        keep_refs: bool,
    },
    /// collect + filter + extract + combine in one pipeline
    Run,
    /// Segment a Markdown/text (or saved HTML) document into verses
    Parse(ParseArgs),
    /// Strip leading labels from verses in batch files
    Clean {
        #[arg(long)]
        input_dir: Option<PathBuf>,
        #[arg(long, default_value = "processed_verses")]
        output_dir: PathBuf,
        #[arg(long, default_value = "modified_verses")]
        modified_dir: PathBuf,
    },
    /// Report verses with Latin text and duplicate refs
    Check {
        #[arg(default_value = "output.json")]
        file: PathBuf,
    },
    /// Normalise refs in every output.json below a directory
    Refs { root: PathBuf },
}

#[derive(Args)]
struct ParseArgs {
    input: PathBuf,
    /// Known document layout
    #[arg(short, long, conflicts_with = "family", required_unless_present = "family")]
    preset: Option<Preset>,
    /// Generic layout (needs --name)
    #[arg(short, long, requires = "name")]
    family: Option<Family>,
    /// Document name used as the ref prefix
    #[arg(long)]
    name: Option<String>,
    /// Digit script for ref labels
    #[arg(long)]
    numerals: Option<NumeralStyle>,
    #[arg(long)]
    envelope: Option<Envelope>,
    #[arg(short, long, default_value = "output.json")]
    output: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let mut settings = Settings::load()?;
    if let Some(backend) = cli.backend {
        settings.fetch.backend = backend;
    }

    let result = match cli.command {
        Commands::Collect { url, output } => {
            if let Some(url) = url {
                settings.collect.listing_url = url;
            }
            if let Some(output) = output {
                settings.collect.output = output;
            }
            run_collect(&settings).await.map(|_| ())
        }
        Commands::Filter { input, output } => {
            if let Some(input) = input {
                settings.filter.input = input;
            }
            if let Some(output) = output {
                settings.filter.output = output;
            }
            run_filter(&settings).await.map(|_| ())
        }
        Commands::Extract {
            input,
            output_dir,
            batch_size,
        } => {
            if let Some(input) = input {
                settings.extract.input = input;
            }
            if let Some(dir) = output_dir {
                settings.extract.output_dir = dir;
            }
            if let Some(n) = batch_size {
                settings.extract.batch_size = n;
            }
            run_extract(&settings).await.map(|_| ())
        }
        Commands::Combine {
            input_dir,
            output,
            keep_refs,
        } => {
            if let Some(dir) = input_dir {
                settings.combine.input_dir = dir;
            }
            if let Some(output) = output {
                settings.combine.output = output;
            }
            if keep_refs {
                settings.combine.rewrite_refs = false;
            }
            run_combine(&settings).map(|_| ())
        }
        Commands::Run => run_pipeline(settings).await,
        Commands::Parse(args) => run_parse(args),
        Commands::Clean {
            input_dir,
            output_dir,
            modified_dir,
        } => {
            let input_dir = input_dir.unwrap_or_else(|| settings.combine.input_dir.clone());
            match cleaner::clean_batches(&input_dir, &settings.combine.prefix, &output_dir, &modified_dir)? {
                Some(stats) => {
                    println!(
                        "Cleaned {} batches ({} failed): {} verses, {} modified.",
                        stats.batches, stats.failed, stats.verses, stats.modified
                    );
                    println!("Processed: {}  Log: {}", output_dir.display(), modified_dir.display());
                }
                None => println!("Nothing to clean."),
            }
            Ok(())
        }
        Commands::Check { file } => {
            let problems = audit::check_file(&file)?;
            if problems > 0 {
                println!("\n{} problems found.", problems);
            }
            Ok(())
        }
        Commands::Refs { root } => {
            let stats = refs::normalize_tree(&root)?;
            println!(
                "Updated {} records across {} {} files ({} failed).",
                stats.changed_records,
                stats.files,
                refs::TARGET_FILE,
                stats.failed
            );
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

/// Each stage returns whether it produced output for the next one.
async fn run_collect(settings: &Settings) -> anyhow::Result<bool> {
    let links = {
        let mut session = Session::open(&settings.fetch)?;
        collector::collect_links(&mut session, &settings.collect).await?
    };
    if links.is_empty() {
        println!("No document links collected; nothing written.");
        return Ok(false);
    }
    urls::write_urls(&settings.collect.output, &links)?;
    println!(
        "Collected {} links into {}",
        links.len(),
        settings.collect.output.display()
    );
    Ok(true)
}

async fn run_filter(settings: &Settings) -> anyhow::Result<bool> {
    let stats = {
        let mut session = Session::open(&settings.fetch)?;
        filter::filter_file(&mut session, &settings.filter).await?
    };
    let Some(stats) = stats else {
        return Ok(false);
    };
    if stats.kept == 0 {
        println!(
            "No URLs contained verse markers ({} checked, {} failed); nothing written.",
            stats.checked, stats.failed
        );
        return Ok(false);
    }
    println!(
        "Kept {} of {} URLs ({} failed) in {}",
        stats.kept,
        stats.checked,
        stats.failed,
        settings.filter.output.display()
    );
    Ok(true)
}

async fn run_extract(settings: &Settings) -> anyhow::Result<bool> {
    let input = urls::read_urls(&settings.extract.input)?;
    if input.is_empty() {
        println!("No URLs in {}.", settings.extract.input.display());
        return Ok(false);
    }
    println!(
        "Extracting verses from {} URLs in batches of {}...",
        input.len(),
        settings.extract.batch_size
    );
    let stats = {
        let mut session = Session::open(&settings.fetch)?;
        extractor::extract_batches(&mut session, &input, &settings.extract).await?
    };
    println!(
        "Done: {} URLs ({} ok, {} skipped, {} errors), {} verses in {} batch files.",
        stats.urls,
        stats.pages_ok,
        stats.skipped,
        stats.failed,
        stats.verses,
        stats.batch_files.len()
    );
    Ok(!stats.batch_files.is_empty())
}

fn run_combine(settings: &Settings) -> anyhow::Result<bool> {
    match combiner::combine(&settings.combine)? {
        Some(stats) => {
            println!(
                "Combined {} batches ({} unreadable) into {}: {} verses, {} duplicate refs.",
                stats.batches,
                stats.unreadable,
                settings.combine.output.display(),
                stats.verses,
                stats.duplicates
            );
            Ok(true)
        }
        None => Ok(false),
    }
}

async fn run_pipeline(mut settings: Settings) -> anyhow::Result<()> {
    // Each stage reads what the previous one wrote.
    settings.filter.input = settings.collect.output.clone();
    settings.extract.input = settings.filter.output.clone();
    settings.combine.input_dir = settings.extract.output_dir.clone();
    settings.combine.prefix = settings.extract.prefix.clone();
    settings.combine.batch_separator = settings.extract.ref_separator.clone();

    let t = Instant::now();
    println!("Pipeline: collecting links...");
    let ok = run_collect(&settings).await?;
    println!("Collect finished in {}", format_duration(t.elapsed()));
    if !ok {
        return Ok(());
    }

    let t = Instant::now();
    println!("Pipeline: filtering links...");
    let ok = run_filter(&settings).await?;
    println!("Filter finished in {}", format_duration(t.elapsed()));
    if !ok {
        return Ok(());
    }

    let t = Instant::now();
    println!("Pipeline: extracting verses...");
    let ok = run_extract(&settings).await?;
    println!("Extract finished in {}", format_duration(t.elapsed()));
    if !ok {
        return Ok(());
    }

    let t = Instant::now();
    run_combine(&settings)?;
    println!("Combine finished in {}", format_duration(t.elapsed()));
    Ok(())
}

fn run_parse(args: ParseArgs) -> anyhow::Result<()> {
    let mut profile = match (args.preset, args.family) {
        (Some(preset), _) => DocumentProfile::preset(preset),
        (None, Some(family)) => {
            let name = args.name.as_deref().context("--family needs --name")?;
            DocumentProfile::family(family, name, args.numerals.unwrap_or(NumeralStyle::Source))
        }
        (None, None) => anyhow::bail!("Pass --preset or --family"),
    };
    if let Some(name) = args.name {
        profile.name = name;
    }
    if let Some(style) = args.numerals {
        profile.numerals = style;
    }
    if let Some(envelope) = args.envelope {
        profile.envelope = envelope;
    }

    let verses = profile.parse_file(&args.input)?;
    if verses.is_empty() {
        println!("No verses found in {}; nothing written.", args.input.display());
        return Ok(());
    }
    records::report_duplicates(&profile.name, &verses);
    records::write_records(&args.output, &verses, profile.envelope)?;
    println!(
        "Wrote {} verses from {} to {}",
        verses.len(),
        args.input.display(),
        args.output.display()
    );
    Ok(())
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
