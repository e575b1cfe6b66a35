//! slidecraft - content-aware preprocessor for Marp slide decks

use std::fs;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;

use slidecraft_core::{HeightModel, SplitOptions, process_markdown, process_poster};

#[derive(Parser)]
#[command(name = "slidecraft")]
#[command(version, about = "Content-aware preprocessor for Marp slide decks", long_about = None)]
#[command(after_help = "EXAMPLES:
    slidecraft deck.md deck.out.md                 Paginate and auto-scale a deck
    slidecraft -l 15 -r 6 deck.md deck.out.md      Tighter code and table budgets
    slidecraft --poster poster.md poster.out.md    Expand a poster grid layout")]
struct Cli {
    /// Input markdown file
    #[arg(value_name = "INPUT")]
    input: String,

    /// Output processed markdown file
    #[arg(value_name = "OUTPUT")]
    output: String,

    /// Maximum lines per code block before splitting
    #[arg(short = 'l', long, default_value_t = 20)]
    max_lines: usize,

    /// Maximum data rows per table before splitting
    #[arg(short = 'r', long, default_value_t = 8)]
    max_table_rows: usize,

    /// Disable code block and table splitting
    #[arg(long)]
    no_split: bool,

    /// Treat the input as a poster document with an ASCII grid layout
    #[arg(long)]
    poster: bool,

    /// Print run statistics as JSON to stdout
    #[arg(long)]
    stats_json: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let content = fs::read_to_string(&cli.input)
        .with_context(|| format!("failed to read {}", cli.input))?;

    if cli.poster {
        return run_poster(cli, &content);
    }

    let options = SplitOptions {
        max_code_lines: cli.max_lines,
        max_table_rows: cli.max_table_rows,
        no_split: cli.no_split,
    };
    let out = process_markdown(&content, &options, &HeightModel::default());

    fs::write(&cli.output, &out.content)
        .with_context(|| format!("failed to write {}", cli.output))?;

    if !out.stats.warnings.is_empty() {
        eprintln!("\n=== Slide analysis warnings for {} ===", cli.input);
        for warning in &out.stats.warnings {
            eprintln!("  {warning}");
        }
        eprintln!();
    }

    if cli.stats_json {
        println!("{}", serde_json::to_string_pretty(&out.stats)?);
        return Ok(());
    }

    let stats = &out.stats;
    println!(
        "Processed: {} input lines -> {} output lines",
        stats.input_lines, stats.output_lines
    );
    println!("Code blocks found: {}", stats.code_blocks_found);
    if stats.code_blocks_split > 0 {
        println!("Code blocks split: {}", stats.code_blocks_split);
    }
    println!("Tables found: {}", stats.tables_found);
    if stats.tables_split > 0 {
        println!("Tables split: {}", stats.tables_split);
    }
    if stats.slides_added > 0 {
        println!("Additional slides created: {}", stats.slides_added);
    }
    if stats.arrows_processed > 0 {
        println!("Arrows processed: {}", stats.arrows_processed);
    }
    if stats.flow_diagrams_processed > 0 {
        println!("Flow diagrams generated: {}", stats.flow_diagrams_processed);
    }
    if stats.scale_classes_injected > 0 {
        println!("Scale classes auto-injected: {}", stats.scale_classes_injected);
    }
    if stats.overflow_warnings > 0 {
        println!("Overflow warnings: {}", stats.overflow_warnings);
    }
    if stats.split_directives_found > 0 {
        println!("Split directives found: {}", stats.split_directives_found);
    }

    Ok(())
}

fn run_poster(cli: &Cli, content: &str) -> anyhow::Result<()> {
    let out = process_poster(content)
        .with_context(|| format!("failed to process poster {}", cli.input))?;

    fs::write(&cli.output, &out.content)
        .with_context(|| format!("failed to write {}", cli.output))?;

    for warning in &out.stats.warnings {
        eprintln!("warning: {warning}");
    }

    if cli.stats_json {
        println!("{}", serde_json::to_string_pretty(&out.stats)?);
    } else {
        println!("Sections: {}", out.stats.sections);
        println!("Grid: {}", out.stats.grid_size);
    }

    Ok(())
}
