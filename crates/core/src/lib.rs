#![deny(missing_docs)]
//! Slidecraft core: content-aware pagination and scaling for Marp decks,
//! plus the poster grid-layout pipeline.

/// Arrow shorthand rewriting.
pub mod arrows;
/// Backward scan for the callout box enclosing a block.
pub mod boxes;
/// Code fence detection utilities.
pub mod code_fence;
/// Processing options and the content-height model.
pub mod config;
/// The document-level processing pipeline.
pub mod driver;
/// Core error types.
pub mod error;
/// Flow-diagram blocks rendered as SVG.
pub mod flow;
/// YAML frontmatter extraction helpers.
pub mod frontmatter;
/// Per-line syntax highlighting.
pub mod highlight;
/// Slide content analysis and height estimation.
pub mod metrics;
/// Poster grid layouts and section assembly.
pub mod poster;
/// Scale-class decisions and injection.
pub mod scale;
/// Chunked emission of split code blocks and tables.
pub mod split;
/// Pipe-table parsing and HTML generation.
pub mod table;

pub use config::{HeightModel, SplitOptions};
pub use driver::{ProcessOutput, Stats, analyze_and_inject_scaling, process_markdown};
pub use error::{FrontmatterError, PosterError, PreprocessError};
pub use frontmatter::{
    FrontmatterExtraction, PosterFrontmatter, extract_frontmatter, parse_poster_frontmatter,
};
pub use poster::{PosterLayout, PosterOutput, PosterStats, process_poster};
pub use scale::ScaleClass;

pub use arrows::rewrite_arrows;
pub use boxes::detect_enclosing_box;
pub use code_fence::{FenceOpening, detect_fence_opening, is_fence_close};
pub use flow::process_flow_blocks;
pub use metrics::{SlideMetrics, analyze_slide_content};
pub use split::{ChunkBudget, split_code_block, split_table};
pub use table::{Table, parse_table, table_to_html};
