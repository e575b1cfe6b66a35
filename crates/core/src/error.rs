use thiserror::Error;

/// Errors surfaced while preprocessing a slide document.
///
/// Most conditions in this crate are deliberately non-fatal: malformed
/// tables pass through verbatim, missing highlighters degrade to escaped
/// text, and overflow findings become warnings on the stats record. The
/// variants here cover the cases where no sensible output exists.
#[derive(Debug, Error)]
pub enum PreprocessError {
    /// Frontmatter failed to parse.
    #[error(transparent)]
    Frontmatter(#[from] FrontmatterError),
    /// Poster-specific structural failure.
    #[error(transparent)]
    Poster(#[from] PosterError),
}

/// Errors emitted while locating or parsing YAML frontmatter.
#[derive(Debug, Error)]
pub enum FrontmatterError {
    /// Unclosed YAML fence (missing terminating `---`).
    #[error("Unterminated YAML frontmatter block: expected closing '---'")]
    Unterminated,
    /// YAML failed to parse.
    #[error("Frontmatter parse error: {0}")]
    Parse(String),
    /// Top-level YAML node was not a mapping.
    #[error("Frontmatter must be a YAML mapping at the top level")]
    InvalidRootType,
    /// A required key is missing or carries an unusable value.
    #[error("Invalid frontmatter: {0}")]
    Invalid(String),
}

/// Errors from poster grid-layout parsing.
#[derive(Debug, Error)]
pub enum PosterError {
    /// The layout block contained no non-blank lines.
    #[error("Empty layout")]
    EmptyLayout,
    /// Grid rows have differing lengths.
    #[error("Ragged rows: row lengths are {0:?}")]
    RaggedRows(Vec<usize>),
    /// A labelled region does not form a solid rectangle.
    #[error("Region '{0}' is not rectangular")]
    NonRectangular(char),
    /// The document has no ```poster-layout``` block.
    #[error("Missing ```poster-layout``` block in poster markdown")]
    MissingLayout,
}
