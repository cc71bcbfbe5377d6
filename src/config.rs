//! Parser limits.

/// Default upper bound on the total size of one header block.
pub const DEFAULT_MAX_HEADER_BYTES: usize = 10 << 20; // 10 MB
/// Default upper bound on the number of fields in one header block.
pub const DEFAULT_MAX_HEADERS: usize = 10000;
/// Default upper bound on a single body or part.
pub const DEFAULT_MAX_PART_BYTES: usize = 32 << 20; // 32 MB
/// Default nesting limit for multipart containers.
pub const DEFAULT_MAX_DEPTH: usize = 8;

/// Limits applied while decoding a message.
///
/// # Examples
///
/// ```
/// use tokio_mailutil::ParserConfig;
///
/// let config = ParserConfig::default()
///     .with_max_part_bytes(1 << 20)
///     .with_max_depth(2);
/// assert_eq!(config.max_part_bytes, 1 << 20);
/// assert_eq!(config.max_depth, 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserConfig {
    /// Maximum bytes in a header block (top-level or part).
    pub max_header_bytes: usize,
    /// Maximum number of fields in a header block.
    pub max_headers: usize,
    /// Maximum bytes in a message body or a single part body.
    pub max_part_bytes: usize,
    /// Maximum multipart nesting depth; the top-level container is depth 1,
    /// so 0 rejects every multipart message.
    pub max_depth: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_header_bytes: DEFAULT_MAX_HEADER_BYTES,
            max_headers: DEFAULT_MAX_HEADERS,
            max_part_bytes: DEFAULT_MAX_PART_BYTES,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ParserConfig {
    /// Sets the header block size limit.
    #[must_use]
    pub fn with_max_header_bytes(mut self, n: usize) -> Self {
        self.max_header_bytes = n;
        self
    }

    /// Sets the header field count limit.
    #[must_use]
    pub fn with_max_headers(mut self, n: usize) -> Self {
        self.max_headers = n;
        self
    }

    /// Sets the body/part size limit.
    #[must_use]
    pub fn with_max_part_bytes(mut self, n: usize) -> Self {
        self.max_part_bytes = n;
        self
    }

    /// Sets the multipart nesting limit.
    #[must_use]
    pub fn with_max_depth(mut self, n: usize) -> Self {
        self.max_depth = n;
        self
    }
}
