/// Shared tuning constants for the crawl/extract pipeline.

/// Browser-like identity sent with every fetch. Several listing sites serve
/// a stripped page (or a 403) to the default reqwest UA.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Connect timeout for article/listing fetches, in seconds.
pub const FETCH_CONNECT_TIMEOUT_SECS: u64 = 10;
/// Read timeout for article/listing fetches, in seconds.
pub const FETCH_READ_TIMEOUT_SECS: u64 = 20;
/// Extra attempts after the first fetch when the server answers 429/503.
pub const FETCH_RETRIES: u32 = 2;
/// Linear backoff unit between fetch retries, in seconds.
pub const FETCH_BACKOFF_SECS: u64 = 2;

/// Article body text shorter than this (after noise stripping) is not worth
/// a model call.
pub const MIN_ARTICLE_CHARS: usize = 200;
/// Chunks shorter than this are dropped instead of being sent to the model.
pub const MIN_CHUNK_CHARS: usize = 200;
/// Window size for article text chunking, in characters.
pub const CHUNK_SIZE: usize = 4000;
/// Overlap duplicated into neighboring chunks so an event straddling a
/// boundary is seen whole by at least one model call.
pub const CHUNK_OVERLAP: usize = 200;
