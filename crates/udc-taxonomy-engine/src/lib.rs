pub mod codec;
pub mod crawl;
pub mod extensions;
pub mod hierarchy;
pub mod io;
pub mod models;
pub mod parsing;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier usage
pub use codec::{Codec, CodecError, Entry};
pub use crawl::{CrawlError, CrawlOptions, CrawlState, Crawler, FetchError, PageFetcher, PageTarget};
pub use extensions::{ExtensionError, ExtensionStore};
pub use hierarchy::{EdgeKind, Hierarchy};
pub use io::IoError;
pub use models::*;
