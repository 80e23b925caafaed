//! Text-level handling of classification codes: classifying single codes,
//! inferring structural parents, splitting composite expressions and pulling
//! node records out of scraped pages.

pub mod composite;
pub mod cursor;
pub mod grammar;
pub mod parent;
pub mod scrape;

pub use composite::{CompositeError, tokenize};
pub use grammar::{CodeClass, TOP, classify, is_numeric, should_be_root};
pub use parent::infer_parent;
pub use scrape::parse_records;
