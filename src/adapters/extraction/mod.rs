//! Document extraction adapters.

mod http_extractor;
mod mock;

pub use http_extractor::{HttpDocumentExtractor, HttpExtractorConfig};
pub use mock::StaticExtractor;
