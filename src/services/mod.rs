pub mod bundle;
pub mod fetcher;
pub mod naming;
pub mod pdf;
pub mod scanner;
pub mod splitter;
pub mod store;
pub mod writer;

pub use bundle::ArchiveBuilder;
pub use fetcher::ContentFetcher;
pub use naming::{DuplicateResolver, NameSanitizer};
pub use pdf::{PageTextSource, PdfDocument, SegmentExtractor};
pub use scanner::{MarkerScanner, NameExtractor};
pub use splitter::{RangeAssigner, SegmentationEngine};
pub use store::{MemoryResultStore, ResultStore};
pub use writer::OutputWriter;
