//! # Syllabus Splitter Library
//!
//! Splits a composite PDF of course syllabi into one PDF per course. Every
//! syllabus starts on a page containing `Sílabo del Curso`; the course title
//! is the first line after the marker that is not a template field.
//!
//! ## Example Usage
//!
//! ```no_run
//! use syllabus_splitter::{PdfDocument, SegmentationEngine};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bytes = std::fs::read("silabos.pdf")?;
//!     let document = PdfDocument::from_bytes(&bytes)?;
//!
//!     let result = SegmentationEngine::new().process(&document)?;
//!     for entry in result.manifest() {
//!         println!("{} -> pages {}", entry.filename, entry.range);
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod server;
pub mod services;
pub mod types;

// Re-export main types and services for easier usage
pub use error::{Result, SyllabusSplitterError};
pub use services::{
    ArchiveBuilder, ContentFetcher, DuplicateResolver, MarkerScanner, MemoryResultStore,
    NameExtractor, NameSanitizer, OutputWriter, PageTextSource, PdfDocument, RangeAssigner,
    ResultStore, SegmentExtractor, SegmentationEngine,
};
pub use types::{
    CourseFile, CourseSegment, DocumentMetadata, ManifestEntry, MarkerHit, ProcessedCourse,
    ProcessingOutcome, ProcessingResult, SegmentFailure, SegmentationPlan, SourceType,
    MARKER,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
