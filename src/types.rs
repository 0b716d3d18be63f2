use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Fixed text that opens every syllabus inside the composite PDF.
pub const MARKER: &str = "Sílabo del Curso";

/// Default folder for CLI output and the top-level folder inside ZIP bundles.
pub const DEFAULT_OUTPUT_FOLDER: &str = "Convalidaciones_UPC";

/// Prefix of the synthetic name given to courses without a readable title.
pub const UNKNOWN_COURSE_PREFIX: &str = "Curso_Desconocido";

pub const NO_COURSES_MESSAGE: &str = "No se encontraron cursos";

/// A page that contains the marker, with the title guessed from the text after it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerHit {
    pub page_index: usize,
    pub raw_title: String,
}

/// Contiguous, inclusive, 0-based page range assigned to one course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseSegment {
    pub name: String,
    pub start_page: usize,
    pub end_page: usize,
}

impl CourseSegment {
    pub fn new(name: impl Into<String>, start_page: usize, end_page: usize) -> Self {
        Self {
            name: name.into(),
            start_page,
            end_page,
        }
    }

    pub fn page_count(&self) -> usize {
        self.end_page - self.start_page + 1
    }

    /// 1-indexed inclusive range, e.g. `"1-5"`.
    pub fn display_range(&self) -> String {
        format!("{}-{}", self.start_page + 1, self.end_page + 1)
    }

    pub fn filename(&self) -> String {
        format!("{}.pdf", self.name)
    }

    pub fn manifest_entry(&self) -> ManifestEntry {
        ManifestEntry {
            name: self.name.clone(),
            filename: self.filename(),
            page_count: self.page_count(),
            range: self.display_range(),
        }
    }
}

/// Standalone PDF produced for one segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl CourseFile {
    pub fn filename(&self) -> String {
        format!("{}.pdf", self.name)
    }
}

#[derive(Debug, Clone)]
pub struct ProcessedCourse {
    pub segment: CourseSegment,
    pub file: CourseFile,
}

/// A segment whose page copy failed. Sibling segments are unaffected.
#[derive(Debug, Clone, Serialize)]
pub struct SegmentFailure {
    pub segment: CourseSegment,
    pub reason: String,
}

/// Serialized course record shared by the CLI manifest and the HTTP API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub name: String,
    pub filename: String,
    pub page_count: usize,
    pub range: String,
}

/// Output of the detection phase, before any page is copied.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SegmentationPlan {
    pub total_pages: usize,
    pub segments: Vec<CourseSegment>,
    pub unknown_titles: usize,
    /// Marker pages the segments were built from, in page order.
    pub hits: Vec<MarkerHit>,
}

impl SegmentationPlan {
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProcessingOutcome {
    Processed,
    NoCoursesFound,
}

#[derive(Debug, Clone)]
pub struct ProcessingResult {
    pub total_pages: usize,
    pub courses: Vec<ProcessedCourse>,
    pub failures: Vec<SegmentFailure>,
    pub unknown_titles: usize,
    pub message: String,
    pub outcome: ProcessingOutcome,
}

impl ProcessingResult {
    pub fn no_courses(total_pages: usize) -> Self {
        Self {
            total_pages,
            courses: Vec::new(),
            failures: Vec::new(),
            unknown_titles: 0,
            message: NO_COURSES_MESSAGE.to_string(),
            outcome: ProcessingOutcome::NoCoursesFound,
        }
    }

    pub fn has_courses(&self) -> bool {
        self.outcome == ProcessingOutcome::Processed
    }

    pub fn manifest(&self) -> Vec<ManifestEntry> {
        self.courses
            .iter()
            .map(|course| course.segment.manifest_entry())
            .collect()
    }

    /// Filename/bytes pairs in document order.
    pub fn into_files(self) -> Vec<(String, Vec<u8>)> {
        self.courses
            .into_iter()
            .map(|course| (course.file.filename(), course.file.bytes))
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub filename: String,
    pub source_type: SourceType,
    pub fetched_at: String,
    pub size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SourceType {
    LocalFile,
    Url,
}

#[derive(Debug, Clone)]
pub struct SplitConfig {
    pub output_dir: PathBuf,
    pub include_metadata: bool,
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub port: u16,
    pub result_ttl: Duration,
    pub max_results: usize,
    pub max_upload_bytes: usize,
}

impl ServiceConfig {
    /// Upload limit in bytes for a size given in megabytes, clamped to `usize::MAX`.
    pub fn megabytes(mb: u64) -> usize {
        usize::try_from(mb)
            .unwrap_or(usize::MAX)
            .saturating_mul(1024 * 1024)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            result_ttl: Duration::from_secs(3600),
            max_results: 64,
            max_upload_bytes: Self::megabytes(50),
        }
    }
}

#[derive(Debug, Clone)]
pub struct WrittenFile {
    pub name: String,
    pub path: PathBuf,
    pub page_count: usize,
    pub range: String,
}

/// What the CLI writer put on disk, plus per-file failures.
#[derive(Debug, Clone, Default)]
pub struct WriteReport {
    pub written: Vec<WrittenFile>,
    pub failures: Vec<SegmentFailure>,
    pub manifest_file: Option<PathBuf>,
}
