use crate::error::{Result, SyllabusSplitterError};
use crate::services::naming::{DuplicateResolver, NameSanitizer};
use crate::services::pdf::{PageTextSource, SegmentExtractor};
use crate::services::scanner::MarkerScanner;
use crate::types::{
    CourseFile, CourseSegment, ProcessedCourse, ProcessingOutcome, ProcessingResult,
    SegmentFailure, SegmentationPlan,
};
use tracing::{debug, error, info};

pub struct RangeAssigner;

impl RangeAssigner {
    /// Turns marker pages into inclusive ranges: each range ends right before
    /// the next marker page and the last one runs to the end of the document.
    pub fn assign(hit_pages: &[usize], total_pages: usize) -> Result<Vec<(usize, usize)>> {
        if let Some(pair) = hit_pages.windows(2).find(|pair| pair[0] >= pair[1]) {
            return Err(SyllabusSplitterError::InvalidRanges {
                reason: format!(
                    "marker pages must be strictly ascending, got {} then {}",
                    pair[0], pair[1]
                ),
            });
        }
        if let Some(last) = hit_pages.last() {
            if *last >= total_pages {
                return Err(SyllabusSplitterError::InvalidRanges {
                    reason: format!(
                        "marker page {} is outside a document of {} pages",
                        last, total_pages
                    ),
                });
            }
        }

        let ranges = hit_pages
            .iter()
            .enumerate()
            .map(|(idx, &start)| {
                let end = hit_pages
                    .get(idx + 1)
                    .map(|next| next - 1)
                    .unwrap_or(total_pages - 1);
                (start, end)
            })
            .collect();

        Ok(ranges)
    }
}

/// Splits a composite syllabus PDF into one segment per course.
pub struct SegmentationEngine {
    scanner: MarkerScanner,
}

impl SegmentationEngine {
    pub fn new() -> Self {
        Self {
            scanner: MarkerScanner::new(),
        }
    }

    /// Detects courses and their page ranges without copying any page.
    pub fn plan<S: PageTextSource + ?Sized>(&self, source: &S) -> Result<SegmentationPlan> {
        let total_pages = source.page_count();
        let hits = self.scanner.scan(source);

        if hits.is_empty() {
            return Ok(SegmentationPlan {
                total_pages,
                ..SegmentationPlan::default()
            });
        }

        let hit_pages: Vec<usize> = hits.iter().map(|hit| hit.page_index).collect();
        let mut ranges = RangeAssigner::assign(&hit_pages, total_pages)?;

        // Pages ahead of the first marker belong to the first course
        if let Some(first) = ranges.first_mut() {
            if first.0 > 0 {
                debug!(
                    "Attaching {} leading pages to the first course",
                    first.0
                );
                first.0 = 0;
            }
        }

        let mut resolver = DuplicateResolver::new();
        let names = resolver.resolve_all(
            hits.iter()
                .map(|hit| NameSanitizer::sanitize(&hit.raw_title)),
        );

        let segments = names
            .into_iter()
            .zip(ranges)
            .map(|(name, (start, end))| CourseSegment::new(name, start, end))
            .collect();

        Ok(SegmentationPlan {
            total_pages,
            segments,
            unknown_titles: resolver.unknown_count(),
            hits,
        })
    }

    /// Plans the document and copies every segment into its own PDF.
    ///
    /// A segment whose copy fails is reported in `failures`; the others are
    /// still produced.
    pub fn process<D>(&self, document: &D) -> Result<ProcessingResult>
    where
        D: PageTextSource + SegmentExtractor + ?Sized,
    {
        let plan = self.plan(document)?;

        if plan.is_empty() {
            info!("No courses found in {} pages", plan.total_pages);
            return Ok(ProcessingResult::no_courses(plan.total_pages));
        }

        info!("Detected {} courses", plan.segments.len());

        let mut courses = Vec::with_capacity(plan.segments.len());
        let mut failures = Vec::new();

        for segment in plan.segments {
            match document.extract_range(segment.start_page, segment.end_page) {
                Ok(bytes) => {
                    debug!(
                        "Created '{}' with {} pages ({})",
                        segment.name,
                        segment.page_count(),
                        segment.display_range()
                    );
                    courses.push(ProcessedCourse {
                        file: CourseFile {
                            name: segment.name.clone(),
                            bytes,
                        },
                        segment,
                    });
                }
                Err(e) => {
                    error!("Failed to create '{}': {}", segment.name, e);
                    failures.push(SegmentFailure {
                        segment,
                        reason: e.to_string(),
                    });
                }
            }
        }

        let message = format!("Se procesaron {} cursos exitosamente", courses.len());

        Ok(ProcessingResult {
            total_pages: plan.total_pages,
            courses,
            failures,
            unknown_titles: plan.unknown_titles,
            message,
            outcome: ProcessingOutcome::Processed,
        })
    }
}

impl Default for SegmentationEngine {
    fn default() -> Self {
        Self::new()
    }
}
