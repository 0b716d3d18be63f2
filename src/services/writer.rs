use crate::error::{Result, SyllabusSplitterError};
use crate::types::{
    DocumentMetadata, ProcessingResult, SegmentFailure, SplitConfig, WriteReport, WrittenFile,
};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info};

pub struct OutputWriter;

impl OutputWriter {
    /// Writes every produced course as `<name>.pdf` into the output directory.
    ///
    /// A name already present on disk gets `_1`, `_2`, ... until the path is
    /// free. A failed write is recorded and the remaining files are still
    /// written.
    pub async fn write_result(
        result: &ProcessingResult,
        source: &DocumentMetadata,
        config: &SplitConfig,
    ) -> Result<WriteReport> {
        Self::ensure_output_directory(&config.output_dir).await?;

        let mut report = WriteReport {
            failures: result.failures.clone(),
            ..WriteReport::default()
        };

        for course in &result.courses {
            let path = Self::unique_path(&config.output_dir, &course.segment.name);

            match fs::write(&path, &course.file.bytes).await {
                Ok(()) => {
                    info!(
                        "✓ {} (pages {}, {} pages) -> {}",
                        course.segment.name,
                        course.segment.display_range(),
                        course.segment.page_count(),
                        path.display()
                    );
                    report.written.push(WrittenFile {
                        name: course.segment.name.clone(),
                        path,
                        page_count: course.segment.page_count(),
                        range: course.segment.display_range(),
                    });
                }
                Err(e) => {
                    error!("✗ Failed to save '{}': {}", course.segment.name, e);
                    report.failures.push(SegmentFailure {
                        segment: course.segment.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        if config.include_metadata {
            let manifest_path = Self::generate_manifest_filename(&config.output_dir, &source.filename);
            Self::write_manifest_file(&manifest_path, result, source, &report).await?;
            report.manifest_file = Some(manifest_path);
        }

        Ok(report)
    }

    async fn ensure_output_directory(output_dir: &Path) -> Result<()> {
        if !output_dir.exists() {
            fs::create_dir_all(output_dir).await.map_err(|e| {
                SyllabusSplitterError::OutputDirectory {
                    reason: format!("Failed to create output directory: {}", e),
                }
            })?;
            info!("Created output directory: {}", output_dir.display());
        }
        Ok(())
    }

    /// First free path among `<name>.pdf`, `<name>_1.pdf`, `<name>_2.pdf`, ...
    pub fn unique_path(output_dir: &Path, name: &str) -> PathBuf {
        let mut path = output_dir.join(format!("{}.pdf", name));
        let mut counter = 1;
        while path.exists() {
            path = output_dir.join(format!("{}_{}.pdf", name, counter));
            counter += 1;
        }
        path
    }

    fn generate_manifest_filename(output_dir: &Path, source_name: &str) -> PathBuf {
        let base_name = Path::new(source_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("document");

        output_dir.join(format!("{}_manifest.json", base_name))
    }

    async fn write_manifest_file(
        manifest_path: &Path,
        result: &ProcessingResult,
        source: &DocumentMetadata,
        report: &WriteReport,
    ) -> Result<()> {
        let manifest = serde_json::json!({
            "source": source,
            "generated_at": chrono::Utc::now().to_rfc3339(),
            "total_pages": result.total_pages,
            "unknown_titles": result.unknown_titles,
            "message": result.message,
            "courses": result.manifest(),
            "written_files": report.written.iter().map(|file| {
                serde_json::json!({
                    "name": file.name,
                    "path": file.path.display().to_string(),
                    "page_count": file.page_count,
                    "range": file.range,
                })
            }).collect::<Vec<_>>(),
            "failures": report.failures,
        });

        let json_content = serde_json::to_string_pretty(&manifest)?;
        fs::write(manifest_path, json_content).await.map_err(|e| {
            SyllabusSplitterError::OutputDirectory {
                reason: format!("Failed to write manifest file: {}", e),
            }
        })?;

        info!("Generated manifest file: {}", manifest_path.display());
        Ok(())
    }
}
