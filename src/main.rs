mod cli;

use anyhow::Context;
use clap::Parser;
use cli::{AnalyzeArgs, Cli, Commands, ServeArgs, SplitArgs, ValidateArgs};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use syllabus_splitter::server::{self, AppState};
use syllabus_splitter::services::{
    ContentFetcher, MemoryResultStore, OutputWriter, PageTextSource, PdfDocument,
    SegmentationEngine,
};
use syllabus_splitter::types::{ServiceConfig, SplitConfig, MARKER};
use syllabus_splitter::{Result, SyllabusSplitterError};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG wins over --verbose
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .with_target(false)
        .init();

    let result = match &cli.command {
        Commands::Split(args) => handle_split_command(args, &cli.output).await,
        Commands::Analyze(args) => handle_analyze_command(args).await,
        Commands::Validate(args) => handle_validate_command(args).await,
        Commands::Serve(args) => handle_serve_command(args).await,
    };

    if let Err(e) = result {
        error!("Operation failed: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

async fn load_document(source: &str) -> Result<(PdfDocument, syllabus_splitter::DocumentMetadata)> {
    let (bytes, metadata) = ContentFetcher::fetch_content(source).await?;
    let document = PdfDocument::from_bytes(&bytes)?;
    Ok((document, metadata))
}

async fn handle_split_command(args: &SplitArgs, output_dir: &Path) -> anyhow::Result<()> {
    info!("Input file: {}", args.source);

    let (document, metadata) = load_document(&args.source)
        .await
        .with_context(|| format!("Cannot open '{}'", args.source))?;
    info!("Total pages in the PDF: {}", document.page_count());

    let result = tokio::task::spawn_blocking(move || SegmentationEngine::new().process(&document))
        .await
        .context("Segmentation task failed")??;

    if !result.has_courses() {
        println!(
            "{} con el marcador '{}'.",
            result.message, MARKER
        );
        return Ok(());
    }

    info!("Courses detected: {}", result.courses.len() + result.failures.len());

    let config = SplitConfig {
        output_dir: output_dir.to_path_buf(),
        include_metadata: args.include_metadata,
    };
    let report = OutputWriter::write_result(&result, &metadata, &config).await?;

    println!("\n{}", "=".repeat(50));
    println!("RESUMEN");
    println!("{}", "=".repeat(50));
    println!("Total de cursos procesados: {}", report.written.len());
    println!("Cursos con nombre desconocido: {}", result.unknown_titles);
    println!("Carpeta de salida: {}/", config.output_dir.display());

    println!("\nLista de cursos:");
    for (idx, file) in report.written.iter().enumerate() {
        println!("  {}. {} ({} páginas)", idx + 1, file.name, file.page_count);
    }

    if !report.failures.is_empty() {
        println!("\nCursos con errores:");
        for failure in &report.failures {
            println!(
                "  - {} (páginas {}): {}",
                failure.segment.name,
                failure.segment.display_range(),
                failure.reason
            );
        }
    }

    if let Some(manifest_file) = &report.manifest_file {
        info!("Manifest: {}", manifest_file.display());
    }

    Ok(())
}

async fn handle_analyze_command(args: &AnalyzeArgs) -> anyhow::Result<()> {
    info!("Starting analysis of {} sources", args.sources.len());

    let validated_sources = ContentFetcher::validate_sources(&args.sources)?;
    let engine = SegmentationEngine::new();
    let mut all_analyses = HashMap::new();

    for source in validated_sources {
        let (document, _) = load_document(&source).await?;
        let plan = engine.plan(&document)?;

        println!("\n=== Analysis for '{}' ===", source);
        println!("Total pages: {}", plan.total_pages);
        println!("Courses found: {}", plan.segments.len());
        println!("Unknown titles: {}", plan.unknown_titles);

        if plan.is_empty() {
            println!("No pages contain '{}'", MARKER);
        }

        for (idx, segment) in plan.segments.iter().enumerate() {
            println!(
                "  {}. {}: pages {} ({} pages)",
                idx + 1,
                segment.name,
                segment.display_range(),
                segment.page_count()
            );
        }

        if args.detailed {
            println!("\nMarker pages:");
            for hit in &plan.hits {
                println!("  Page {}: raw title '{}'", hit.page_index + 1, hit.raw_title);
            }
        }

        all_analyses.insert(source.clone(), plan);
    }

    if let Some(json_path) = &args.json_output {
        let json_content = serde_json::to_string_pretty(&all_analyses)
            .context("Failed to serialize analysis results")?;

        tokio::fs::write(json_path, json_content)
            .await
            .context("Failed to write JSON analysis file")?;

        info!("Analysis results written to: {}", json_path.display());
    }

    Ok(())
}

async fn handle_validate_command(args: &ValidateArgs) -> anyhow::Result<()> {
    info!("Validating {} sources", args.sources.len());

    let mut invalid_sources = Vec::new();

    for source in &args.sources {
        match load_document(source).await {
            Ok((document, _)) => {
                info!("✓ Valid: {} ({} pages)", source, document.page_count());
            }
            Err(e) => {
                warn!("✗ Invalid: {} - {}", source, e);
                invalid_sources.push((source, e.to_string()));
            }
        }
    }

    println!("\n=== Validation Summary ===");
    println!(
        "Valid sources: {}/{}",
        args.sources.len() - invalid_sources.len(),
        args.sources.len()
    );

    if !invalid_sources.is_empty() {
        println!("Invalid sources:");
        let invalid_count = invalid_sources.len();
        for (source, error) in invalid_sources {
            println!("  - {}: {}", source, error);
        }
        return Err(SyllabusSplitterError::UnreadableInput {
            reason: format!("{} sources failed validation", invalid_count),
        }
        .into());
    }

    println!("All sources are valid!");
    Ok(())
}

async fn handle_serve_command(args: &ServeArgs) -> anyhow::Result<()> {
    let config = ServiceConfig {
        port: args.port,
        result_ttl: Duration::from_secs(args.result_ttl_secs),
        max_results: args.max_results,
        max_upload_bytes: ServiceConfig::megabytes(args.max_upload_mb),
    };

    let state = AppState {
        store: Arc::new(MemoryResultStore::new(config.result_ttl, config.max_results)),
    };

    info!(
        "Results kept for {}s, at most {} at a time",
        args.result_ttl_secs, config.max_results
    );
    server::serve(state, config).await
}
