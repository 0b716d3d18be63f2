use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use syllabus_splitter::types::DEFAULT_OUTPUT_FOLDER;

#[derive(Parser)]
#[command(name = "syllabus-split")]
#[command(about = "Split a composite syllabus PDF into one PDF per course")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output directory for course PDFs
    #[arg(short, long, global = true, default_value = DEFAULT_OUTPUT_FOLDER)]
    pub output: PathBuf,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Split a composite PDF into one file per course
    Split(SplitArgs),

    /// Detect courses and page ranges without writing files
    Analyze(AnalyzeArgs),

    /// Check that sources open as PDFs
    Validate(ValidateArgs),

    /// Run the upload/download HTTP service
    Serve(ServeArgs),
}

#[derive(Args)]
pub struct SplitArgs {
    /// Input PDF (file path or URL)
    #[arg(value_name = "SOURCE")]
    pub source: String,

    /// Write a JSON manifest next to the course files
    #[arg(long)]
    pub include_metadata: bool,
}

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Input PDFs (file paths or URLs)
    #[arg(required = true, value_name = "SOURCE")]
    pub sources: Vec<String>,

    /// Output analysis to JSON file
    #[arg(long, value_name = "FILE")]
    pub json_output: Option<PathBuf>,

    /// Show the raw title found after each marker
    #[arg(long)]
    pub detailed: bool,
}

#[derive(Args)]
pub struct ValidateArgs {
    /// Input PDFs (file paths or URLs)
    #[arg(required = true, value_name = "SOURCE")]
    pub sources: Vec<String>,
}

#[derive(Args)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(long, env = "PORT", default_value = "5000")]
    pub port: u16,

    /// Seconds a processed result stays available for download
    #[arg(long, default_value = "3600")]
    pub result_ttl_secs: u64,

    /// Maximum number of processed results kept in memory
    #[arg(long, default_value = "64")]
    pub max_results: usize,

    /// Maximum upload size in megabytes
    #[arg(long, default_value = "50", value_parser = clap::value_parser!(u64).range(1..=4096))]
    pub max_upload_mb: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_limit_bounds() {
        let cli = Cli::try_parse_from(["syllabus-split", "serve", "--max-upload-mb", "4096"]).unwrap();
        match cli.command {
            Commands::Serve(args) => assert_eq!(args.max_upload_mb, 4096),
            _ => panic!("expected serve"),
        }

        for value in ["0", "4097", "18446744073709551615"] {
            assert!(
                Cli::try_parse_from(["syllabus-split", "serve", "--max-upload-mb", value]).is_err(),
                "{} should be rejected",
                value
            );
        }
    }
}
