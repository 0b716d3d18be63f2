use crate::error::Result;
use std::io::{Cursor, Write};
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub struct ArchiveBuilder;

impl ArchiveBuilder {
    /// Deflated ZIP with every file placed under `folder/`.
    pub fn build_zip(folder: &str, files: &[(String, Vec<u8>)]) -> Result<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for (filename, bytes) in files {
            writer.start_file(format!("{}/{}", folder, filename), options)?;
            writer.write_all(bytes)?;
        }

        let archive = writer.finish()?.into_inner();
        debug!("Bundled {} files into {} bytes", files.len(), archive.len());
        Ok(archive)
    }
}
