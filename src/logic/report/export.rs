use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::types::ReportEntry;
use crate::logic::error::PipelineResult;

/// Write one JSON object per entry. Returns the number of lines written.
pub fn to_jsonl(entries: &[ReportEntry], target_path: impl AsRef<Path>) -> PipelineResult<usize> {
    let target_path = target_path.as_ref();

    // Create target file (truncate if exists)
    let mut output = BufWriter::new(File::create(target_path)?);
    for entry in entries {
        serde_json::to_writer(&mut output, entry)?;
        output.write_all(b"\n")?;
    }
    output.flush()?;

    log::info!("Exported {} report entries to {}", entries.len(), target_path.display());
    Ok(entries.len())
}
