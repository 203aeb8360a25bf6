//! Report Output - One CSV Row Per Page Image

use std::io::Write;

use serde::Serialize;

use crate::metadata::PageRecord;
use crate::policy::Allowance;

/// A page record joined with its resolution outcome. Absent values become
/// empty CSV cells.
#[derive(Debug, Clone, Serialize)]
pub struct AllowanceRow {
    pub repo: String,
    pub sigil: String,
    pub base: String,
    pub page: u32,
    pub img: String,
    pub download: Option<String>,
    pub variant: Option<u32>,
    pub reason: String,
    pub width: Option<u32>,
    pub dpi: Option<u32>,
}

impl AllowanceRow {
    pub fn new(record: &PageRecord, allowance: Allowance) -> Self {
        Self {
            repo: record.repo.clone(),
            sigil: record.sigil.clone(),
            base: record.base.clone(),
            page: record.page,
            img: record.img.clone(),
            download: allowance.download,
            variant: allowance.variant,
            reason: allowance.reason,
            width: allowance.width,
            dpi: allowance.dpi,
        }
    }
}

/// Write all rows, header included, to `out`.
pub fn write_report<W: Write>(out: W, rows: &[AllowanceRow]) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(out);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
