use std::fmt;
use std::sync::Arc;

/// Counters accumulated over one pipeline run.
///
/// Owned by the pipeline driver and only read by the progress reporter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStatistics {
    /// Records pulled from the input.
    pub records_read: u64,
    /// Records accepted by the duplicate filter.
    pub records_kept: u64,
    /// Fragment rows written across all outputs.
    pub blocks_written: u64,
    /// Records without a cell barcode.
    pub missing_barcode: u64,
    /// Records dropped as adjacent UMI duplicates.
    pub duplicates: u64,
    /// Accepted records without a reference placement.
    pub unaligned: u64,
    /// Records skipped because their CIGAR could not be interpreted.
    pub skipped_unsupported: u64,
    /// Reference of the most recently accepted record.
    pub last_reference: Option<Arc<str>>,
}

impl RunStatistics {
    /// Fresh counters.
    pub fn new() -> Self {
        Self::default()
    }
}

impl fmt::Display for RunStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Kept rec/Read rec: {}/{}  @sequence: {}  BadBC: {}  Unaligned: {}  Blocks written: {}  SkipDup: {}  Unsupported: {}",
            self.records_kept,
            self.records_read,
            self.last_reference.as_deref().unwrap_or("None"),
            self.missing_barcode,
            self.unaligned,
            self.blocks_written,
            self.duplicates,
            self.skipped_unsupported,
        )
    }
}
