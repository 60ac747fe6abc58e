use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use super::statistics::RunStatistics;
use super::types::Block;

/// One line of a fragment file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FragmentRow<'a> {
    /// Reference contig name.
    pub chrom: &'a str,
    /// Interval start as computed by the block extractor.
    pub start: i64,
    /// Interval end (exclusive).
    pub end: i64,
    /// Cell barcode.
    pub barcode: &'a str,
}

impl<'a> FragmentRow<'a> {
    /// Row for `block` on `chrom` attributed to `barcode`.
    pub fn new(chrom: &'a str, block: &Block, barcode: &'a str) -> Self {
        Self {
            chrom,
            start: block.start,
            end: block.end,
            barcode,
        }
    }
}

impl fmt::Display for FragmentRow<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t1",
            self.chrom, self.start, self.end, self.barcode
        )
    }
}

/// Line-oriented TSV sink for fragment rows.
#[derive(Debug)]
pub struct FragmentWriter<W: Write> {
    inner: W,
}

impl FragmentWriter<BufWriter<File>> {
    /// Create (or truncate) a fragment file at `path`.
    pub fn create<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> FragmentWriter<W> {
    /// Wrap an arbitrary sink.
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Write one row for `block` and count it.
    pub fn emit(
        &mut self,
        chrom: &str,
        block: &Block,
        barcode: &str,
        stats: &mut RunStatistics,
    ) -> io::Result<()> {
        writeln!(self.inner, "{}", FragmentRow::new(chrom, block, barcode))?;
        stats.blocks_written += 1;
        Ok(())
    }

    /// Flush buffered rows and hand back the sink.
    pub fn finish(mut self) -> io::Result<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

/// Render blocks into fragment text (useful for tests and snapshots).
pub fn render_fragments(chrom: &str, blocks: &[Block], barcode: &str) -> String {
    blocks
        .iter()
        .map(|block| format!("{}\n", FragmentRow::new(chrom, block, barcode)))
        .collect()
}
