//! Alignment input through `rust-htslib`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rust_htslib::bam::{self, ext::BamRecordExtensions, record::Aux, record::Cigar, Read, Record};
use rust_htslib::errors::Error as HtslibError;
use thiserror::Error;
use tracing::debug;

use super::types::{AlignmentRecord, Block, BlockKind, CigarOp, CigarOpKind};
use crate::{PipelineConfig, UmiSource};

/// Errors raised while reading alignments.
#[derive(Debug, Error)]
pub enum ReaderError {
    /// The alignment file could not be opened.
    #[error("failed to open alignment file {path}: {source}")]
    Open {
        /// Path that was requested.
        path: PathBuf,
        /// htslib failure.
        source: HtslibError,
    },
    /// htslib failed while decoding or configuring the stream.
    #[error("failed to read alignment record: {0}")]
    Read(#[from] HtslibError),
    /// A record refers to a target id missing from the header.
    #[error("record references unknown target id {0}")]
    UnknownReference(i32),
}

/// Iterator over the records of a BAM/SAM/CRAM file, converted for the pipeline.
pub struct BamRecordSource {
    reader: bam::Reader,
    record: Record,
    references: Vec<Arc<str>>,
    barcode_tag: Vec<u8>,
    umi_source: UmiSource,
}

impl std::fmt::Debug for BamRecordSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BamRecordSource")
            .field("references", &self.references.len())
            .field("barcode_tag", &String::from_utf8_lossy(&self.barcode_tag))
            .field("umi_source", &self.umi_source)
            .finish()
    }
}

impl BamRecordSource {
    /// Open `path` (format detected by htslib) using the tags from `config`.
    pub fn from_path<P: AsRef<Path>>(path: P, config: &PipelineConfig) -> Result<Self, ReaderError> {
        let path = path.as_ref();
        let mut reader = bam::Reader::from_path(path).map_err(|source| ReaderError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        if config.threads > 0 {
            reader.set_threads(config.threads)?;
        }

        let references = reference_names(reader.header());
        debug!(path = %path.display(), targets = references.len(), "opened alignment file");

        Ok(Self {
            reader,
            record: Record::new(),
            references,
            barcode_tag: config.barcode_tag.as_bytes().to_vec(),
            umi_source: config.umi_source.clone(),
        })
    }

    /// Reference names from the header, indexed by target id.
    pub fn references(&self) -> &[Arc<str>] {
        &self.references
    }
}

impl Iterator for BamRecordSource {
    type Item = Result<AlignmentRecord, ReaderError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.read(&mut self.record)? {
            Ok(()) => Some(convert_record(
                &self.record,
                &self.references,
                &self.barcode_tag,
                &self.umi_source,
            )),
            Err(err) => Some(Err(ReaderError::Read(err))),
        }
    }
}

fn reference_names(header: &bam::HeaderView) -> Vec<Arc<str>> {
    header
        .target_names()
        .into_iter()
        .map(|name| Arc::from(String::from_utf8_lossy(name)))
        .collect()
}

/// Convert an htslib record into the pipeline's view of it.
///
/// Positions are shifted to 1-based coordinates; the reader's aligned blocks
/// are attached as precomputed match blocks.
pub fn convert_record(
    record: &Record,
    references: &[Arc<str>],
    barcode_tag: &[u8],
    umi_source: &UmiSource,
) -> Result<AlignmentRecord, ReaderError> {
    let chrom = match record.tid() {
        tid if tid < 0 => None,
        tid => Some(
            references
                .get(tid as usize)
                .cloned()
                .ok_or(ReaderError::UnknownReference(tid))?,
        ),
    };

    let barcode = string_tag(record, barcode_tag);
    let umi = match umi_source {
        UmiSource::Tag(tag) => string_tag(record, tag.as_bytes()),
        source => std::str::from_utf8(record.qname())
            .ok()
            .and_then(|qname| source.umi_from_read_name(qname))
            .map(str::to_owned),
    };

    let cigar: Vec<CigarOp> = record.cigar().iter().map(convert_cigar).collect();
    // htslib's block iterator cannot walk `B` operators.
    let walkable = cigar.iter().all(|op| op.kind != CigarOpKind::Back);
    let precomputed_blocks = (chrom.is_some() && walkable).then(|| aligned_blocks(record));

    Ok(AlignmentRecord {
        chrom,
        pos: record.pos() + 1,
        cigar,
        barcode,
        umi,
        precomputed_blocks,
    })
}

fn string_tag(record: &Record, tag: &[u8]) -> Option<String> {
    match record.aux(tag) {
        Ok(Aux::String(value)) => Some(value.to_owned()),
        Ok(_) => {
            debug!(tag = %String::from_utf8_lossy(tag), "ignoring non-string tag value");
            None
        }
        Err(_) => None,
    }
}

fn convert_cigar(op: &Cigar) -> CigarOp {
    let (kind, len) = match *op {
        Cigar::Match(len) => (CigarOpKind::Match, len),
        Cigar::Ins(len) => (CigarOpKind::Insertion, len),
        Cigar::Del(len) => (CigarOpKind::Deletion, len),
        Cigar::RefSkip(len) => (CigarOpKind::Skip, len),
        Cigar::SoftClip(len) => (CigarOpKind::SoftClip, len),
        Cigar::HardClip(len) => (CigarOpKind::HardClip, len),
        Cigar::Pad(len) => (CigarOpKind::Pad, len),
        Cigar::Equal(len) => (CigarOpKind::Equal, len),
        Cigar::Diff(len) => (CigarOpKind::Mismatch, len),
    };
    CigarOp::new(kind, len)
}

/// htslib's aligned block pairs, moved to 1-based coordinates.
fn aligned_blocks(record: &Record) -> Vec<Block> {
    record
        .aligned_block_pairs()
        .filter(|(_, [start, end])| end > start)
        .map(|([read_start, _], [start, end])| Block {
            kind: BlockKind::Match,
            read_start: read_start + 1,
            start: start + 1,
            end: end + 1,
        })
        .collect()
}
