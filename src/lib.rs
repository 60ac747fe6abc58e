//! # rna2fragments
//!
//! Converts aligned single-cell RNA-seq reads into ATAC-style fragment files,
//! so that RNA data can be analysed with single-cell ATAC workflows such as
//! Signac or ArchR.
//!
//! ## Pipeline
//!
//! 1. **Read**: pull alignment records from a position-sorted BAM/SAM/CRAM
//! 2. **Deduplicate**: drop a read whose (UMI, cell barcode) equals the
//!    previous accepted read
//! 3. **Segment**: walk the CIGAR into match blocks and intron blocks
//! 4. **Emit**: write one `chrom\tstart\tend\tbarcode\t1` row per block
//!
//! ## Usage Example
//!
//! ```ignore
//! use rna2fragments::{PipelineConfig, fragments::{BamRecordSource, FragmentWriter, Pipeline}};
//!
//! let config = PipelineConfig::default();
//! let records = BamRecordSource::from_path("possorted_genome_bam.bam", &config)?;
//! let matches = FragmentWriter::create("fragments.tsv")?;
//! let stats = Pipeline::new(config, Some(matches), None).run(records)?;
//! println!("{stats}");
//! ```

#![warn(missing_docs, missing_debug_implementations)]

pub mod fragments; // Block extraction, deduplication and fragment output

pub use fragments::{
    extract_blocks, AlignmentRecord, Block, BlockError, BlockKind, BlockSet, CigarOp, CigarOpKind,
    DedupFilter, DedupSignature, FragmentWriter, Pipeline, PipelineError, RunStatistics, Verdict,
};

use thiserror::Error;

/// Records between two progress reports.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 1_000_000;

/// Where the UMI of a read is found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UmiSource {
    /// Two-character string tag, e.g. `UB` for 10x Genomics.
    Tag(String),
    /// A field of the read name, as written by Parse Biosciences
    /// (`..__CATTCCTA_AACGTGAT_CATACCAA__TTCGCTCCAA__241218IC__..`).
    ReadName {
        /// Field separator.
        separator: String,
        /// 0-based index of the UMI field.
        field: usize,
    },
}

impl UmiSource {
    /// Parse Biosciences read-name layout: UMI is the fifth `__`-separated field.
    pub fn parse_biosciences() -> Self {
        Self::ReadName {
            separator: "__".to_string(),
            field: 4,
        }
    }

    /// Pull the UMI out of a read name according to this source.
    ///
    /// Returns `None` for tag-based sources and for names with too few fields.
    pub fn umi_from_read_name<'a>(&self, qname: &'a str) -> Option<&'a str> {
        match self {
            Self::Tag(_) => None,
            Self::ReadName { separator, field } => qname
                .split(separator.as_str())
                .nth(*field)
                .filter(|umi| !umi.is_empty()),
        }
    }
}

impl Default for UmiSource {
    fn default() -> Self {
        Self::Tag("UB".to_string())
    }
}

/// What the driver does with a record whose CIGAR it cannot segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnsupportedOpPolicy {
    /// Stop the run with an error.
    #[default]
    Abort,
    /// Log a warning, count the record and carry on.
    Skip,
}

/// Configuration for a fragment conversion run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Tag holding the cell barcode.
    pub barcode_tag: String,

    /// Where UMIs come from.
    pub umi_source: UmiSource,

    /// Records between progress reports.
    pub progress_interval: u64,

    /// Handling of unmodelled CIGAR operators.
    pub unsupported_policy: UnsupportedOpPolicy,

    /// Extra BGZF decompression threads for the input reader.
    pub threads: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            barcode_tag: "CB".to_string(),
            umi_source: UmiSource::default(),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            unsupported_policy: UnsupportedOpPolicy::Abort,
            threads: 0,
        }
    }
}

impl PipelineConfig {
    /// Use a different cell barcode tag.
    pub fn with_barcode_tag(mut self, tag: impl Into<String>) -> Self {
        self.barcode_tag = tag.into();
        self
    }

    /// Use a different UMI source.
    pub fn with_umi_source(mut self, source: UmiSource) -> Self {
        self.umi_source = source;
        self
    }

    /// Report progress every `interval` records.
    pub fn with_progress_interval(mut self, interval: u64) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Choose how unsupported CIGAR operators are handled.
    pub fn with_unsupported_policy(mut self, policy: UnsupportedOpPolicy) -> Self {
        self.unsupported_policy = policy;
        self
    }

    /// Set the number of reader threads.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Check tag names and intervals before a run starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_tag(&self.barcode_tag)?;
        match &self.umi_source {
            UmiSource::Tag(tag) => check_tag(tag)?,
            UmiSource::ReadName { separator, .. } => {
                if separator.is_empty() {
                    return Err(ConfigError::EmptySeparator);
                }
            }
        }
        if self.progress_interval == 0 {
            return Err(ConfigError::ZeroProgressInterval);
        }
        Ok(())
    }
}

fn check_tag(tag: &str) -> Result<(), ConfigError> {
    let bytes = tag.as_bytes();
    let valid = bytes.len() == 2 && bytes[0].is_ascii_alphabetic() && bytes[1].is_ascii_alphanumeric();
    if valid {
        Ok(())
    } else {
        Err(ConfigError::InvalidTag(tag.to_string()))
    }
}

/// Errors in a [`PipelineConfig`].
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// SAM tags are exactly two characters, `[A-Za-z][A-Za-z0-9]`.
    #[error("invalid SAM tag name '{0}'")]
    InvalidTag(String),

    /// Read-name UMI extraction needs a separator.
    #[error("read-name separator must not be empty")]
    EmptySeparator,

    /// Progress reporting interval of zero.
    #[error("progress interval must be at least 1")]
    ZeroProgressInterval,
}
