//! Read segmentation and fragment emission.
//!
//! Alignment records flow through a one-slot duplicate filter, have their
//! CIGAR split into match and intron blocks, and are written out as
//! ATAC-style fragment rows.

mod cigar;
mod dedup;
mod pipeline;
mod reader;
mod statistics;
mod types;
mod writer;

pub use cigar::{
    blocks_for_record, extract_blocks, intron_blocks, match_blocks, parse_cigar, render_cigar,
    BlockError, BlockSet,
};
pub use dedup::{DedupFilter, DedupSignature, Verdict};
pub use pipeline::{Pipeline, PipelineError, PipelineOutcome};
pub use reader::{convert_record, BamRecordSource, ReaderError};
pub use statistics::RunStatistics;
pub use types::{AlignmentRecord, Block, BlockKind, CigarOp, CigarOpKind};
pub use writer::{render_fragments, FragmentRow, FragmentWriter};
