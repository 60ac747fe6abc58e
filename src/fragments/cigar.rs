//! CIGAR walking: splits one alignment into match blocks and intron blocks.

use thiserror::Error;

use super::types::{AlignmentRecord, Block, BlockKind, CigarOp, CigarOpKind};

/// Errors raised while interpreting a CIGAR.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BlockError {
    /// The CIGAR holds an operator the extractor has no rule for.
    #[error("unsupported CIGAR operator '{op}' in {cigar}")]
    UnsupportedOperator {
        /// Offending operator.
        op: char,
        /// Full CIGAR, rendered as SAM text.
        cigar: String,
    },
    /// CIGAR text that could not be parsed.
    #[error("malformed CIGAR string: {0}")]
    MalformedCigar(String),
}

/// Blocks derived from a single alignment record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockSet {
    /// Reference-aligned runs in CIGAR order.
    pub matches: Vec<Block>,
    /// Reference skips in CIGAR order.
    pub introns: Vec<Block>,
}

/// Walk `cigar` from the 1-based `alignment_start` and collect both block kinds.
///
/// Each `M`/`=`/`X` element yields one match block `[ref, ref + len)`.
/// Each `N` element yields one intron block whose start is the reference
/// position *after* the skip, i.e. `[ref + len, ref + 2 * len)`; downstream
/// fragment files rely on that placement.
pub fn extract_blocks(cigar: &[CigarOp], alignment_start: i64) -> Result<BlockSet, BlockError> {
    let mut blocks = BlockSet::default();
    let mut read_pos: i64 = 1;
    let mut ref_pos = alignment_start;

    for op in cigar {
        let len = i64::from(op.len);
        match op.kind {
            CigarOpKind::HardClip | CigarOpKind::Pad => {}
            CigarOpKind::SoftClip | CigarOpKind::Insertion => read_pos += len,
            CigarOpKind::Deletion => ref_pos += len,
            CigarOpKind::Skip => {
                ref_pos += len;
                if op.len > 0 {
                    blocks.introns.push(Block::new(BlockKind::Intron, read_pos, ref_pos, op.len));
                }
            }
            CigarOpKind::Match | CigarOpKind::Equal | CigarOpKind::Mismatch => {
                if op.len > 0 {
                    blocks.matches.push(Block::new(BlockKind::Match, read_pos, ref_pos, op.len));
                }
                read_pos += len;
                ref_pos += len;
            }
            CigarOpKind::Back => {
                return Err(BlockError::UnsupportedOperator {
                    op: op.kind.code(),
                    cigar: render_cigar(cigar),
                })
            }
        }
    }

    Ok(blocks)
}

/// Match blocks only; see [`extract_blocks`].
pub fn match_blocks(cigar: &[CigarOp], alignment_start: i64) -> Result<Vec<Block>, BlockError> {
    extract_blocks(cigar, alignment_start).map(|blocks| blocks.matches)
}

/// Intron blocks only; see [`extract_blocks`].
pub fn intron_blocks(cigar: &[CigarOp], alignment_start: i64) -> Result<Vec<Block>, BlockError> {
    extract_blocks(cigar, alignment_start).map(|blocks| blocks.introns)
}

/// Blocks for a whole record, preferring match blocks precomputed by the reader.
///
/// The CIGAR is always scanned so that unsupported operators surface and
/// intron blocks are available; the reader's match blocks replace the scanned
/// ones when present.
pub fn blocks_for_record(record: &AlignmentRecord) -> Result<BlockSet, BlockError> {
    let mut blocks = extract_blocks(&record.cigar, record.pos)?;
    if let Some(precomputed) = &record.precomputed_blocks {
        blocks.matches.clone_from(precomputed);
    }
    Ok(blocks)
}

/// Parse SAM CIGAR text such as `50M200N30M`. `*` denotes an empty CIGAR.
pub fn parse_cigar(text: &str) -> Result<Vec<CigarOp>, BlockError> {
    if text == "*" {
        return Ok(Vec::new());
    }

    let mut ops = Vec::new();
    let mut len: Option<u32> = None;
    for byte in text.bytes() {
        if byte.is_ascii_digit() {
            let digit = u32::from(byte - b'0');
            let next = len
                .unwrap_or(0)
                .checked_mul(10)
                .and_then(|value| value.checked_add(digit))
                .ok_or_else(|| BlockError::MalformedCigar(text.to_string()))?;
            len = Some(next);
            continue;
        }

        let kind = CigarOpKind::from_code(byte)
            .ok_or_else(|| BlockError::MalformedCigar(text.to_string()))?;
        let op_len = len
            .take()
            .ok_or_else(|| BlockError::MalformedCigar(text.to_string()))?;
        ops.push(CigarOp::new(kind, op_len));
    }

    if len.is_some() {
        return Err(BlockError::MalformedCigar(text.to_string()));
    }
    Ok(ops)
}

/// Render a CIGAR back to SAM text.
pub fn render_cigar(cigar: &[CigarOp]) -> String {
    if cigar.is_empty() {
        return "*".to_string();
    }
    cigar.iter().map(ToString::to_string).collect()
}
