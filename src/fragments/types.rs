use std::fmt;
use std::sync::Arc;

/// CIGAR operation kinds describing how a read aligns to the reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CigarOpKind {
    /// Alignment match (`M`), may be a sequence match or mismatch.
    Match,
    /// Insertion relative to the reference (`I`).
    Insertion,
    /// Deletion relative to the reference (`D`).
    Deletion,
    /// Skipped region of the reference, typically an intron (`N`).
    Skip,
    /// Soft clipping (sequence present in read only, `S`).
    SoftClip,
    /// Hard clipping (trimmed sequence not present in read, `H`).
    HardClip,
    /// Silent deletion from a padded reference (`P`).
    Pad,
    /// Sequence match (`=`).
    Equal,
    /// Sequence mismatch (`X`).
    Mismatch,
    /// Legacy "back" operator (`B`); decodable but not modelled by the extractor.
    Back,
}

impl CigarOpKind {
    /// Decode a SAM CIGAR operator character.
    pub fn from_code(code: u8) -> Option<Self> {
        let kind = match code {
            b'M' => Self::Match,
            b'I' => Self::Insertion,
            b'D' => Self::Deletion,
            b'N' => Self::Skip,
            b'S' => Self::SoftClip,
            b'H' => Self::HardClip,
            b'P' => Self::Pad,
            b'=' => Self::Equal,
            b'X' => Self::Mismatch,
            b'B' => Self::Back,
            _ => return None,
        };
        Some(kind)
    }

    /// SAM character for this operator.
    pub fn code(self) -> char {
        match self {
            Self::Match => 'M',
            Self::Insertion => 'I',
            Self::Deletion => 'D',
            Self::Skip => 'N',
            Self::SoftClip => 'S',
            Self::HardClip => 'H',
            Self::Pad => 'P',
            Self::Equal => '=',
            Self::Mismatch => 'X',
            Self::Back => 'B',
        }
    }

    /// Whether the operator aligns read bases against reference bases.
    pub fn is_aligned(self) -> bool {
        matches!(self, Self::Match | Self::Equal | Self::Mismatch)
    }
}

/// CIGAR operation with length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CigarOp {
    /// Operation kind.
    pub kind: CigarOpKind,
    /// Number of bases affected by the operation.
    pub len: u32,
}

impl CigarOp {
    /// Construct a new CIGAR operation.
    pub fn new(kind: CigarOpKind, len: u32) -> Self {
        Self { kind, len }
    }
}

impl fmt::Display for CigarOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.len, self.kind.code())
    }
}

/// Whether a block came from an aligned run or from a reference skip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// Reference-aligned run (`M`, `=`, `X`).
    Match,
    /// Reference skip (`N`), used as a proxy for a spliced-out intron.
    Intron,
}

/// Reference interval derived from one CIGAR element, `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    /// Origin of the block.
    pub kind: BlockKind,
    /// Read cursor (1-based) when the block was discovered.
    pub read_start: i64,
    /// First reference position covered (1-based, inclusive).
    pub start: i64,
    /// Reference position one past the last one covered.
    pub end: i64,
}

impl Block {
    /// Construct a block covering `len` reference bases from `start`.
    pub fn new(kind: BlockKind, read_start: i64, start: i64, len: u32) -> Self {
        Self {
            kind,
            read_start,
            start,
            end: start + i64::from(len),
        }
    }

    /// Number of reference bases covered.
    pub fn len(&self) -> i64 {
        self.end - self.start
    }

    /// Whether the block covers no reference bases.
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Alignment record as seen by the fragment pipeline.
///
/// Produced by the BAM reader adapter (or built directly in tests); read-only
/// to the pipeline and discarded after one iteration.
#[derive(Debug, Clone)]
pub struct AlignmentRecord {
    /// Reference contig name; `None` when the read is unplaced.
    pub chrom: Option<Arc<str>>,
    /// 1-based leftmost reference coordinate.
    pub pos: i64,
    /// CIGAR describing the alignment.
    pub cigar: Vec<CigarOp>,
    /// Cell barcode tag value.
    pub barcode: Option<String>,
    /// UMI, from a tag or the read name depending on configuration.
    pub umi: Option<String>,
    /// Match blocks computed by the reader, when it offers them.
    pub precomputed_blocks: Option<Vec<Block>>,
}

impl AlignmentRecord {
    /// Construct an aligned record with the supplied tags.
    pub fn new(
        chrom: impl Into<Arc<str>>,
        pos: i64,
        cigar: Vec<CigarOp>,
        barcode: Option<&str>,
        umi: Option<&str>,
    ) -> Self {
        Self {
            chrom: Some(chrom.into()),
            pos,
            cigar,
            barcode: barcode.map(str::to_owned),
            umi: umi.map(str::to_owned),
            precomputed_blocks: None,
        }
    }

    /// Construct a record without a reference placement.
    pub fn unaligned(barcode: Option<&str>, umi: Option<&str>) -> Self {
        Self {
            chrom: None,
            pos: 0,
            cigar: Vec::new(),
            barcode: barcode.map(str::to_owned),
            umi: umi.map(str::to_owned),
            precomputed_blocks: None,
        }
    }

    /// Attach match blocks computed elsewhere.
    pub fn with_precomputed_blocks(mut self, blocks: Vec<Block>) -> Self {
        self.precomputed_blocks = Some(blocks);
        self
    }

    /// Whether the record is placed on a reference sequence.
    pub fn is_aligned(&self) -> bool {
        self.chrom.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_codes_round_trip() {
        for code in b"MIDNSHP=XB" {
            let kind = CigarOpKind::from_code(*code).expect("known operator");
            assert_eq!(kind.code() as u8, *code);
        }
        assert_eq!(CigarOpKind::from_code(b'Q'), None);
    }

    #[test]
    fn block_end_is_exclusive() {
        let block = Block::new(BlockKind::Match, 1, 1000, 50);
        assert_eq!(block.end, 1050);
        assert_eq!(block.len(), 50);
        assert!(!block.is_empty());
    }
}
