#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use rna2fragments::fragments::{parse_cigar, AlignmentRecord};

fn snapshot_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("snapshots")
}

pub fn assert_snapshot(name: &str, actual: &str) {
    let path = snapshot_root().join(name);
    if std::env::var("RNA2FRAGMENTS_UPDATE_SNAPSHOTS").is_ok() {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create snapshot directory");
        }
        fs::write(&path, actual).expect("write snapshot");
        return;
    }

    let expected =
        fs::read_to_string(&path).unwrap_or_else(|_| panic!("snapshot {:?} not found", path));
    if normalize(&expected) != normalize(actual) {
        panic!(
            "Snapshot mismatch for {:?}. Set RNA2FRAGMENTS_UPDATE_SNAPSHOTS=1 to regenerate.\nExpected:\n{}\nActual:\n{}",
            path,
            expected,
            actual
        );
    }
}

fn normalize(input: &str) -> String {
    input.replace("\r\n", "\n")
}

/// Aligned record from SAM-style fields.
pub fn record(
    chrom: &str,
    pos: i64,
    cigar: &str,
    barcode: Option<&str>,
    umi: Option<&str>,
) -> AlignmentRecord {
    let cigar = parse_cigar(cigar).expect("valid CIGAR in test fixture");
    AlignmentRecord::new(chrom, pos, cigar, barcode, umi)
}

/// A small position-sorted library covering every record category.
pub fn sample_library() -> Vec<AlignmentRecord> {
    vec![
        record("chr1", 1000, "50M200N30M", Some("AAACCTGA-1"), Some("UMI1")),
        record("chr1", 1000, "50M200N30M", Some("AAACCTGA-1"), Some("UMI1")),
        record("chr1", 1020, "5S40M2I20M", Some("AAACCTGA-1"), Some("UMI2")),
        record("chr1", 1100, "30M", None, Some("UMI3")),
        record("chr1", 1500, "10M1000N20M500N15M", Some("TTTGGCAA-1"), Some("UMI1")),
        AlignmentRecord::unaligned(Some("TTTGGCAA-1"), Some("UMI9")),
        record("chr2", 40, "3H25=1X24=3H", Some("TTTGGCAA-1"), None),
        record("chr2", 40, "3H25=1X24=3H", Some("TTTGGCAA-1"), None),
        record("chr2", 300, "20M10D20M", Some("GGGAACTT-1"), Some("UMI4")),
    ]
}
