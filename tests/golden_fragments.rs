#[path = "common/mod.rs"]
mod common;
use common::{assert_snapshot, sample_library};
use rna2fragments::fragments::{FragmentWriter, Pipeline};
use rna2fragments::PipelineConfig;

#[test]
fn sample_library_matches_golden() {
    let pipeline = Pipeline::new(
        PipelineConfig::default(),
        Some(FragmentWriter::new(Vec::new())),
        Some(FragmentWriter::new(Vec::new())),
    )
    .expect("default config is valid");

    let outcome = pipeline
        .run(sample_library().into_iter().map(Ok))
        .expect("pipeline run succeeds");

    let matches = String::from_utf8(outcome.matches.expect("match output")).unwrap();
    let introns = String::from_utf8(outcome.introns.expect("intron output")).unwrap();
    assert_snapshot("fragments/sample_matches.tsv", &matches);
    assert_snapshot("fragments/sample_introns.tsv", &introns);
}

#[test]
fn sample_library_summary_line() {
    let pipeline = Pipeline::new(
        PipelineConfig::default(),
        Some(FragmentWriter::new(Vec::new())),
        Some(FragmentWriter::new(Vec::new())),
    )
    .expect("default config is valid");
    let outcome = pipeline
        .run(sample_library().into_iter().map(Ok))
        .expect("pipeline run succeeds");

    assert_eq!(
        outcome.stats.to_string(),
        "Kept rec/Read rec: 7/9  @sequence: chr2  BadBC: 1  Unaligned: 1  Blocks written: 18  SkipDup: 1  Unsupported: 0"
    );
}
