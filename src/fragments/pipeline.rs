//! Sequential driver tying the reader, duplicate filter, block extractor and
//! fragment writers together.

use std::io::{self, Write};

use thiserror::Error;
use tracing::{debug, info, warn};

use super::cigar::{blocks_for_record, BlockError};
use super::dedup::{DedupFilter, Verdict};
use super::reader::ReaderError;
use super::statistics::RunStatistics;
use super::types::AlignmentRecord;
use super::writer::FragmentWriter;
use crate::{ConfigError, PipelineConfig, UnsupportedOpPolicy};

/// Errors that stop a conversion run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Configuration rejected before the run started.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    /// A record's CIGAR could not be segmented.
    #[error("record {record}: {source}")]
    Block {
        /// 1-based index of the offending record in the input.
        record: u64,
        /// Underlying extraction failure.
        source: BlockError,
    },
    /// The alignment reader failed.
    #[error(transparent)]
    Read(#[from] ReaderError),
    /// Writing fragment rows failed.
    #[error("failed to write fragments: {0}")]
    Write(#[from] io::Error),
}

/// Result of a completed run.
#[derive(Debug)]
pub struct PipelineOutcome<W> {
    /// Final counters.
    pub stats: RunStatistics,
    /// Flushed match-block sink, if one was configured.
    pub matches: Option<W>,
    /// Flushed intron-block sink, if one was configured.
    pub introns: Option<W>,
}

/// Converts a stream of alignment records into fragment rows.
#[derive(Debug)]
pub struct Pipeline<W: Write> {
    config: PipelineConfig,
    filter: DedupFilter,
    matches: Option<FragmentWriter<W>>,
    introns: Option<FragmentWriter<W>>,
    stats: RunStatistics,
}

impl<W: Write> Pipeline<W> {
    /// Create a driver; either output may be omitted.
    pub fn new(
        config: PipelineConfig,
        matches: Option<FragmentWriter<W>>,
        introns: Option<FragmentWriter<W>>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            filter: DedupFilter::new(),
            matches,
            introns,
            stats: RunStatistics::new(),
        })
    }

    /// Counters accumulated so far.
    pub fn stats(&self) -> &RunStatistics {
        &self.stats
    }

    /// Drain `records`, writing fragments and logging progress.
    ///
    /// Consumes the driver; the outputs are flushed and returned once the
    /// input is exhausted.
    pub fn run<I>(mut self, records: I) -> Result<PipelineOutcome<W>, PipelineError>
    where
        I: IntoIterator<Item = Result<AlignmentRecord, ReaderError>>,
    {
        debug!(
            barcode_tag = %self.config.barcode_tag,
            umi_source = ?self.config.umi_source,
            policy = ?self.config.unsupported_policy,
            match_output = self.matches.is_some(),
            intron_output = self.introns.is_some(),
            "starting fragment conversion"
        );

        for record in records {
            let record = record?;
            self.process(&record)?;

            if self.stats.records_read % self.config.progress_interval == 0 {
                info!("{}", self.stats);
            }
        }

        info!("{}", self.stats);

        let matches = self.matches.map(FragmentWriter::finish).transpose()?;
        let introns = self.introns.map(FragmentWriter::finish).transpose()?;
        Ok(PipelineOutcome {
            stats: self.stats,
            matches,
            introns,
        })
    }

    /// Classify one record and emit its blocks if it is kept and aligned.
    pub fn process(&mut self, record: &AlignmentRecord) -> Result<(), PipelineError> {
        self.stats.records_read += 1;

        let barcode = match self
            .filter
            .classify(record.umi.as_deref(), record.barcode.as_deref())
        {
            Verdict::MissingBarcode => {
                self.stats.missing_barcode += 1;
                return Ok(());
            }
            Verdict::Duplicate => {
                self.stats.duplicates += 1;
                return Ok(());
            }
            Verdict::Accepted => record.barcode.as_deref().unwrap_or_default(),
        };

        self.stats.records_kept += 1;
        self.stats.last_reference = record.chrom.clone();

        let Some(chrom) = record.chrom.as_deref() else {
            self.stats.unaligned += 1;
            return Ok(());
        };

        let blocks = match blocks_for_record(record) {
            Ok(blocks) => blocks,
            Err(source) => {
                return match self.config.unsupported_policy {
                    UnsupportedOpPolicy::Abort => Err(PipelineError::Block {
                        record: self.stats.records_read,
                        source,
                    }),
                    UnsupportedOpPolicy::Skip => {
                        warn!(record = self.stats.records_read, "skipping record: {source}");
                        self.stats.skipped_unsupported += 1;
                        Ok(())
                    }
                };
            }
        };

        if let Some(out) = self.matches.as_mut() {
            for block in &blocks.matches {
                out.emit(chrom, block, barcode, &mut self.stats)?;
            }
        }
        if let Some(out) = self.introns.as_mut() {
            for block in &blocks.introns {
                out.emit(chrom, block, barcode, &mut self.stats)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragments::cigar::parse_cigar;

    fn read(chrom: &str, pos: i64, cigar: &str, barcode: Option<&str>, umi: Option<&str>) -> AlignmentRecord {
        AlignmentRecord::new(chrom, pos, parse_cigar(cigar).unwrap(), barcode, umi)
    }

    fn both_outputs() -> Pipeline<Vec<u8>> {
        Pipeline::new(
            PipelineConfig::default(),
            Some(FragmentWriter::new(Vec::new())),
            Some(FragmentWriter::new(Vec::new())),
        )
        .unwrap()
    }

    fn text(sink: Option<Vec<u8>>) -> String {
        String::from_utf8(sink.expect("sink configured")).unwrap()
    }

    #[test]
    fn spliced_read_writes_both_streams() {
        let records = vec![Ok(read("chr1", 1000, "50M200N30M", Some("AAAA"), Some("UMI1")))];
        let outcome = both_outputs().run(records).unwrap();

        assert_eq!(
            text(outcome.matches),
            "chr1\t1000\t1050\tAAAA\t1\nchr1\t1250\t1280\tAAAA\t1\n"
        );
        assert_eq!(text(outcome.introns), "chr1\t1250\t1450\tAAAA\t1\n");
        assert_eq!(outcome.stats.blocks_written, 3);
        assert_eq!(outcome.stats.records_kept, 1);
    }

    #[test]
    fn duplicate_umi_emits_nothing() {
        let records = vec![
            Ok(read("chr1", 100, "10M", Some("AAAA"), Some("UMI1"))),
            Ok(read("chr1", 100, "10M", Some("AAAA"), Some("UMI1"))),
        ];
        let outcome = both_outputs().run(records).unwrap();

        assert_eq!(text(outcome.matches), "chr1\t100\t110\tAAAA\t1\n");
        assert_eq!(outcome.stats.duplicates, 1);
        assert_eq!(outcome.stats.records_read, 2);
    }

    #[test]
    fn unaligned_record_is_kept_but_silent() {
        let mut pipeline = both_outputs();
        pipeline
            .process(&AlignmentRecord::unaligned(Some("AAAA"), Some("UMI1")))
            .unwrap();

        let stats = pipeline.stats().clone();
        assert_eq!(stats.unaligned, 1);
        assert_eq!(stats.records_kept, 1);
        assert_eq!(stats.blocks_written, 0);
        assert_eq!(stats.last_reference, None);
    }

    #[test]
    fn unsupported_operator_aborts_by_default() {
        let records = vec![
            Ok(read("chr1", 1, "10M", Some("AAAA"), None)),
            Ok(read("chr1", 5, "5M2B5M", Some("AAAA"), None)),
        ];
        let err = both_outputs().run(records).unwrap_err();
        assert!(matches!(err, PipelineError::Block { record: 2, .. }));
    }

    #[test]
    fn unsupported_operator_can_be_skipped() {
        let config = PipelineConfig::default().with_unsupported_policy(UnsupportedOpPolicy::Skip);
        let pipeline = Pipeline::new(config, Some(FragmentWriter::new(Vec::new())), None).unwrap();
        let records = vec![
            Ok(read("chr1", 5, "5M2B5M", Some("AAAA"), None)),
            Ok(read("chr1", 20, "4M", Some("AAAA"), None)),
        ];
        let outcome = pipeline.run(records).unwrap();

        assert_eq!(text(outcome.matches), "chr1\t20\t24\tAAAA\t1\n");
        assert!(outcome.introns.is_none());
        assert_eq!(outcome.stats.skipped_unsupported, 1);
        assert_eq!(outcome.stats.records_kept, 2);
    }

    #[test]
    fn reader_errors_propagate() {
        let records = vec![
            Ok(read("chr1", 1, "10M", Some("AAAA"), None)),
            Err(ReaderError::UnknownReference(7)),
        ];
        let err = both_outputs().run(records).unwrap_err();
        assert!(matches!(err, PipelineError::Read(ReaderError::UnknownReference(7))));
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let config = PipelineConfig::default().with_progress_interval(0);
        let result = Pipeline::<Vec<u8>>::new(config, None, None);
        assert!(matches!(result, Err(ConfigError::ZeroProgressInterval)));
    }
}
