use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rna2fragments::fragments::{BamRecordSource, FragmentWriter, Pipeline};
use rna2fragments::{PipelineConfig, UmiSource, UnsupportedOpPolicy, DEFAULT_PROGRESS_INTERVAL};
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = "\
UMI deduplication only works on position-sorted input, and is naive: a read is \
dropped only when it directly follows a read with the same UMI and cell barcode.

Post-process each output with standard tools:
  Sort:     sort -k 1,1 -k2,2n output_match_fragments.tsv > fragments.sorted.tsv
  Compress: bgzip -@ 8 fragments.sorted.tsv
  Index:    tabix -p vcf fragments.sorted.tsv.gz";

#[derive(Parser, Debug)]
#[command(
    name = "rna2fragments",
    version,
    about = "Convert aligned 10x or Parse Biosciences RNA-seq reads into a 10x-style ATAC fragment file",
    long_about = "Converts aligned single-cell RNA-seq reads into ATAC-style fragment files, so the \
                  data can be analysed with single-cell ATAC workflows such as Signac or ArchR.",
    after_help = AFTER_HELP,
    arg_required_else_help = true
)]
struct Cli {
    /// Position-sorted BAM/SAM/CRAM file (e.g. gex_possorted_bam.bam).
    input: PathBuf,

    /// Write fragments for aligned (M/=/X) blocks to this file.
    #[arg(short = 'm', long = "match-output", value_name = "PATH")]
    match_output: Option<PathBuf>,

    /// Write fragments for reference skips (N, intron-like) to this file.
    #[arg(short = 'n', long = "intron-output", value_name = "PATH")]
    intron_output: Option<PathBuf>,

    /// Tag holding the cell barcode.
    #[arg(long, default_value = "CB")]
    barcode_tag: String,

    /// Tag holding the UMI.
    #[arg(long, default_value = "UB", conflicts_with = "umi_from_read_name")]
    umi_tag: String,

    /// Take the UMI from the read name (Parse Biosciences) instead of a tag.
    #[arg(long)]
    umi_from_read_name: bool,

    /// Field separator used with --umi-from-read-name.
    #[arg(long, default_value = "__", requires = "umi_from_read_name")]
    read_name_separator: String,

    /// 0-based field index of the UMI used with --umi-from-read-name.
    #[arg(long, default_value_t = 4, requires = "umi_from_read_name")]
    umi_field: usize,

    /// Skip reads with unsupported CIGAR operators instead of aborting.
    #[arg(long)]
    skip_unsupported: bool,

    /// Records between progress reports.
    #[arg(long, default_value_t = DEFAULT_PROGRESS_INTERVAL)]
    progress_interval: u64,

    /// Extra decompression threads for the input file.
    #[arg(long, default_value_t = 0)]
    threads: usize,
}

impl Cli {
    fn config(&self) -> PipelineConfig {
        let umi_source = if self.umi_from_read_name {
            UmiSource::ReadName {
                separator: self.read_name_separator.clone(),
                field: self.umi_field,
            }
        } else {
            UmiSource::Tag(self.umi_tag.clone())
        };
        let policy = if self.skip_unsupported {
            UnsupportedOpPolicy::Skip
        } else {
            UnsupportedOpPolicy::Abort
        };

        PipelineConfig::default()
            .with_barcode_tag(self.barcode_tag.clone())
            .with_umi_source(umi_source)
            .with_progress_interval(self.progress_interval)
            .with_unsupported_policy(policy)
            .with_threads(self.threads)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config();
    config.validate().context("invalid options")?;

    let records = BamRecordSource::from_path(&cli.input, &config)?;

    let matches = cli
        .match_output
        .as_ref()
        .map(|path| {
            FragmentWriter::create(path)
                .with_context(|| format!("failed to create {}", path.display()))
        })
        .transpose()?;
    let introns = cli
        .intron_output
        .as_ref()
        .map(|path| {
            FragmentWriter::create(path)
                .with_context(|| format!("failed to create {}", path.display()))
        })
        .transpose()?;

    let pipeline = Pipeline::new(config, matches, introns)?;
    pipeline
        .run(records)
        .with_context(|| format!("conversion of {} failed", cli.input.display()))?;

    Ok(())
}
