//! Window-1 UMI deduplication.
//!
//! Input is assumed to be position sorted, so PCR copies of the same molecule
//! arrive back to back. Only the immediately preceding accepted signature is
//! remembered; duplicates further apart are not detected.

/// (UMI, cell barcode) pair identifying a sampled molecule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DedupSignature {
    /// UMI; an absent UMI never matches anything.
    pub umi: Option<String>,
    /// Cell barcode.
    pub barcode: String,
}

impl DedupSignature {
    /// Construct a signature.
    pub fn new(umi: Option<&str>, barcode: &str) -> Self {
        Self {
            umi: umi.map(str::to_owned),
            barcode: barcode.to_owned(),
        }
    }

    fn duplicates(&self, umi: Option<&str>, barcode: &str) -> bool {
        match (self.umi.as_deref(), umi) {
            (Some(previous), Some(current)) => previous == current && self.barcode == barcode,
            _ => false,
        }
    }
}

/// Outcome of classifying one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Record kept; its signature is now remembered.
    Accepted,
    /// Same UMI and barcode as the previous accepted record.
    Duplicate,
    /// Record has no cell barcode.
    MissingBarcode,
}

/// Single-slot duplicate filter.
#[derive(Debug, Default)]
pub struct DedupFilter {
    previous: Option<DedupSignature>,
}

impl DedupFilter {
    /// Create a filter with nothing remembered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify a record by its tags, updating the slot only on acceptance.
    pub fn classify(&mut self, umi: Option<&str>, barcode: Option<&str>) -> Verdict {
        let Some(barcode) = barcode else {
            return Verdict::MissingBarcode;
        };

        if let Some(previous) = &self.previous {
            if previous.duplicates(umi, barcode) {
                return Verdict::Duplicate;
            }
        }

        // Reuse the slot's allocations where possible.
        match &mut self.previous {
            Some(previous) => {
                previous.barcode.clear();
                previous.barcode.push_str(barcode);
                previous.umi = umi.map(str::to_owned);
            }
            None => self.previous = Some(DedupSignature::new(umi, barcode)),
        }
        Verdict::Accepted
    }

    /// Boolean form of [`classify`](Self::classify) for a barcode-bearing signature.
    pub fn accept(&mut self, signature: &DedupSignature) -> bool {
        self.classify(signature.umi.as_deref(), Some(&signature.barcode)) == Verdict::Accepted
    }

    /// Signature of the last accepted record.
    pub fn previous(&self) -> Option<&DedupSignature> {
        self.previous.as_ref()
    }
}
