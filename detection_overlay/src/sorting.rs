use crate::prediction::Prediction;
use std::cmp::Ordering;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    #[default]
    Confidence,
    Name,
}

impl SortMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortMode::Confidence => "confidence",
            SortMode::Name => "name",
        }
    }
}

impl FromStr for SortMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "confidence" => Ok(Self::Confidence),
            "name" => Ok(Self::Name),
            other => Err(format!(
                "{} is not a supported sort mode. Use either `confidence` or `name`.",
                other
            )),
        }
    }
}

/// Produces the displayed ordering without touching the source array: each
/// entry pairs the ORIGINAL index with its prediction, so hover/select state
/// keyed on original indices survives any reorder. Both sorts are stable.
pub fn sorted_view(predictions: &[Prediction], mode: SortMode) -> Vec<(usize, &Prediction)> {
    let mut view: Vec<(usize, &Prediction)> = predictions.iter().enumerate().collect();
    match mode {
        SortMode::Confidence => view.sort_by(|a, b| {
            b.1.probability
                .partial_cmp(&a.1.probability)
                .unwrap_or(Ordering::Equal)
        }),
        SortMode::Name => view.sort_by(|a, b| compare_names(&a.1.tag_name, &b.1.tag_name)),
    }
    view
}

// Case-insensitive primary key, case-sensitive tiebreak. Stands in for a
// locale collation without pulling in ICU.
fn compare_names(a: &str, b: &str) -> Ordering {
    let folded = a.to_lowercase().cmp(&b.to_lowercase());
    match folded {
        Ordering::Equal => a.cmp(b),
        other => other,
    }
}
