use crate::{
    aggregator::{Stats, SwathTable},
    transect::Transect,
    C,
};

/// Values of a group of transects aligned on their seeds.
///
/// Row `i` of the table holds every transect's value at cross distance
/// `distances[i]`, NaN where a transect did not reach that far.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CrossSection {
    /// Signed distance from the baseline, left negative.
    pub distances: Vec<C>,
    pub table: SwathTable,
}

impl CrossSection {
    /// Aligns `values`, one row per transect, by each transect's seed
    /// offsets. Rows beyond `transects` are ignored.
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_sign_loss,
        clippy::cast_possible_wrap
    )]
    pub fn new(transects: &[Transect], values: &[Vec<C>], step: C) -> Self {
        let offsets = transects.iter().flat_map(|t| t.offsets.iter().copied());
        let (Some(lo), Some(hi)) = (offsets.clone().min(), offsets.max()) else {
            return Self::default();
        };
        let width = (hi - lo + 1) as usize;
        let rows = transects
            .iter()
            .zip(values)
            .map(|(transect, row)| {
                let mut aligned = vec![C::NAN; width];
                for (&offset, &value) in transect.offsets.iter().zip(row) {
                    aligned[(offset - lo) as usize] = value;
                }
                aligned
            })
            .collect();
        Self {
            distances: (lo..=hi).map(|offset| offset as C * step).collect(),
            table: SwathTable::new(rows).transpose(),
        }
    }

    /// Statistics at each cross distance.
    pub fn stats(&self) -> Vec<Stats> {
        self.table.row_stats()
    }
}
