use crate::{math::percentile, C};

/// Ragged rows padded with NaN to a common width.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SwathTable {
    rows: Vec<Vec<C>>,
    width: usize,
}

impl SwathTable {
    /// Pads every row with NaN to the length of the longest.
    pub fn new(mut rows: Vec<Vec<C>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut rows {
            row.resize(width, C::NAN);
        }
        Self { rows, width }
    }

    pub fn rows(&self) -> &[Vec<C>] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Vec<C>> {
        self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn column(&self, col: usize) -> impl Iterator<Item = C> + '_ {
        self.rows.iter().filter_map(move |row| row.get(col).copied())
    }

    /// Statistics of each column, ignoring NaN.
    pub fn column_stats(&self) -> Vec<Stats> {
        (0..self.width)
            .map(|col| Stats::from_samples(self.column(col)))
            .collect()
    }

    /// Statistics of each row, ignoring NaN.
    pub fn row_stats(&self) -> Vec<Stats> {
        self.rows
            .iter()
            .map(|row| Stats::from_samples(row.iter().copied()))
            .collect()
    }

    #[must_use]
    pub fn transpose(&self) -> Self {
        let rows = (0..self.width).map(|col| self.column(col).collect()).collect();
        Self {
            rows,
            width: self.rows.len(),
        }
    }

    /// Returns the rows with trailing NaN removed.
    pub fn strip(&self) -> Vec<Vec<C>> {
        self.rows
            .iter()
            .map(|row| {
                let len = row.iter().rposition(|v| !v.is_nan()).map_or(0, |i| i + 1);
                row[..len].to_vec()
            })
            .collect()
    }
}

/// Summary of a set of samples.
///
/// Every field is NaN when there are no valid samples.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Stats {
    pub min: C,
    pub max: C,
    pub mean: C,
    /// 25th percentile.
    pub q1: C,
    /// 75th percentile.
    pub q3: C,
    /// Number of non-NaN samples.
    pub count: usize,
}

impl Stats {
    pub const EMPTY: Self = Self {
        min: C::NAN,
        max: C::NAN,
        mean: C::NAN,
        q1: C::NAN,
        q3: C::NAN,
        count: 0,
    };

    /// Summarizes `samples`, skipping NaN.
    #[allow(clippy::cast_precision_loss)]
    pub fn from_samples<I>(samples: I) -> Self
    where
        I: IntoIterator<Item = C>,
    {
        let mut valid: Vec<C> = samples.into_iter().filter(|v| !v.is_nan()).collect();
        if valid.is_empty() {
            return Self::EMPTY;
        }
        valid.sort_by(C::total_cmp);
        let count = valid.len();
        Self {
            min: valid[0],
            max: valid[count - 1],
            mean: valid.iter().sum::<C>() / count as C,
            q1: percentile(&valid, 25.0),
            q3: percentile(&valid, 75.0),
            count,
        }
    }
}
