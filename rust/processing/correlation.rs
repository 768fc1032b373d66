//! Pairwise Pearson correlation across the fixed sales measures

use crate::coercion::currency_series;
use crate::error::Result;
use crate::processing::ProcessingStrategy;
use crate::table::Table;
use itertools::Itertools;
use polars::prelude::*;

/// Measures compared by the correlation report, in output order.
pub const CORRELATION_MEASURES: [&str; 7] = [
    "Units Sold",
    "Manufacturing Price",
    "Sale Price",
    "Gross Sales",
    "Discounts",
    "Sales",
    "Profit",
];

/// Square correlation matrix; rows and columns are labelled with the measure names.
///
/// Currency text is coerced on a private copy, never raising: blanks, dashes and
/// junk become missing values. Missing values are excluded pairwise. A pair with
/// fewer than two shared values, or a constant side, yields a missing entry.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    measures: Vec<String>,
}

impl CorrelationMatrix {
    pub fn new(measures: &[&str]) -> Self {
        Self {
            measures: measures.iter().map(|m| m.to_string()).collect(),
        }
    }
}

impl Default for CorrelationMatrix {
    fn default() -> Self {
        Self::new(&CORRELATION_MEASURES)
    }
}

impl ProcessingStrategy for CorrelationMatrix {
    fn process_data(&self, table: &Table) -> Result<Table> {
        let names: Vec<&str> = self.measures.iter().map(|m| m.as_str()).collect();
        table.require_columns(&names)?;

        let mut values: Vec<Vec<Option<f64>>> = Vec::with_capacity(names.len());
        for name in &names {
            let coerced = currency_series(table.column(name)?)?;
            values.push(coerced.f64()?.into_iter().collect());
        }

        let n = values.len();
        let mut matrix: Vec<Vec<Option<f64>>> = vec![vec![None; n]; n];
        for i in 0..n {
            for j in i..n {
                let r = if i == j {
                    pearson(&values[i], &values[i]).map(|_| 1.0)
                } else {
                    pearson(&values[i], &values[j])
                };
                matrix[i][j] = r;
                matrix[j][i] = r;
            }
        }

        let series: Vec<Series> = names
            .iter()
            .enumerate()
            .map(|(j, name)| {
                let column: Vec<Option<f64>> = (0..n).map(|i| matrix[i][j]).collect();
                Series::new(name, column)
            })
            .collect();

        Table::with_index(
            DataFrame::new(series)?,
            self.measures.clone(),
        )
    }

    fn name(&self) -> &str {
        "correlation"
    }
}

/// Pearson coefficient over the rows where both sides are present.
pub fn pearson(xs: &[Option<f64>], ys: &[Option<f64>]) -> Option<f64> {
    let (a, b): (Vec<f64>, Vec<f64>) = xs
        .iter()
        .zip(ys.iter())
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .unzip();

    if a.len() < 2 || a.iter().all_equal() || b.iter().all_equal() {
        return None;
    }

    let count = a.len() as f64;
    let mean_a = a.iter().sum::<f64>() / count;
    let mean_b = b.iter().sum::<f64>() / count;

    let (mut sab, mut saa, mut sbb) = (0.0, 0.0, 0.0);
    for (x, y) in a.iter().zip(b.iter()) {
        let dx = x - mean_a;
        let dy = y - mean_b;
        sab += dx * dy;
        saa += dx * dx;
        sbb += dy * dy;
    }

    let denom = (saa * sbb).sqrt();
    if denom == 0.0 || !denom.is_finite() {
        return None;
    }
    Some((sab / denom).clamp(-1.0, 1.0))
}
