//! Explicit deduplication by key

use crate::error::Result;
use crate::table::{row_key, Table};
use arrow::array::{Array, UInt32Array};
use std::collections::HashMap;

/// Keep one row per distinct value of `keys`
///
/// The surviving row has the greatest `order_by` value (an Int64 column);
/// nulls sort lowest, and ties or `order_by = None` go to the row read last.
/// Survivors keep their relative input order. Null key cells form a key of
/// their own.
pub fn keep_last(table: &Table, keys: &[&str], order_by: Option<&str>) -> Result<Table> {
    let key_columns = keys
        .iter()
        .map(|k| table.column(k))
        .collect::<Result<Vec<_>>>()?;
    let order = order_by.map(|c| table.i64_column(c)).transpose()?;

    let mut winners: HashMap<Vec<Option<String>>, (usize, Option<i64>)> = HashMap::new();
    for row in 0..table.num_rows() {
        let key = row_key(&key_columns, row)?;
        let rank = order.and_then(|o| (!o.is_null(row)).then(|| o.value(row)));

        winners
            .entry(key)
            .and_modify(|(best_row, best_rank)| {
                if rank >= *best_rank {
                    *best_row = row;
                    *best_rank = rank;
                }
            })
            .or_insert((row, rank));
    }

    if winners.len() == table.num_rows() {
        return Ok(table.clone());
    }

    let mut rows: Vec<u32> = winners.into_values().map(|(row, _)| row as u32).collect();
    rows.sort_unstable();
    table.take(&UInt32Array::from(rows))
}
