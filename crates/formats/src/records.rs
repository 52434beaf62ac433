//! Tabular indicator resources: `[{"id": "100", "2015": 6.1, ...}, ...]`.

use std::collections::HashMap;

use foundation::{EntityId, Year};
use serde_json::{Map, Value};
use tracing::warn;

use crate::RecordError;

/// One entity's values, aligned with [`RecordTable::years`].
#[derive(Debug, Clone, PartialEq)]
pub struct EntityRow {
    pub id: EntityId,
    pub values: Vec<f64>,
}

/// Time series of a single entity: `labels` on the x axis, `values` on the y axis.
#[derive(Debug, Clone, PartialEq)]
pub struct IdSlice {
    pub labels: Vec<Year>,
    pub values: Vec<f64>,
}

/// Normalized dataset: entity id -> (year -> value), `NaN` for missing data.
///
/// Rows keep source order. A duplicated id overwrites the earlier values but
/// keeps the earlier position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordTable {
    years: Vec<Year>,
    rows: Vec<EntityRow>,
    index: HashMap<EntityId, usize>,
}

impl RecordTable {
    pub fn parse_json(payload: &str) -> Result<Self, RecordError> {
        let value: Value =
            serde_json::from_str(payload).map_err(|e| RecordError::Json(e.to_string()))?;
        let Value::Array(items) = value else {
            return Err(RecordError::NotAnArray);
        };

        let mut records: Vec<Map<String, Value>> = Vec::with_capacity(items.len());
        for (i, item) in items.into_iter().enumerate() {
            match item {
                Value::Object(map) => records.push(map),
                _ => warn!(index = i, "skipping non-object dataset record"),
            }
        }
        Self::from_records(&records)
    }

    /// Builds the table from already-decoded records.
    ///
    /// Only the first record's keys declare the year columns; columns that
    /// appear solely in later records are ignored.
    pub fn from_records(records: &[Map<String, Value>]) -> Result<Self, RecordError> {
        let first = records.first().ok_or(RecordError::Empty)?;
        let columns = declared_columns(first);

        let mut table = RecordTable {
            years: columns.iter().map(|(y, _)| *y).collect(),
            rows: Vec::with_capacity(records.len()),
            index: HashMap::with_capacity(records.len()),
        };

        for (i, record) in records.iter().enumerate() {
            let Some(id) = record.get("id").and_then(entity_id_from_value) else {
                warn!(index = i, "skipping dataset record without id");
                continue;
            };
            let values = columns
                .iter()
                .map(|(_, key)| record.get(key).map_or(f64::NAN, numeric_value))
                .collect();
            table.upsert(EntityRow { id, values });
        }

        Ok(table)
    }

    fn upsert(&mut self, row: EntityRow) {
        match self.index.get(&row.id) {
            Some(&i) => self.rows[i].values = row.values,
            None => {
                self.index.insert(row.id.clone(), self.rows.len());
                self.rows.push(row);
            }
        }
    }

    pub fn years(&self) -> &[Year] {
        &self.years
    }

    pub fn rows(&self) -> &[EntityRow] {
        &self.rows
    }

    pub fn entity_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.index.contains_key(id)
    }

    pub fn has_year(&self, year: Year) -> bool {
        self.years.contains(&year)
    }

    pub fn year_index(&self, year: Year) -> Option<usize> {
        self.years.iter().position(|y| *y == year)
    }

    /// Value for `(id, year)`; `NaN` when either is unknown or the cell is missing.
    pub fn value(&self, id: &EntityId, year: Year) -> f64 {
        let (Some(&row), Some(col)) = (self.index.get(id), self.year_index(year)) else {
            return f64::NAN;
        };
        self.rows[row].values[col]
    }

    /// Every entity's value for one year, in source order. `None` for an
    /// undeclared year.
    pub fn by_year(&self, year: Year) -> Option<Vec<(EntityId, f64)>> {
        let col = self.year_index(year)?;
        Some(
            self.rows
                .iter()
                .map(|r| (r.id.clone(), r.values[col]))
                .collect(),
        )
    }

    pub fn by_id(&self, id: &EntityId) -> Option<IdSlice> {
        let &row = self.index.get(id)?;
        Some(IdSlice {
            labels: self.years.clone(),
            values: self.rows[row].values.clone(),
        })
    }

    /// Values of one column, missing cells included.
    pub fn column(&self, col: usize) -> impl Iterator<Item = f64> + '_ {
        self.rows
            .iter()
            .filter_map(move |r| r.values.get(col).copied())
    }

    /// All cells, missing ones included.
    pub fn cells(&self) -> impl Iterator<Item = f64> + '_ {
        self.rows.iter().flat_map(|r| r.values.iter().copied())
    }
}

/// Year columns declared by the first record, with their source keys.
fn declared_columns(first: &Map<String, Value>) -> Vec<(Year, String)> {
    let mut columns: Vec<(Year, String)> = Vec::new();
    for key in first.keys().filter(|k| k.as_str() != "id") {
        match Year::parse(key) {
            Some(y) if !columns.iter().any(|(c, _)| *c == y) => columns.push((y, key.clone())),
            Some(_) => {}
            None => warn!(column = %key, "ignoring non-year column in first record"),
        }
    }
    if columns.is_empty() {
        warn!("first record declares no year columns; dataset has no years");
    }
    columns
}

fn entity_id_from_value(v: &Value) -> Option<EntityId> {
    match v {
        Value::String(s) if !s.trim().is_empty() => Some(EntityId::new(s.trim())),
        Value::Number(n) => Some(EntityId::new(n.to_string())),
        _ => None,
    }
}

/// Missing data is a value, not an error: anything non-numeric becomes `NaN`.
fn numeric_value(v: &Value) -> f64 {
    let parsed = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(x) if x.is_finite() => x,
        _ => f64::NAN,
    }
}
