use catalog::{DatasetEntry, ScaleKind, ScalingPolicy};
use compute::RangeAnalyzer;
use foundation::{ValueRange, Year};
use formats::RecordTable;
use layers::{ColorMapper, ScaleError, ScaleResolver};

/// A loaded indicator: records plus everything derived from them.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    entry: DatasetEntry,
    table: RecordTable,
    year_current: Option<Year>,
    scaling_type_current: ScaleKind,
    range: ValueRange,
    mapper: ColorMapper,
}

impl Dataset {
    /// Starts at the first year column, in the policy's own scale mode
    /// (linear if the range cannot carry a log domain).
    pub fn build(
        entry: &DatasetEntry,
        table: RecordTable,
        analyzer: &RangeAnalyzer,
    ) -> Result<Self, ScaleError> {
        let range = analyzer.range(&table);
        let (mapper, mode) = ScaleResolver::resolve_or_linear(&entry.policy, range, entry.policy.kind)?;
        Ok(Self {
            entry: entry.clone(),
            year_current: table.years().first().copied(),
            table,
            scaling_type_current: mode,
            range,
            mapper,
        })
    }

    /// Swaps in a freshly loaded dataset.
    pub fn replace_with(&mut self, next: Dataset) {
        *self = next;
    }

    pub fn name(&self) -> &str {
        &self.entry.name
    }

    pub fn entry(&self) -> &DatasetEntry {
        &self.entry
    }

    pub fn unit(&self) -> &str {
        &self.entry.unit
    }

    pub fn policy(&self) -> &ScalingPolicy {
        &self.entry.policy
    }

    pub fn table(&self) -> &RecordTable {
        &self.table
    }

    pub fn years(&self) -> &[Year] {
        self.table.years()
    }

    pub fn year_current(&self) -> Option<Year> {
        self.year_current
    }

    pub fn scaling_type_current(&self) -> ScaleKind {
        self.scaling_type_current
    }

    pub fn range(&self) -> ValueRange {
        self.range
    }

    pub fn mapper(&self) -> &ColorMapper {
        &self.mapper
    }

    /// Returns `false` for a year the dataset does not declare.
    pub fn set_year(&mut self, year: Year) -> bool {
        if !self.table.has_year(year) {
            return false;
        }
        self.year_current = Some(year);
        true
    }

    /// Re-resolves the color scale; returns the mode actually in effect.
    pub fn set_mode(&mut self, mode: ScaleKind) -> Result<ScaleKind, ScaleError> {
        let (mapper, effective) = ScaleResolver::resolve_or_linear(&self.entry.policy, self.range, mode)?;
        self.mapper = mapper;
        self.scaling_type_current = effective;
        Ok(effective)
    }
}
