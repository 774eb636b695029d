use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};

/// Typed values of one result column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "values", rename_all = "snake_case")]
pub enum ColumnValues {
    Long(Vec<i64>),
    Double(Vec<f64>),
    String(Vec<String>),
}

impl ColumnValues {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Long(values) => values.len(),
            Self::Double(values) => values.len(),
            Self::String(values) => values.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Long(_) => "long",
            Self::Double(_) => "double",
            Self::String(_) => "string",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub values: ColumnValues,
}

impl Column {
    #[must_use]
    pub fn long(name: impl Into<String>, values: Vec<i64>) -> Self {
        Self {
            name: name.into(),
            values: ColumnValues::Long(values),
        }
    }

    #[must_use]
    pub fn double(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values: ColumnValues::Double(values),
        }
    }

    #[must_use]
    pub fn string(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into(),
            values: ColumnValues::String(values),
        }
    }
}

/// Raw response of the query engine: columns, or a non-empty error string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub num_records: u64,
    pub columns: Vec<Column>,
    #[serde(default)]
    pub error: Option<String>,
}

impl QueryResponse {
    /// Successful response; the record count is the first column's length.
    #[must_use]
    pub fn ok(columns: Vec<Column>) -> Self {
        let num_records = columns
            .first()
            .map_or(0, |column| column.values.len() as u64);
        Self {
            num_records,
            columns,
            error: None,
        }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::ok(Vec::new())
    }

    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            num_records: 0,
            columns: Vec::new(),
            error: Some(message.into()),
        }
    }

    /// Converts the response into a checked result.
    ///
    /// Any non-empty `error` becomes [`PipelineError::Query`]; a column
    /// shorter than `num_records` is reported as a shape error.
    pub fn into_result(self, query: &str) -> PipelineResult<QueryResult> {
        if let Some(message) = self.error.filter(|message| !message.is_empty()) {
            return Err(PipelineError::Query {
                query: query.trim().to_owned(),
                message,
            });
        }

        let num_records = usize::try_from(self.num_records).map_err(|_| {
            PipelineError::QueryShape(format!("record count {} overflows", self.num_records))
        })?;
        if let Some(column) = self
            .columns
            .iter()
            .find(|column| column.values.len() < num_records)
        {
            return Err(PipelineError::QueryShape(format!(
                "column `{}` has {} values for {num_records} records",
                column.name,
                column.values.len()
            )));
        }

        Ok(QueryResult {
            num_records,
            columns: self.columns,
        })
    }
}

/// Checked query result with typed column accessors.
///
/// Accessors trim every column to `num_records`. On an empty result they
/// return empty slices even when the engine omitted the column descriptors.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    num_records: usize,
    columns: Vec<Column>,
}

impl QueryResult {
    #[must_use]
    pub fn num_records(&self) -> usize {
        self.num_records
    }

    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn longs(&self, index: usize) -> PipelineResult<&[i64]> {
        match self.values(index)? {
            None => Ok(&[]),
            Some(ColumnValues::Long(values)) => Ok(&values[..self.num_records]),
            Some(other) => Err(self.type_mismatch(index, "long", other)),
        }
    }

    pub fn doubles(&self, index: usize) -> PipelineResult<&[f64]> {
        match self.values(index)? {
            None => Ok(&[]),
            Some(ColumnValues::Double(values)) => Ok(&values[..self.num_records]),
            Some(other) => Err(self.type_mismatch(index, "double", other)),
        }
    }

    pub fn strings(&self, index: usize) -> PipelineResult<&[String]> {
        match self.values(index)? {
            None => Ok(&[]),
            Some(ColumnValues::String(values)) => Ok(&values[..self.num_records]),
            Some(other) => Err(self.type_mismatch(index, "string", other)),
        }
    }

    /// Values of a numeric column as `f64`, accepting long or double storage.
    pub fn numbers(&self, index: usize) -> PipelineResult<Vec<f64>> {
        match self.values(index)? {
            None => Ok(Vec::new()),
            Some(ColumnValues::Double(values)) => Ok(values[..self.num_records].to_vec()),
            Some(ColumnValues::Long(values)) => Ok(values[..self.num_records]
                .iter()
                .map(|&value| value as f64)
                .collect()),
            Some(other) => Err(self.type_mismatch(index, "numeric", other)),
        }
    }

    fn values(&self, index: usize) -> PipelineResult<Option<&ColumnValues>> {
        match self.columns.get(index) {
            Some(column) => Ok(Some(&column.values)),
            None if self.num_records == 0 => Ok(None),
            None => Err(PipelineError::QueryShape(format!(
                "missing column {index}, result has {} columns",
                self.columns.len()
            ))),
        }
    }

    fn type_mismatch(&self, index: usize, expected: &str, found: &ColumnValues) -> PipelineError {
        let name = self
            .columns
            .get(index)
            .map_or("?", |column| column.name.as_str());
        PipelineError::QueryShape(format!(
            "column {index} (`{name}`) holds {} values, expected {expected}",
            found.type_name()
        ))
    }
}
