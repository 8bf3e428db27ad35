//! Raw tabular data, before any typing
//!
//! Both input formats are first read into a `RawTable` of strings; typing and
//! validation happen afterwards in one place.

use serde_json::Value;

use crate::columns::HeaderSpec;
use crate::ImportError;

/// Header row plus string cells; every row has exactly `headers.len()` cells
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Read CSV text. The delimiter is `;` when the header line contains
    /// semicolons but no commas, `,` otherwise.
    pub fn from_csv(input: &str) -> Result<Self, ImportError> {
        let input = input.trim_start_matches('\u{feff}');
        let first_line = input.lines().next().unwrap_or_default();
        let delimiter = if first_line.contains(';') && !first_line.contains(',') {
            b';'
        } else {
            b','
        };

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .trim(csv::Trim::All)
            .from_reader(input.as_bytes());

        let headers = reader.headers()?.iter().map(str::to_string).collect();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            if record.iter().all(str::is_empty) {
                continue;
            }
            rows.push(record.iter().map(str::to_string).collect());
        }
        Ok(Self { headers, rows })
    }

    /// Read JSON text.
    ///
    /// Accepts an array of row objects (`[{"col": value}, ...]`) or a
    /// column-oriented object (`{"col": {"0": value, "1": value}}`).
    pub fn from_json(input: &str) -> Result<Self, ImportError> {
        match serde_json::from_str::<Value>(input)? {
            Value::Array(items) => Self::from_records(items),
            Value::Object(columns) => Self::from_columns(columns),
            other => Err(ImportError::JsonLayout(format!(
                "expected an array or object at the top level, found {}",
                json_kind(&other)
            ))),
        }
    }

    fn from_records(items: Vec<Value>) -> Result<Self, ImportError> {
        let mut headers: Vec<String> = Vec::new();
        let mut objects = Vec::with_capacity(items.len());
        for (i, item) in items.into_iter().enumerate() {
            let map = match item {
                Value::Object(map) => map,
                other => {
                    return Err(ImportError::JsonLayout(format!(
                        "row {} is {}, expected an object",
                        i + 1,
                        json_kind(&other)
                    )))
                }
            };
            for key in map.keys() {
                if !headers.contains(key) {
                    headers.push(key.clone());
                }
            }
            objects.push(map);
        }

        let rows = objects
            .iter()
            .map(|map| {
                headers
                    .iter()
                    .map(|h| map.get(h).map(cell_text).unwrap_or_default())
                    .collect()
            })
            .collect();
        Ok(Self { headers, rows })
    }

    fn from_columns(columns: serde_json::Map<String, Value>) -> Result<Self, ImportError> {
        let mut headers = Vec::with_capacity(columns.len());
        let mut cells = Vec::with_capacity(columns.len());
        let mut row_keys: Vec<String> = Vec::new();

        for (name, column) in columns {
            let values = match column {
                Value::Object(values) => values,
                other => {
                    return Err(ImportError::JsonLayout(format!(
                        "column '{name}' is {}, expected an object of row values",
                        json_kind(&other)
                    )))
                }
            };
            for key in values.keys() {
                if !row_keys.contains(key) {
                    row_keys.push(key.clone());
                }
            }
            headers.push(name);
            cells.push(values);
        }

        row_keys.sort_by(|a, b| match (a.parse::<u64>(), b.parse::<u64>()) {
            (Ok(x), Ok(y)) => x.cmp(&y),
            _ => a.cmp(b),
        });

        let rows = row_keys
            .iter()
            .map(|key| {
                cells
                    .iter()
                    .map(|column| column.get(key).map(cell_text).unwrap_or_default())
                    .collect()
            })
            .collect();
        Ok(Self { headers, rows })
    }

    /// Locate each wanted column, returning header indices in `wanted` order.
    ///
    /// All missing columns are reported together.
    pub fn resolve<H: HeaderSpec>(&self, wanted: &[H]) -> Result<Vec<usize>, ImportError> {
        let mut found = Vec::with_capacity(wanted.len());
        let mut missing = Vec::new();
        for spec in wanted {
            match self.headers.iter().position(|h| spec.matches(h)) {
                Some(i) => found.push(i),
                None => missing.push(spec.canonical().to_string()),
            }
        }
        if missing.is_empty() {
            Ok(found)
        } else {
            Err(ImportError::MissingColumns(missing))
        }
    }
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
