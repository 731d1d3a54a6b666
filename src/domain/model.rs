use std::fmt;

/// A single cell. Empty CSV fields load as `Null`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Str(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// `CAST(value AS DOUBLE)`; `Ok(None)` for nulls, `Err(raw text)` when the
    /// text is not numeric.
    pub fn to_f64(&self) -> std::result::Result<Option<f64>, String> {
        match self {
            Value::Null => Ok(None),
            Value::Int(v) => Ok(Some(*v as f64)),
            Value::Float(v) => Ok(Some(*v)),
            Value::Str(s) => s.trim().parse::<f64>().map(Some).map_err(|_| s.clone()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{:?}", v),
            Value::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<Option<f64>> for Value {
    fn from(v: Option<f64>) -> Self {
        v.map(Value::Float).unwrap_or(Value::Null)
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::Int(v as i64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Double,
    String,
}

impl ColumnType {
    pub fn name(&self) -> &'static str {
        match self {
            ColumnType::Integer => "integer",
            ColumnType::Double => "double",
            ColumnType::String => "string",
        }
    }
}

/// In-memory table loaded from a delimited file. Rows keep file order.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    types: Vec<ColumnType>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(columns: Vec<String>, types: Vec<ColumnType>, rows: Vec<Vec<Value>>) -> Self {
        debug_assert_eq!(columns.len(), types.len());
        Self {
            columns,
            types,
            rows,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn types(&self) -> &[ColumnType] {
        &self.types
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// First `n` rows as a result set, used for the head preview.
    pub fn head(&self, n: usize) -> ResultSet {
        let mut result = ResultSet::new(self.columns.clone());
        for row in self.rows.iter().take(n) {
            result.push_row(row.clone());
        }
        result
    }
}

/// Output table of a single query: ordered column names and ordered rows.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl ResultSet {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<Value>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of one column, top to bottom.
    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(|row| &row[idx]).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_cast_to_f64() {
        assert_eq!(Value::Null.to_f64(), Ok(None));
        assert_eq!(Value::Int(100).to_f64(), Ok(Some(100.0)));
        assert_eq!(Value::Float(1.5).to_f64(), Ok(Some(1.5)));
        assert_eq!(Value::Str(" 200.25 ".to_string()).to_f64(), Ok(Some(200.25)));
        assert_eq!(
            Value::Str("n/a".to_string()).to_f64(),
            Err("n/a".to_string())
        );
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Float(150.0).to_string(), "150.0");
        assert_eq!(Value::Int(7).to_string(), "7");
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(Value::from(None::<f64>), Value::Null);
    }

    #[test]
    fn test_result_set_column_access() {
        let mut result = ResultSet::new(["Gender", "AVG_Base_Salary"]);
        result.push_row(vec![Value::Str("F".to_string()), Value::Float(200.0)]);
        result.push_row(vec![Value::Str("M".to_string()), Value::Float(100.0)]);

        let averages = result.column("AVG_Base_Salary").unwrap();
        assert_eq!(averages, vec![&Value::Float(200.0), &Value::Float(100.0)]);
        assert!(result.column("Division").is_none());
        assert_eq!(result.len(), 2);
    }
}
