use crate::domain::model::{ColumnType, Table, Value};
use crate::utils::error::{ReportError, Result};
use csv::ReaderBuilder;

/// Parse delimited text into a [`Table`]. The first row is the header and
/// every column type is inferred from all of its non-empty cells.
pub fn parse_csv(data: &[u8], delimiter: u8) -> Result<Table> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .from_reader(data);

    let columns: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if columns.is_empty() || columns.iter().all(|c| c.is_empty()) {
        return Err(ReportError::IoError(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "input has no header row",
        )));
    }

    let mut records = Vec::new();
    for record in reader.records() {
        records.push(record?);
    }

    let types: Vec<ColumnType> = (0..columns.len())
        .map(|idx| infer_type(records.iter().map(|r| r.get(idx).unwrap_or(""))))
        .collect();

    let rows = records
        .iter()
        .map(|record| {
            record
                .iter()
                .zip(&types)
                .map(|(field, column_type)| to_value(field, *column_type))
                .collect()
        })
        .collect::<Vec<Vec<Value>>>();

    tracing::debug!(
        "Parsed {} rows with schema {:?}",
        rows.len(),
        columns.iter().zip(&types).collect::<Vec<_>>()
    );

    Ok(Table::new(columns, types, rows))
}

fn infer_type<'a>(fields: impl Iterator<Item = &'a str>) -> ColumnType {
    let mut inferred: Option<ColumnType> = None;

    for field in fields.map(str::trim).filter(|f| !f.is_empty()) {
        let field_type = if field.parse::<i64>().is_ok() {
            ColumnType::Integer
        } else if field.parse::<f64>().is_ok() {
            ColumnType::Double
        } else {
            return ColumnType::String;
        };

        inferred = match (inferred, field_type) {
            (Some(ColumnType::Double), _) | (_, ColumnType::Double) => Some(ColumnType::Double),
            _ => Some(ColumnType::Integer),
        };
    }

    inferred.unwrap_or(ColumnType::String)
}

/// Blank cells, whitespace included, are null, matching `infer_type`.
fn to_value(field: &str, column_type: ColumnType) -> Value {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }

    match column_type {
        ColumnType::Integer => trimmed
            .parse()
            .map(Value::Int)
            .unwrap_or_else(|_| Value::Str(field.to_string())),
        ColumnType::Double => trimmed
            .parse()
            .map(Value::Float)
            .unwrap_or_else(|_| Value::Str(field.to_string())),
        ColumnType::String => Value::Str(field.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Department,Department_Name,Division,Gender,Base_Salary,Grade
ABS,Alcohol Beverage Services,Admin,M,175873.0,M2
ABS,Alcohol Beverage Services,Warehouse,F,145613.36,M3
HHS,Health and Human Services,Clinic,F,,18
";

    #[test]
    fn test_header_and_row_count() {
        let table = parse_csv(SAMPLE.as_bytes(), b',').unwrap();

        assert_eq!(table.row_count(), 3);
        assert_eq!(
            table.columns(),
            &[
                "Department",
                "Department_Name",
                "Division",
                "Gender",
                "Base_Salary",
                "Grade"
            ]
        );
    }

    #[test]
    fn test_schema_inference() {
        let table = parse_csv(SAMPLE.as_bytes(), b',').unwrap();

        assert_eq!(table.types()[0], ColumnType::String);
        assert_eq!(table.types()[4], ColumnType::Double);
        // "M2" makes the whole Grade column a string
        assert_eq!(table.types()[5], ColumnType::String);
    }

    #[test]
    fn test_empty_field_is_null() {
        let table = parse_csv(SAMPLE.as_bytes(), b',').unwrap();
        let salary = table.column_index("Base_Salary").unwrap();

        assert_eq!(table.rows()[0][salary], Value::Float(175873.0));
        assert_eq!(table.rows()[2][salary], Value::Null);
    }

    #[test]
    fn test_whitespace_only_field_is_null() {
        let data = "Division,Gender,Department_Name,Base_Salary\nA,M,X,100\nB,F,Y, \n";
        let table = parse_csv(data.as_bytes(), b',').unwrap();

        assert_eq!(table.types()[3], ColumnType::Integer);
        assert_eq!(table.rows()[0][3], Value::Int(100));
        assert_eq!(table.rows()[1][3], Value::Null);
    }

    #[test]
    fn test_integer_and_mixed_numeric_columns() {
        let data = "a,b\n1,1\n2,2.5\n";
        let table = parse_csv(data.as_bytes(), b',').unwrap();

        assert_eq!(table.types(), &[ColumnType::Integer, ColumnType::Double]);
        assert_eq!(table.rows()[1][1], Value::Float(2.5));
        assert_eq!(table.rows()[0][1], Value::Float(1.0));
    }

    #[test]
    fn test_custom_delimiter() {
        let data = "Division;Base_Salary\nA;100\n";
        let table = parse_csv(data.as_bytes(), b';').unwrap();

        assert_eq!(table.columns(), &["Division", "Base_Salary"]);
        assert_eq!(table.rows()[0][1], Value::Int(100));
    }

    #[test]
    fn test_ragged_rows_fail() {
        let data = "a,b\n1,2\n3\n";
        let err = parse_csv(data.as_bytes(), b',').unwrap_err();
        assert!(matches!(err, ReportError::CsvError(_)));
    }

    #[test]
    fn test_empty_input_fails() {
        let err = parse_csv(b"", b',').unwrap_err();
        assert!(matches!(err, ReportError::IoError(_)));
    }

    #[test]
    fn test_header_only_gives_empty_table() {
        let table = parse_csv(b"Division,Base_Salary\n", b',').unwrap();
        assert_eq!(table.row_count(), 0);
        assert_eq!(table.types(), &[ColumnType::String, ColumnType::String]);
    }
}
