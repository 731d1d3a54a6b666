use crate::domain::model::{ResultSet, Table};
use crate::domain::report::{
    department_count_result_set, department_salary_result_set, gender_average_result_set,
    top_paid_result_set, AggregationReport,
};
use std::fmt::Write;

pub const PREVIEW_ROWS: usize = 5;
const MAX_CELL_WIDTH: usize = 20;
const MIN_CELL_WIDTH: usize = 3;

/// Schema tree, one line per column.
pub fn format_schema(table: &Table) -> String {
    let mut out = String::from("root\n");
    for (name, column_type) in table.columns().iter().zip(table.types()) {
        let _ = writeln!(out, " |-- {}: {} (nullable = true)", name, column_type.name());
    }
    out
}

fn truncate_cell(cell: String) -> String {
    if cell.chars().count() > MAX_CELL_WIDTH {
        let mut short: String = cell.chars().take(MAX_CELL_WIDTH - 3).collect();
        short.push_str("...");
        short
    } else {
        cell
    }
}

/// Fixed-width grid of at most `max_rows` rows with right-aligned cells.
pub fn format_table(result: &ResultSet, max_rows: usize) -> String {
    let header: Vec<String> = result
        .columns
        .iter()
        .map(|c| truncate_cell(c.clone()))
        .collect();
    let cells: Vec<Vec<String>> = result
        .rows
        .iter()
        .take(max_rows)
        .map(|row| row.iter().map(|v| truncate_cell(v.to_string())).collect())
        .collect();

    let widths: Vec<usize> = header
        .iter()
        .enumerate()
        .map(|(i, h)| {
            cells
                .iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(h.chars().count()))
                .max()
                .unwrap_or(0)
                .max(MIN_CELL_WIDTH)
        })
        .collect();

    let separator = widths.iter().fold(String::from("+"), |mut line, w| {
        line.push_str(&"-".repeat(*w));
        line.push('+');
        line
    });

    let format_row = |row: &[String]| {
        row.iter().zip(&widths).fold(String::from("|"), |mut line, (cell, w)| {
            let _ = write!(line, "{:>width$}|", cell, width = *w);
            line
        })
    };

    let mut out = String::new();
    let _ = writeln!(out, "{}", separator);
    let _ = writeln!(out, "{}", format_row(header.as_slice()));
    let _ = writeln!(out, "{}", separator);
    for row in &cells {
        let _ = writeln!(out, "{}", format_row(row.as_slice()));
    }
    let _ = writeln!(out, "{}", separator);

    if result.len() > max_rows {
        let _ = writeln!(
            out,
            "only showing top {} {}",
            max_rows,
            if max_rows == 1 { "row" } else { "rows" }
        );
    }
    out.push('\n');
    out
}

/// Schema dump, row count and head preview of the loaded table.
pub fn format_overview(table: &Table) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Schema:");
    out.push_str(&format_schema(table));
    out.push('\n');
    let _ = writeln!(out, "Row count: {}", table.row_count());
    out.push_str(&format_table(&table.head(PREVIEW_ROWS + 1), PREVIEW_ROWS));
    out
}

/// Every aggregation result under its heading.
pub fn format_report(report: &AggregationReport) -> String {
    let sections: [(&str, ResultSet); 5] = [
        ("Overall base salary statistics:", report.overall.to_result_set()),
        (
            "Top 5 employees by base salary:",
            top_paid_result_set(&report.top_paid),
        ),
        (
            "Average base salary by gender:",
            gender_average_result_set(&report.by_gender),
        ),
        (
            "Employee count by department:",
            department_count_result_set(&report.department_counts),
        ),
        (
            "Base salary statistics by department:",
            department_salary_result_set(&report.department_salaries),
        ),
    ];

    let mut out = String::new();
    for (heading, result) in &sections {
        let _ = writeln!(out, "{}", heading);
        out.push_str(&format_table(result, usize::MAX));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::loader::parse_csv;
    use crate::domain::model::Value;

    #[test]
    fn test_format_schema() {
        let table = parse_csv(b"Division,Base_Salary\nA,100.5\n", b',').unwrap();

        assert_eq!(
            format_schema(&table),
            "root\n |-- Division: string (nullable = true)\n |-- Base_Salary: double (nullable = true)\n"
        );
    }

    #[test]
    fn test_format_table_grid() {
        let mut result = ResultSet::new(["Gender", "AVG_Base_Salary"]);
        result.push_row(vec![Value::Str("F".to_string()), Value::Float(200.0)]);
        result.push_row(vec![Value::Null, Value::Null]);

        let expected = "\
+------+---------------+
|Gender|AVG_Base_Salary|
+------+---------------+
|     F|          200.0|
|  null|           null|
+------+---------------+

";
        assert_eq!(format_table(&result, usize::MAX), expected);
    }

    #[test]
    fn test_format_table_truncates_long_cells_and_rows() {
        let mut result = ResultSet::new(["x"]);
        result.push_row(vec![Value::Str("Alcohol Beverage Services".to_string())]);
        result.push_row(vec![Value::Str("b".to_string())]);

        let text = format_table(&result, 1);

        assert!(text.contains("|Alcohol Beverage ...|"));
        assert!(!text.contains("b|"));
        assert!(text.ends_with("only showing top 1 row\n\n"));
    }

    #[test]
    fn test_overview_preview_is_limited() {
        let mut data = String::from("Division,Base_Salary\n");
        for i in 0..8 {
            data.push_str(&format!("D{},{}\n", i, i * 10));
        }
        let table = parse_csv(data.as_bytes(), b',').unwrap();

        let text = format_overview(&table);

        assert!(text.contains("Row count: 8\n"));
        assert!(text.contains("D4|"));
        assert!(!text.contains("D5|"));
        assert!(text.contains("only showing top 5 rows"));
    }

    #[test]
    fn test_overview_without_truncation_footer() {
        let table = parse_csv(b"Division,Base_Salary\nA,1\n", b',').unwrap();
        assert!(!format_overview(&table).contains("only showing"));
    }
}
