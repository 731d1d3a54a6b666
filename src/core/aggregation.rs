use crate::domain::model::{Table, Value};
use crate::domain::report::{
    DepartmentCount, DepartmentSalary, GenderAverage, SalaryStats, TopEarner,
};
use crate::utils::error::{ReportError, Result};
use std::cmp::Ordering;
use std::collections::HashMap;

pub const DIVISION: &str = "Division";
pub const GENDER: &str = "Gender";
pub const DEPARTMENT_NAME: &str = "Department_Name";
pub const BASE_SALARY: &str = "Base_Salary";

pub const TOP_PAID_LIMIT: usize = 5;

/// Per-key accumulator of a group scan. `rows` counts every row of the group,
/// `values` only the rows with a non-null aggregate value.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupStats {
    pub key: Value,
    pub rows: usize,
    pub values: usize,
    pub sum: f64,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl GroupStats {
    fn new(key: Value) -> Self {
        Self {
            key,
            rows: 0,
            values: 0,
            sum: 0.0,
            min: None,
            max: None,
        }
    }

    fn add(&mut self, value: Option<f64>) {
        self.rows += 1;
        if let Some(v) = value {
            self.values += 1;
            self.sum += v;
            self.min = Some(self.min.map_or(v, |m| m.min(v)));
            self.max = Some(self.max.map_or(v, |m| m.max(v)));
        }
    }

    pub fn avg(&self) -> Option<f64> {
        (self.values > 0).then(|| self.sum / self.values as f64)
    }
}

fn require_column(table: &Table, name: &str) -> Result<usize> {
    table
        .column_index(name)
        .ok_or_else(|| ReportError::MissingColumnError {
            table: crate::core::context::EMPLOYEE_TABLE.to_string(),
            column: name.to_string(),
        })
}

/// `CAST(column AS DOUBLE)` for every row; the first non-numeric value aborts.
fn cast_column(table: &Table, name: &str) -> Result<Vec<Option<f64>>> {
    let idx = require_column(table, name)?;
    table
        .rows()
        .iter()
        .enumerate()
        .map(|(row, values)| {
            values[idx].to_f64().map_err(|value| ReportError::CastError {
                column: name.to_string(),
                row: row + 1,
                value,
            })
        })
        .collect()
}

fn group_key(value: &Value) -> Option<String> {
    (!value.is_null()).then(|| value.to_string())
}

/// Single pass over the table grouping by `group_col`. Groups come back in
/// order of first appearance.
pub fn group_by(table: &Table, group_col: &str, agg_col: Option<&str>) -> Result<Vec<GroupStats>> {
    let gidx = require_column(table, group_col)?;
    let values = match agg_col {
        Some(col) => Some(cast_column(table, col)?),
        None => None,
    };

    let mut index: HashMap<Option<String>, usize> = HashMap::new();
    let mut groups: Vec<GroupStats> = Vec::new();

    for (i, row) in table.rows().iter().enumerate() {
        let key = &row[gidx];
        let slot = *index.entry(group_key(key)).or_insert_with(|| {
            groups.push(GroupStats::new(key.clone()));
            groups.len() - 1
        });
        groups[slot].add(values.as_ref().and_then(|v| v[i]));
    }

    Ok(groups)
}

/// Descending order with nulls last.
fn desc_nulls_last(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.total_cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

pub fn overall_stats(table: &Table) -> Result<SalaryStats> {
    let salaries = cast_column(table, BASE_SALARY)?;

    let mut stats = GroupStats::new(Value::Null);
    for salary in salaries {
        stats.add(salary);
    }

    Ok(SalaryStats {
        total_records: stats.rows,
        avg: stats.avg(),
        min: stats.min,
        max: stats.max,
    })
}

pub fn top_paid(table: &Table, limit: usize) -> Result<Vec<TopEarner>> {
    let division = require_column(table, DIVISION)?;
    let gender = require_column(table, GENDER)?;
    let base_salary = require_column(table, BASE_SALARY)?;
    let salaries = cast_column(table, BASE_SALARY)?;

    let mut order: Vec<usize> = (0..table.row_count()).collect();
    // sort_by is stable, ties keep input order
    order.sort_by(|&a, &b| desc_nulls_last(salaries[a], salaries[b]));

    Ok(order
        .into_iter()
        .take(limit)
        .map(|i| {
            let row = &table.rows()[i];
            TopEarner {
                division: row[division].clone(),
                gender: row[gender].clone(),
                base_salary: row[base_salary].clone(),
                salary: salaries[i],
            }
        })
        .collect())
}

pub fn average_by_gender(table: &Table) -> Result<Vec<GenderAverage>> {
    let mut rows: Vec<GenderAverage> = group_by(table, GENDER, Some(BASE_SALARY))?
        .into_iter()
        .map(|g| GenderAverage {
            avg: g.avg(),
            gender: g.key,
        })
        .collect();
    rows.sort_by(|a, b| desc_nulls_last(a.avg, b.avg));
    Ok(rows)
}

pub fn count_by_department(table: &Table) -> Result<Vec<DepartmentCount>> {
    let mut rows: Vec<DepartmentCount> = group_by(table, DEPARTMENT_NAME, None)?
        .into_iter()
        .map(|g| DepartmentCount {
            department: g.key,
            employees: g.rows,
        })
        .collect();
    rows.sort_by(|a, b| b.employees.cmp(&a.employees));
    Ok(rows)
}

pub fn salary_by_department(table: &Table) -> Result<Vec<DepartmentSalary>> {
    Ok(group_by(table, DEPARTMENT_NAME, Some(BASE_SALARY))?
        .into_iter()
        .map(|g| DepartmentSalary {
            avg: g.avg(),
            min: g.min,
            max: g.max,
            department: g.key,
        })
        .collect())
}
