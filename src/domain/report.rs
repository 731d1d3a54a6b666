use crate::domain::model::{ResultSet, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct SalaryStats {
    pub total_records: usize,
    pub avg: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TopEarner {
    pub division: Value,
    pub gender: Value,
    /// Base_Salary as stored in the source file.
    pub base_salary: Value,
    pub salary: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenderAverage {
    pub gender: Value,
    pub avg: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DepartmentCount {
    pub department: Value,
    pub employees: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DepartmentSalary {
    pub department: Value,
    pub avg: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// The five query results of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationReport {
    pub overall: SalaryStats,
    pub top_paid: Vec<TopEarner>,
    pub by_gender: Vec<GenderAverage>,
    pub department_counts: Vec<DepartmentCount>,
    pub department_salaries: Vec<DepartmentSalary>,
}

impl SalaryStats {
    pub fn to_result_set(&self) -> ResultSet {
        let mut result = ResultSet::new([
            "total_records",
            "AVG_Base_Salary",
            "MIN_Base_Salary",
            "MAX_Base_Salary",
        ]);
        result.push_row(vec![
            self.total_records.into(),
            self.avg.into(),
            self.min.into(),
            self.max.into(),
        ]);
        result
    }
}

pub fn top_paid_result_set(rows: &[TopEarner]) -> ResultSet {
    let mut result = ResultSet::new(["Division", "Gender", "Base_Salary"]);
    for row in rows {
        result.push_row(vec![
            row.division.clone(),
            row.gender.clone(),
            row.base_salary.clone(),
        ]);
    }
    result
}

pub fn gender_average_result_set(rows: &[GenderAverage]) -> ResultSet {
    let mut result = ResultSet::new(["Gender", "AVG_Base_Salary"]);
    for row in rows {
        result.push_row(vec![row.gender.clone(), row.avg.into()]);
    }
    result
}

pub fn department_count_result_set(rows: &[DepartmentCount]) -> ResultSet {
    let mut result = ResultSet::new(["Department_Name", "Employee_Count"]);
    for row in rows {
        result.push_row(vec![row.department.clone(), row.employees.into()]);
    }
    result
}

pub fn department_salary_result_set(rows: &[DepartmentSalary]) -> ResultSet {
    let mut result = ResultSet::new([
        "Department_Name",
        "AVG_Base_Salary",
        "MIN_Base_Salary",
        "MAX_Base_Salary",
    ]);
    for row in rows {
        result.push_row(vec![
            row.department.clone(),
            row.avg.into(),
            row.min.into(),
            row.max.into(),
        ]);
    }
    result
}
