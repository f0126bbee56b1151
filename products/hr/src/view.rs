use chrono::NaiveDate;
use entity::employees;
use serde::Serialize;

use crate::EmployeeId;

/// Employee as exposed over HTTP, with the manager's name denormalized.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EmployeeView {
    pub id: EmployeeId,
    pub full_name: String,
    pub position: String,
    pub hire_date: NaiveDate,
    pub salary: f64,
    pub manager_id: Option<EmployeeId>,
    pub manager_name: Option<String>,
}

impl EmployeeView {
    pub fn new(model: employees::Model, manager_name: Option<String>) -> Self {
        Self {
            id: model.id,
            full_name: model.full_name,
            position: model.position,
            hire_date: model.hire_date,
            salary: model.salary,
            manager_id: model.manager_id,
            manager_name,
        }
    }
}
