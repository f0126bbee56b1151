use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

use crate::EmployeeId;

pub type DirectoryResult<T> = Result<T, DirectoryError>;

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("employee {0} not found")]
    EmployeeNotFound(EmployeeId),
    #[error("manager {0} not found")]
    ManagerNotFound(EmployeeId),
    #[error("employee {0} cannot be their own manager")]
    SelfManagement(EmployeeId),
    #[error("assigning manager {manager_id} to employee {employee_id} would create a reporting cycle")]
    CycleDetected {
        employee_id: EmployeeId,
        manager_id: EmployeeId,
    },
    #[error("reporting chain above employee {manager_id} exceeds {limit} links")]
    ChainLimitExceeded { manager_id: EmployeeId, limit: u64 },
    #[error("data integrity violation: {0}")]
    Integrity(String),
    #[error("persistence failure: {0}")]
    Persistence(DbErr),
}

impl DirectoryError {
    /// Rejections raised before any write was attempted.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            DirectoryError::EmployeeNotFound(_)
                | DirectoryError::ManagerNotFound(_)
                | DirectoryError::SelfManagement(_)
                | DirectoryError::CycleDetected { .. }
        )
    }
}

impl From<DbErr> for DirectoryError {
    fn from(value: DbErr) -> Self {
        match value.sql_err() {
            Some(SqlErr::ForeignKeyConstraintViolation(detail))
            | Some(SqlErr::UniqueConstraintViolation(detail)) => DirectoryError::Integrity(detail),
            _ => DirectoryError::Persistence(value),
        }
    }
}
