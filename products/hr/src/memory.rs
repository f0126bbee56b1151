//! In-memory `DirectoryStore` used by unit and property tests.

use std::{
    cmp::Ordering,
    collections::{BTreeMap, HashMap},
    sync::{
        Mutex, MutexGuard,
        atomic::{AtomicBool, AtomicUsize, Ordering as AtomicOrdering},
    },
};

use async_trait::async_trait;
use chrono::NaiveDate;
use entity::employees;
use sea_orm::DbErr;

use crate::{
    DirectoryError, DirectoryResult, DirectoryStore, EmployeeId, ListQuery, SortField, SortOrder,
};

pub fn employee(
    id: EmployeeId,
    full_name: &str,
    salary: Option<i64>,
    manager_id: Option<EmployeeId>,
) -> employees::Model {
    employees::Model {
        id,
        full_name: full_name.to_string(),
        position: "Engineer".to_string(),
        hire_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap() + chrono::Days::new(id as u64),
        salary: salary.unwrap_or(50_000) as f64,
        manager_id,
    }
}

#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<BTreeMap<EmployeeId, employees::Model>>,
    writes: AtomicUsize,
    failing: AtomicBool,
}

impl MemoryStore {
    pub fn with_employees(rows: impl IntoIterator<Item = employees::Model>) -> Self {
        let store = Self::default();
        store
            .lock()
            .extend(rows.into_iter().map(|row| (row.id, row)));
        store
    }

    /// Current `id -> manager_id` edges.
    pub fn edges(&self) -> BTreeMap<EmployeeId, Option<EmployeeId>> {
        self.lock()
            .values()
            .map(|row| (row.id, row.manager_id))
            .collect()
    }

    pub fn writes(&self) -> usize {
        self.writes.load(AtomicOrdering::SeqCst)
    }

    pub fn fail_reads(&self, failing: bool) {
        self.failing.store(failing, AtomicOrdering::SeqCst);
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<EmployeeId, employees::Model>> {
        self.rows.lock().unwrap()
    }

    fn check_available(&self) -> DirectoryResult<()> {
        if self.failing.load(AtomicOrdering::SeqCst) {
            Err(DirectoryError::Persistence(DbErr::Custom(
                "store offline".into(),
            )))
        } else {
            Ok(())
        }
    }
}

fn compare(field: SortField, a: &employees::Model, b: &employees::Model) -> Ordering {
    match field {
        SortField::Id => a.id.cmp(&b.id),
        SortField::FullName => a.full_name.cmp(&b.full_name),
        SortField::Position => a.position.cmp(&b.position),
        SortField::HireDate => a.hire_date.cmp(&b.hire_date),
        SortField::Salary => a.salary.total_cmp(&b.salary),
        SortField::ManagerId => a.manager_id.cmp(&b.manager_id),
    }
}

#[async_trait]
impl DirectoryStore for MemoryStore {
    async fn find_employee(&self, id: EmployeeId) -> DirectoryResult<Option<employees::Model>> {
        self.check_available()?;
        Ok(self.lock().get(&id).cloned())
    }

    async fn employee_count(&self) -> DirectoryResult<u64> {
        self.check_available()?;
        Ok(self.lock().len() as u64)
    }

    async fn assign_manager(
        &self,
        id: EmployeeId,
        manager_id: Option<EmployeeId>,
    ) -> DirectoryResult<employees::Model> {
        self.check_available()?;
        let mut rows = self.lock();
        let row = rows
            .get_mut(&id)
            .ok_or(DirectoryError::EmployeeNotFound(id))?;
        row.manager_id = manager_id;
        self.writes.fetch_add(1, AtomicOrdering::SeqCst);
        Ok(row.clone())
    }

    async fn list_employees(&self, query: &ListQuery) -> DirectoryResult<Vec<employees::Model>> {
        self.check_available()?;
        let needle = query.search_term().map(str::to_lowercase);
        let mut rows: Vec<_> = self
            .lock()
            .values()
            .filter(|row| match &needle {
                Some(needle) => row.full_name.to_lowercase().contains(needle.as_str()),
                None => true,
            })
            .cloned()
            .collect();
        if let Some(field) = query.sort {
            rows.sort_by(|a, b| {
                let ordering = compare(field, a, b);
                let ordering = match query.order {
                    SortOrder::Asc => ordering,
                    SortOrder::Desc => ordering.reverse(),
                };
                ordering.then(a.id.cmp(&b.id))
            });
        }
        Ok(rows)
    }

    async fn employee_names(
        &self,
        ids: &[EmployeeId],
    ) -> DirectoryResult<HashMap<EmployeeId, String>> {
        self.check_available()?;
        let rows = self.lock();
        Ok(ids
            .iter()
            .filter_map(|id| rows.get(id).map(|row| (*id, row.full_name.clone())))
            .collect())
    }
}
