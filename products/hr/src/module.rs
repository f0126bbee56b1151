use chrono::NaiveDate;
use entity::employees;
use platform_db::DbPool;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ActiveValue::Set, EntityTrait, PaginatorTrait,
    TransactionTrait,
};
use tracing::{info, warn};

use crate::{
    DirectoryError, DirectoryQuery, DirectoryResult, EmployeeId, EmployeeView,
    HierarchyValidator, ListQuery, Listing, SeaOrmStore,
};

/// (full name, position, hire date, salary, index of manager within this table)
type DemoRow = (&'static str, &'static str, (i32, u32, u32), f64, Option<usize>);

const DEMO_STAFF: &[DemoRow] = &[
    ("Olga Ivanova", "Chief Executive Officer", (2012, 4, 2), 420_000.0, None),
    ("Ivan Petrov", "Chief Technology Officer", (2014, 9, 15), 310_000.0, Some(0)),
    ("Anna Smirnova", "Chief Financial Officer", (2015, 1, 12), 295_000.0, Some(0)),
    ("Petr Ivanov", "Engineering Manager", (2017, 6, 1), 210_000.0, Some(1)),
    ("Maria Kuznetsova", "Senior Engineer", (2019, 3, 18), 165_000.0, Some(3)),
    ("Dmitry Sokolov", "Engineer", (2021, 11, 8), 120_000.0, Some(3)),
    ("Elena Volkova", "Accountant", (2020, 2, 24), 98_000.0, Some(2)),
];

/// Employee directory entry point used by the HTTP layer.
#[derive(Clone, Debug)]
pub struct HrModule {
    db: DbPool,
    chain_limit: Option<u64>,
}

impl HrModule {
    pub fn new(db: DbPool) -> Self {
        Self {
            db,
            chain_limit: None,
        }
    }

    pub fn with_chain_limit(mut self, limit: Option<u64>) -> Self {
        self.chain_limit = limit;
        self
    }

    pub fn db(&self) -> &DbPool {
        &self.db
    }

    pub async fn employees(&self, query: &ListQuery) -> Listing {
        DirectoryQuery::new(SeaOrmStore::new(&self.db))
            .list(query)
            .await
    }

    /// Validate and persist a manager change inside one transaction.
    ///
    /// Every error path rolls back before returning.
    pub async fn set_manager(
        &self,
        employee_id: EmployeeId,
        manager_id: Option<EmployeeId>,
    ) -> DirectoryResult<EmployeeView> {
        let txn = self.db.begin().await?;
        let result = HierarchyValidator::new(SeaOrmStore::new(&txn))
            .with_chain_limit(self.chain_limit)
            .set_manager(employee_id, manager_id)
            .await;
        match result {
            Ok(view) => {
                txn.commit().await?;
                Ok(view)
            }
            Err(err) => {
                if let Err(rollback) = txn.rollback().await {
                    warn!(error = %rollback, "rollback after rejected manager change failed");
                }
                Err(err)
            }
        }
    }

    /// Insert a small demonstration org chart into an empty directory.
    ///
    /// Returns the number of inserted employees.
    pub async fn seed_demo(&self) -> DirectoryResult<usize> {
        let existing = employees::Entity::find().count(&self.db).await?;
        if existing > 0 {
            info!(existing, "directory already populated; skipping seed");
            return Ok(0);
        }

        let txn = self.db.begin().await?;
        let mut inserted: Vec<EmployeeId> = Vec::with_capacity(DEMO_STAFF.len());
        for (full_name, position, (year, month, day), salary, manager) in DEMO_STAFF {
            let hire_date = NaiveDate::from_ymd_opt(*year, *month, *day).ok_or_else(|| {
                DirectoryError::Integrity(format!("invalid hire date for {full_name}"))
            })?;
            let row = employees::ActiveModel {
                id: NotSet,
                full_name: Set(full_name.to_string()),
                position: Set(position.to_string()),
                hire_date: Set(hire_date),
                salary: Set(*salary),
                manager_id: Set(manager.and_then(|index| inserted.get(index).copied())),
            }
            .insert(&txn)
            .await?;
            inserted.push(row.id);
        }
        txn.commit().await?;
        info!(count = inserted.len(), "seeded demo employees");
        Ok(inserted.len())
    }
}
