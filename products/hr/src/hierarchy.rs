//! Manager reassignment guarded against self-management and reporting cycles.

use entity::employees;
use tracing::{info, instrument, warn};

use crate::{DirectoryError, DirectoryResult, DirectoryStore, EmployeeId, EmployeeView};

pub struct HierarchyValidator<S> {
    store: S,
    chain_limit: Option<u64>,
}

impl<S: DirectoryStore> HierarchyValidator<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            chain_limit: None,
        }
    }

    /// Cap the ancestor walk at `limit` links instead of the employee count.
    pub fn with_chain_limit(mut self, limit: Option<u64>) -> Self {
        self.chain_limit = limit;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Point `employee_id` at `new_manager_id`, or clear the link when `None`.
    ///
    /// Nothing is written unless every check passes.
    #[instrument(name = "hr.set_manager", skip(self))]
    pub async fn set_manager(
        &self,
        employee_id: EmployeeId,
        new_manager_id: Option<EmployeeId>,
    ) -> DirectoryResult<EmployeeView> {
        let employee = self
            .store
            .find_employee(employee_id)
            .await?
            .ok_or(DirectoryError::EmployeeNotFound(employee_id))?;

        let Some(manager_id) = new_manager_id else {
            let updated = self.store.assign_manager(employee.id, None).await?;
            info!("manager cleared");
            return Ok(EmployeeView::new(updated, None));
        };

        if manager_id == employee_id {
            info!("rejected self-management");
            return Err(DirectoryError::SelfManagement(employee_id));
        }

        let manager = self
            .store
            .find_employee(manager_id)
            .await?
            .ok_or(DirectoryError::ManagerNotFound(manager_id))?;

        self.ensure_not_ancestor(employee_id, &manager).await?;

        let updated = self
            .store
            .assign_manager(employee.id, Some(manager.id))
            .await?;
        info!("manager assigned");
        Ok(EmployeeView::new(updated, Some(manager.full_name)))
    }

    /// Walk upward from `manager` and fail if `employee_id` is one of its ancestors.
    async fn ensure_not_ancestor(
        &self,
        employee_id: EmployeeId,
        manager: &employees::Model,
    ) -> DirectoryResult<()> {
        // A forest of n employees has chains of at most n - 1 links.
        let limit = match self.chain_limit {
            Some(limit) => limit,
            None => self.store.employee_count().await?,
        };
        let mut cursor = manager.manager_id;
        let mut steps = 0u64;
        while let Some(ancestor_id) = cursor {
            if ancestor_id == employee_id {
                info!(ancestor_id, "rejected reporting cycle");
                return Err(DirectoryError::CycleDetected {
                    employee_id,
                    manager_id: manager.id,
                });
            }
            if steps >= limit {
                warn!(manager_id = manager.id, limit, "ancestor chain did not terminate");
                return Err(DirectoryError::ChainLimitExceeded {
                    manager_id: manager.id,
                    limit,
                });
            }
            steps += 1;
            cursor = match self.store.find_employee(ancestor_id).await? {
                Some(ancestor) => ancestor.manager_id,
                None => {
                    warn!(ancestor_id, "dangling manager reference ends the chain");
                    None
                }
            };
        }
        Ok(())
    }
}
