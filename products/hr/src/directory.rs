//! Listing, name search and column sorting over the directory store.

use std::collections::BTreeSet;

use entity::employees;
use sea_orm::Order;
use tracing::{instrument, warn};

use crate::{DirectoryResult, DirectoryStore, EmployeeId, EmployeeView};

/// Shown in place of the list when the store cannot be read.
pub const LISTING_UNAVAILABLE: &str = "employee list is temporarily unavailable";

/// Attributes the listing can be ordered by.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SortField {
    Id,
    FullName,
    Position,
    HireDate,
    Salary,
    ManagerId,
}

const SORT_FIELDS: &[(&str, SortField)] = &[
    ("id", SortField::Id),
    ("full_name", SortField::FullName),
    ("position", SortField::Position),
    ("hire_date", SortField::HireDate),
    ("salary", SortField::Salary),
    ("manager_id", SortField::ManagerId),
];

impl SortField {
    /// Exact, case-sensitive attribute name lookup.
    pub fn parse(name: &str) -> Option<Self> {
        SORT_FIELDS
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, field)| *field)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortField::Id => "id",
            SortField::FullName => "full_name",
            SortField::Position => "position",
            SortField::HireDate => "hire_date",
            SortField::Salary => "salary",
            SortField::ManagerId => "manager_id",
        }
    }

    pub fn column(self) -> employees::Column {
        match self {
            SortField::Id => employees::Column::Id,
            SortField::FullName => employees::Column::FullName,
            SortField::Position => employees::Column::Position,
            SortField::HireDate => employees::Column::HireDate,
            SortField::Salary => employees::Column::Salary,
            SortField::ManagerId => employees::Column::ManagerId,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// `desc` selects descending order; anything else is ascending.
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("desc") {
            SortOrder::Desc
        } else {
            SortOrder::Asc
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    pub fn reversed(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

impl From<SortOrder> for Order {
    fn from(value: SortOrder) -> Self {
        match value {
            SortOrder::Asc => Order::Asc,
            SortOrder::Desc => Order::Desc,
        }
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ListQuery {
    pub search: Option<String>,
    pub sort: Option<SortField>,
    pub order: SortOrder,
}

impl ListQuery {
    /// Build from raw request parameters. Unknown sort names are dropped.
    pub fn from_params(search: Option<&str>, sort: Option<&str>, order: Option<&str>) -> Self {
        Self {
            search: search
                .map(str::trim)
                .filter(|term| !term.is_empty())
                .map(str::to_string),
            sort: sort.and_then(|name| SortField::parse(name.trim())),
            order: order.map(SortOrder::parse).unwrap_or_default(),
        }
    }

    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
    }
}

/// Result of a listing; `warning` is set when the store failed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Listing {
    pub employees: Vec<EmployeeView>,
    pub warning: Option<String>,
}

pub struct DirectoryQuery<S> {
    store: S,
}

impl<S: DirectoryStore> DirectoryQuery<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// List employees; never fails, degrading to an empty listing with a warning.
    #[instrument(
        name = "hr.employees.list",
        skip_all,
        fields(
            has_search = query.search_term().is_some(),
            sort = query.sort.map(SortField::as_str).unwrap_or("default"),
            order = query.order.as_str()
        )
    )]
    pub async fn list(&self, query: &ListQuery) -> Listing {
        match self.try_list(query).await {
            Ok(employees) => Listing {
                employees,
                warning: None,
            },
            Err(err) => {
                warn!(error = %err, "employee listing degraded");
                Listing {
                    employees: Vec::new(),
                    warning: Some(LISTING_UNAVAILABLE.to_string()),
                }
            }
        }
    }

    async fn try_list(&self, query: &ListQuery) -> DirectoryResult<Vec<EmployeeView>> {
        let rows = self.store.list_employees(query).await?;
        let manager_ids: Vec<EmployeeId> = rows
            .iter()
            .filter_map(|row| row.manager_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let names = self.store.employee_names(&manager_ids).await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let manager_name = row.manager_id.and_then(|id| names.get(&id).cloned());
                EmployeeView::new(row, manager_name)
            })
            .collect())
    }
}
