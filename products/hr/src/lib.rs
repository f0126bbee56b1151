//! Employee directory: listing with name search and column sorting, and
//! manager reassignment that keeps the reporting hierarchy a forest.

mod directory;
mod error;
mod hierarchy;
#[cfg(test)]
mod memory;
mod module;
mod store;
mod view;

pub use directory::{DirectoryQuery, LISTING_UNAVAILABLE, ListQuery, Listing, SortField, SortOrder};
pub use error::{DirectoryError, DirectoryResult};
pub use hierarchy::HierarchyValidator;
pub use module::HrModule;
pub use store::{DirectoryStore, SeaOrmStore};
pub use view::EmployeeView;

/// Primary key of an employee row.
pub type EmployeeId = i32;
