use std::collections::HashMap;

use async_trait::async_trait;
use entity::employees;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ActiveValue::Unchanged, ColumnTrait, ConnectionTrait,
    DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    sea_query::{Expr, Func, LikeExpr},
};

use crate::{DirectoryError, DirectoryResult, EmployeeId, ListQuery};

/// Persistence collaborator for the directory: by-id lookup, listing and the
/// single manager write.
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    async fn find_employee(&self, id: EmployeeId) -> DirectoryResult<Option<employees::Model>>;

    async fn employee_count(&self) -> DirectoryResult<u64>;

    async fn assign_manager(
        &self,
        id: EmployeeId,
        manager_id: Option<EmployeeId>,
    ) -> DirectoryResult<employees::Model>;

    async fn list_employees(&self, query: &ListQuery) -> DirectoryResult<Vec<employees::Model>>;

    async fn employee_names(
        &self,
        ids: &[EmployeeId],
    ) -> DirectoryResult<HashMap<EmployeeId, String>>;
}

/// Store backed by any sea-orm connection: the pool, or a transaction.
pub struct SeaOrmStore<'c, C> {
    conn: &'c C,
}

impl<'c, C: ConnectionTrait> SeaOrmStore<'c, C> {
    pub fn new(conn: &'c C) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl<'c, C> DirectoryStore for SeaOrmStore<'c, C>
where
    C: ConnectionTrait + Send + Sync,
{
    async fn find_employee(&self, id: EmployeeId) -> DirectoryResult<Option<employees::Model>> {
        Ok(employees::Entity::find_by_id(id).one(self.conn).await?)
    }

    async fn employee_count(&self) -> DirectoryResult<u64> {
        Ok(employees::Entity::find().count(self.conn).await?)
    }

    async fn assign_manager(
        &self,
        id: EmployeeId,
        manager_id: Option<EmployeeId>,
    ) -> DirectoryResult<employees::Model> {
        let change = employees::ActiveModel {
            id: Unchanged(id),
            manager_id: Set(manager_id),
            ..Default::default()
        };
        change.update(self.conn).await.map_err(|err| match err {
            DbErr::RecordNotUpdated | DbErr::RecordNotFound(_) => {
                DirectoryError::EmployeeNotFound(id)
            }
            other => other.into(),
        })
    }

    async fn list_employees(&self, query: &ListQuery) -> DirectoryResult<Vec<employees::Model>> {
        let mut select = employees::Entity::find();
        if let Some(term) = query.search_term() {
            let pattern = format!("%{}%", escape_like(&term.to_lowercase()));
            let name_expr = Expr::expr(Func::lower(Expr::col(employees::Column::FullName)));
            select = select.filter(name_expr.like(LikeExpr::new(pattern).escape('\\')));
        }
        if let Some(field) = query.sort {
            select = select.order_by(field.column(), query.order.into());
        }
        let rows = select
            .order_by_asc(employees::Column::Id)
            .all(self.conn)
            .await?;
        Ok(rows)
    }

    async fn employee_names(
        &self,
        ids: &[EmployeeId],
    ) -> DirectoryResult<HashMap<EmployeeId, String>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = employees::Entity::find()
            .filter(employees::Column::Id.is_in(ids.iter().copied()))
            .all(self.conn)
            .await?;
        Ok(rows.into_iter().map(|row| (row.id, row.full_name)).collect())
    }
}

fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
