use crate::domain::entities::{
    format_instant, Assignment, AssignmentFilter, Interval, OPEN_END_SENTINEL,
};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::assignment_repository::AssignmentRepository;
use crate::infrastructure::persistence::Database;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{any::AnyRow, Any, QueryBuilder, Row, ValueRef};

const ASSIGNMENT_COLUMNS: &str =
    "id, driver_id, vehicle_id, route_id, start_date, end_date, status, \
     created_at, updated_at, deleted_at";

fn parse_stored(column: &str, raw: &str) -> DomainResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DomainError::Internal(format!("Corrupt {} '{}': {}", column, raw, e)))
}

/// The Any driver refuses to decode NULL into `Option<String>`, so test for NULL first.
fn nullable_text(row: &AnyRow, column: &str) -> DomainResult<Option<String>> {
    if row.try_get_raw(column)?.is_null() {
        return Ok(None);
    }
    Ok(Some(row.try_get::<String, _>(column)?))
}

fn parse_stored_opt(row: &AnyRow, column: &str) -> DomainResult<Option<DateTime<Utc>>> {
    nullable_text(row, column)?
        .as_deref()
        .map(|raw| parse_stored(column, raw))
        .transpose()
}

fn row_to_assignment(row: &AnyRow) -> DomainResult<Assignment> {
    let status: String = row.try_get("status")?;
    let start_date: String = row.try_get("start_date")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(Assignment {
        id: row.try_get("id")?,
        driver_id: row.try_get("driver_id")?,
        vehicle_id: row.try_get("vehicle_id")?,
        route_id: row.try_get("route_id")?,
        start_date: parse_stored("start_date", &start_date)?,
        end_date: parse_stored_opt(row, "end_date")?,
        status: status
            .parse()
            .map_err(|_| DomainError::Internal(format!("Corrupt status '{}'", status)))?,
        created_at: parse_stored("created_at", &created_at)?,
        updated_at: parse_stored("updated_at", &updated_at)?,
        deleted_at: parse_stored_opt(row, "deleted_at")?,
    })
}

fn push_filter(builder: &mut QueryBuilder<'_, Any>, filter: &AssignmentFilter) {
    builder.push(" WHERE deleted_at IS NULL");
    if let Some(status) = filter.status {
        builder.push(" AND status = ");
        builder.push_bind(status.as_str().to_string());
    }
    if let Some(start) = filter.start_date {
        builder.push(" AND start_date >= ");
        builder.push_bind(format_instant(&start));
    }
}

impl Database {
    pub async fn create_assignment(&self, assignment: &Assignment) -> DomainResult<()> {
        sqlx::query(
            "INSERT INTO assignments (id, driver_id, vehicle_id, route_id, start_date, end_date,
                                      status, created_at, updated_at, deleted_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&assignment.id)
        .bind(&assignment.driver_id)
        .bind(&assignment.vehicle_id)
        .bind(&assignment.route_id)
        .bind(format_instant(&assignment.start_date))
        .bind(assignment.end_date.as_ref().map(format_instant))
        .bind(assignment.status.as_str())
        .bind(format_instant(&assignment.created_at))
        .bind(format_instant(&assignment.updated_at))
        .bind(assignment.deleted_at.as_ref().map(format_instant))
        .execute(&self.pool)
        .await?;

        tracing::info!("Assignment row inserted: id={}", assignment.id);
        Ok(())
    }

    pub async fn get_assignment_by_id(&self, id: &str) -> DomainResult<Option<Assignment>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM assignments WHERE id = ? AND deleted_at IS NULL",
            ASSIGNMENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_assignment).transpose()
    }

    pub async fn find_overlapping_assignments(
        &self,
        driver_id: &str,
        vehicle_id: &str,
        interval: &Interval,
        exclude_id: Option<&str>,
    ) -> DomainResult<Vec<Assignment>> {
        let proposed_end = interval
            .end
            .as_ref()
            .map(format_instant)
            .unwrap_or_else(|| OPEN_END_SENTINEL.to_string());

        let mut builder = QueryBuilder::<Any>::new(format!(
            "SELECT {} FROM assignments WHERE deleted_at IS NULL AND (driver_id = ",
            ASSIGNMENT_COLUMNS
        ));
        builder.push_bind(driver_id.to_string());
        builder.push(" OR vehicle_id = ");
        builder.push_bind(vehicle_id.to_string());
        builder.push(") AND start_date < ");
        builder.push_bind(proposed_end);
        builder.push(" AND ");
        builder.push_bind(format_instant(&interval.start));
        builder.push(" < COALESCE(end_date, ");
        builder.push_bind(OPEN_END_SENTINEL.to_string());
        builder.push(")");
        if let Some(exclude_id) = exclude_id {
            builder.push(" AND id <> ");
            builder.push_bind(exclude_id.to_string());
        }
        builder.push(" ORDER BY start_date ASC");

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(row_to_assignment).collect()
    }

    pub async fn update_assignment_fields(&self, assignment: &Assignment) -> DomainResult<()> {
        let result = sqlx::query(
            "UPDATE assignments
             SET driver_id = ?, vehicle_id = ?, route_id = ?, start_date = ?, end_date = ?,
                 status = ?, updated_at = ?
             WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(&assignment.driver_id)
        .bind(&assignment.vehicle_id)
        .bind(&assignment.route_id)
        .bind(format_instant(&assignment.start_date))
        .bind(assignment.end_date.as_ref().map(format_instant))
        .bind(assignment.status.as_str())
        .bind(format_instant(&assignment.updated_at))
        .bind(&assignment.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound(format!(
                "Assignment {} not found",
                assignment.id
            )));
        }

        tracing::info!("Assignment row updated: id={}", assignment.id);
        Ok(())
    }

    pub async fn soft_delete_assignment(
        &self,
        id: &str,
        deleted_at: DateTime<Utc>,
    ) -> DomainResult<bool> {
        let stamp = format_instant(&deleted_at);
        let result = sqlx::query(
            "UPDATE assignments SET deleted_at = ?, updated_at = ?
             WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(&stamp)
        .bind(&stamp)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn list_assignments(
        &self,
        filter: &AssignmentFilter,
        limit: i64,
        offset: i64,
    ) -> DomainResult<(Vec<Assignment>, i64)> {
        let mut count_builder =
            QueryBuilder::<Any>::new("SELECT COUNT(*) as count FROM assignments");
        push_filter(&mut count_builder, filter);
        let count_row = count_builder.build().fetch_one(&self.pool).await?;
        let total_count: i64 = count_row.try_get("count")?;

        let mut builder = QueryBuilder::<Any>::new(format!(
            "SELECT {} FROM assignments",
            ASSIGNMENT_COLUMNS
        ));
        push_filter(&mut builder, filter);
        builder.push(" ORDER BY start_date DESC, id ASC LIMIT ");
        builder.push_bind(limit);
        builder.push(" OFFSET ");
        builder.push_bind(offset);

        let rows = builder.build().fetch_all(&self.pool).await?;
        let assignments = rows
            .iter()
            .map(row_to_assignment)
            .collect::<DomainResult<Vec<_>>>()?;

        Ok((assignments, total_count))
    }

    pub async fn list_current_assignments(
        &self,
        now: DateTime<Utc>,
    ) -> DomainResult<Vec<Assignment>> {
        let now = format_instant(&now);
        let rows = sqlx::query(&format!(
            "SELECT {} FROM assignments
             WHERE deleted_at IS NULL
               AND status = 'in_progress'
               AND start_date <= ?
               AND (end_date IS NULL OR end_date >= ?)
             ORDER BY start_date ASC",
            ASSIGNMENT_COLUMNS
        ))
        .bind(&now)
        .bind(&now)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_assignment).collect()
    }
}

#[async_trait]
impl AssignmentRepository for Database {
    async fn insert(&self, assignment: &Assignment) -> DomainResult<()> {
        self.create_assignment(assignment).await
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Assignment>> {
        self.get_assignment_by_id(id).await
    }

    async fn find_overlapping(
        &self,
        driver_id: &str,
        vehicle_id: &str,
        interval: &Interval,
        exclude_id: Option<&str>,
    ) -> DomainResult<Vec<Assignment>> {
        self.find_overlapping_assignments(driver_id, vehicle_id, interval, exclude_id)
            .await
    }

    async fn update_fields(&self, assignment: &Assignment) -> DomainResult<()> {
        self.update_assignment_fields(assignment).await
    }

    async fn soft_delete(&self, id: &str, deleted_at: DateTime<Utc>) -> DomainResult<bool> {
        self.soft_delete_assignment(id, deleted_at).await
    }

    async fn list(
        &self,
        filter: &AssignmentFilter,
        limit: i64,
        offset: i64,
    ) -> DomainResult<(Vec<Assignment>, i64)> {
        self.list_assignments(filter, limit, offset).await
    }

    async fn list_current(&self, now: DateTime<Utc>) -> DomainResult<Vec<Assignment>> {
        self.list_current_assignments(now).await
    }
}
