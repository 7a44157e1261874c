use crate::domain::entities::{Driver, ResourceKind, Route, Vehicle};
use crate::domain::errors::DomainResult;
use crate::domain::ports::resource_registry::ResourceRegistry;
use crate::infrastructure::persistence::Database;
use async_trait::async_trait;

impl Database {
    pub async fn create_driver(&self, driver: &Driver) -> DomainResult<()> {
        sqlx::query(
            "INSERT INTO drivers (id, name, license_number, status, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&driver.id)
        .bind(&driver.name)
        .bind(&driver.license_number)
        .bind(&driver.status)
        .bind(&driver.created_at)
        .bind(&driver.updated_at)
        .execute(&self.pool)
        .await?;

        tracing::info!("Driver created: id={}", driver.id);
        Ok(())
    }

    pub async fn create_vehicle(&self, vehicle: &Vehicle) -> DomainResult<()> {
        sqlx::query(
            "INSERT INTO vehicles (id, license_plate, make, model, status, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&vehicle.id)
        .bind(&vehicle.license_plate)
        .bind(&vehicle.make)
        .bind(&vehicle.model)
        .bind(&vehicle.status)
        .bind(&vehicle.created_at)
        .bind(&vehicle.updated_at)
        .execute(&self.pool)
        .await?;

        tracing::info!("Vehicle created: id={}", vehicle.id);
        Ok(())
    }

    pub async fn create_route(&self, route: &Route) -> DomainResult<()> {
        sqlx::query(
            "INSERT INTO routes (id, origin, destination, status, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&route.id)
        .bind(&route.origin)
        .bind(&route.destination)
        .bind(&route.status)
        .bind(&route.created_at)
        .bind(&route.updated_at)
        .execute(&self.pool)
        .await?;

        tracing::info!("Route created: id={}", route.id);
        Ok(())
    }

    /// Tombstone a registry record so it no longer resolves.
    pub async fn retire_resource(&self, kind: ResourceKind, id: &str) -> DomainResult<bool> {
        let now = chrono::Utc::now().to_rfc3339();
        let result = sqlx::query(&format!(
            "UPDATE {} SET deleted_at = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL",
            kind.table()
        ))
        .bind(&now)
        .bind(&now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ResourceRegistry for Database {
    async fn exists(&self, kind: ResourceKind, id: &str) -> DomainResult<bool> {
        let row = sqlx::query(&format!(
            "SELECT id FROM {} WHERE id = ? AND deleted_at IS NULL",
            kind.table()
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.is_some())
    }
}
