use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Registry collections an assignment references by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Driver,
    Vehicle,
    Route,
}

impl ResourceKind {
    pub fn table(&self) -> &'static str {
        match self {
            ResourceKind::Driver => "drivers",
            ResourceKind::Vehicle => "vehicles",
            ResourceKind::Route => "routes",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Driver => write!(f, "Driver"),
            ResourceKind::Vehicle => write!(f, "Vehicle"),
            ResourceKind::Route => write!(f, "Route"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Driver {
    pub id: String,
    pub name: String,
    pub license_number: String,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Driver {
    pub fn new(name: String, license_number: String) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            license_number,
            status: "active".to_string(),
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: String,
    pub license_plate: String,
    pub make: String,
    pub model: String,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Vehicle {
    pub fn new(license_plate: String, make: String, model: String) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: Uuid::new_v4().to_string(),
            license_plate,
            make,
            model,
            status: "active".to_string(),
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    pub id: String,
    pub origin: String,
    pub destination: String,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Route {
    pub fn new(origin: String, destination: String) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: Uuid::new_v4().to_string(),
            origin,
            destination,
            status: "active".to_string(),
            created_at: now.clone(),
            updated_at: now,
        }
    }
}
