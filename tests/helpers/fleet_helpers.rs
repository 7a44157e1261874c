use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fleetops::application::services::{AssignmentService, CacheLayer};
use fleetops::domain::entities::*;
use fleetops::domain::ports::cache_store::{CacheError, CacheResult, CacheStore};
use fleetops::infrastructure::cache::InMemoryCacheStore;
use fleetops::infrastructure::persistence::Database;
use fleetops::infrastructure::runtime::FixedClock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub fn at(s: &str) -> DateTime<Utc> {
    parse_instant("test", s).expect("valid test instant")
}

pub async fn create_test_driver(db: &Database, name: &str) -> Driver {
    let driver = Driver::new(name.to_string(), format!("LIC-{}", name));
    db.create_driver(&driver).await.expect("Failed to create driver");
    driver
}

pub async fn create_test_vehicle(db: &Database, plate: &str) -> Vehicle {
    let vehicle = Vehicle::new(plate.to_string(), "Volvo".to_string(), "FH16".to_string());
    db.create_vehicle(&vehicle).await.expect("Failed to create vehicle");
    vehicle
}

pub async fn create_test_route(db: &Database) -> Route {
    let route = Route::new("Rotterdam".to_string(), "Hamburg".to_string());
    db.create_route(&route).await.expect("Failed to create route");
    route
}

/// One route plus two drivers and two vehicles.
pub struct Fleet {
    pub route: Route,
    pub drivers: Vec<Driver>,
    pub vehicles: Vec<Vehicle>,
}

impl Fleet {
    pub fn driver(&self, i: usize) -> &str {
        &self.drivers[i].id
    }

    pub fn vehicle(&self, i: usize) -> &str {
        &self.vehicles[i].id
    }

    pub fn route(&self) -> &str {
        &self.route.id
    }

    /// Booking of driver `driver` and vehicle `vehicle` onto the fleet's route.
    pub fn request(
        &self,
        driver: usize,
        vehicle: usize,
        start: &str,
        end: Option<&str>,
    ) -> CreateAssignmentRequest {
        create_request(self.driver(driver), self.vehicle(vehicle), self.route(), start, end)
    }
}

pub async fn seed_fleet(db: &Database) -> Fleet {
    Fleet {
        route: create_test_route(db).await,
        drivers: vec![
            create_test_driver(db, "alice").await,
            create_test_driver(db, "bob").await,
        ],
        vehicles: vec![
            create_test_vehicle(db, "NL-01-AB").await,
            create_test_vehicle(db, "NL-02-CD").await,
        ],
    }
}

pub fn create_request(
    driver_id: &str,
    vehicle_id: &str,
    route_id: &str,
    start: &str,
    end: Option<&str>,
) -> CreateAssignmentRequest {
    CreateAssignmentRequest {
        driver_id: Some(driver_id.to_string()),
        vehicle_id: Some(vehicle_id.to_string()),
        route_id: Some(route_id.to_string()),
        start_date: Some(start.to_string()),
        end_date: end.map(str::to_string),
    }
}

pub struct ServiceHarness {
    pub service: AssignmentService,
    pub clock: FixedClock,
}

pub fn build_service(db: &Database, cache: CacheLayer) -> ServiceHarness {
    let clock = FixedClock::new(at("2024-01-12T12:00:00Z"));
    let service = AssignmentService::new(
        Arc::new(db.clone()),
        Arc::new(db.clone()),
        cache,
        Arc::new(clock.clone()),
    );
    ServiceHarness { service, clock }
}

pub fn memory_cache(store: &InMemoryCacheStore) -> CacheLayer {
    CacheLayer::new(Arc::new(store.clone()), "cache:", Duration::from_secs(300))
}

pub fn build_cached_service(db: &Database) -> (ServiceHarness, InMemoryCacheStore) {
    let store = InMemoryCacheStore::new();
    (build_service(db, memory_cache(&store)), store)
}

/// Backend that fails every call, as an unreachable Redis would.
#[derive(Default)]
pub struct UnavailableCacheStore {
    pub calls: AtomicU64,
}

impl UnavailableCacheStore {
    fn fail<T>(&self) -> CacheResult<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(CacheError::Unavailable("connection refused".to_string()))
    }
}

#[async_trait]
impl CacheStore for UnavailableCacheStore {
    async fn get(&self, _key: &str) -> CacheResult<Option<String>> {
        self.fail()
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> CacheResult<()> {
        self.fail()
    }

    async fn delete_matching(&self, _pattern: &str) -> CacheResult<u64> {
        self.fail()
    }

    async fn incr(&self, _key: &str, _ttl: Duration) -> CacheResult<i64> {
        self.fail()
    }
}

/// Every pair of live assignments sharing a driver or a vehicle is disjoint.
pub fn assert_no_overlaps(assignments: &[Assignment]) {
    for (i, a) in assignments.iter().enumerate() {
        for b in &assignments[i + 1..] {
            let shares = a.driver_id == b.driver_id || a.vehicle_id == b.vehicle_id;
            assert!(
                !(shares && a.interval().overlaps(&b.interval())),
                "assignments {} and {} overlap",
                a.id,
                b.id
            );
        }
    }
}
