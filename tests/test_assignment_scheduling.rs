mod helpers;

use fleetops::application::services::CacheLayer;
use fleetops::domain::entities::*;
use fleetops::domain::errors::DomainError;
use helpers::*;

#[tokio::test]
async fn test_overlapping_driver_booking_rejected() {
    let test_db = setup_test_db().await;
    let db = test_db.db();
    let fleet = seed_fleet(db).await;
    let h = build_service(db, CacheLayer::disabled());

    h.service
        .create(fleet.request(0, 0, "2024-01-10", Some("2024-01-15")))
        .await
        .expect("first booking should succeed");

    // Same driver, different vehicle, overlapping on day 14
    let result = h
        .service
        .create(fleet.request(0, 1, "2024-01-14", Some("2024-01-20")))
        .await;

    assert!(matches!(result, Err(DomainError::ScheduleConflict { .. })));

    teardown_test_db(test_db).await;
}

#[tokio::test]
async fn test_touching_boundary_is_not_a_conflict() {
    let test_db = setup_test_db().await;
    let db = test_db.db();
    let fleet = seed_fleet(db).await;
    let h = build_service(db, CacheLayer::disabled());

    h.service
        .create(fleet.request(0, 0, "2024-01-05", Some("2024-01-10")))
        .await
        .unwrap();

    let second = h
        .service
        .create(fleet.request(1, 0, "2024-01-10", Some("2024-01-12")))
        .await;

    assert!(second.is_ok(), "half-open windows that touch must not conflict");

    teardown_test_db(test_db).await;
}

#[tokio::test]
async fn test_open_ended_booking_blocks_everything_after_start() {
    let test_db = setup_test_db().await;
    let db = test_db.db();
    let fleet = seed_fleet(db).await;
    let h = build_service(db, CacheLayer::disabled());

    h.service
        .create(fleet.request(0, 0, "2024-01-10", None))
        .await
        .unwrap();

    let far_future = h
        .service
        .create(fleet.request(1, 0, "2030-06-01", Some("2030-06-02")))
        .await;
    assert!(matches!(far_future, Err(DomainError::ScheduleConflict { .. })));

    let before = h
        .service
        .create(fleet.request(1, 0, "2024-01-01", Some("2024-01-10")))
        .await;
    assert!(before.is_ok());

    teardown_test_db(test_db).await;
}

#[tokio::test]
async fn test_distinct_resources_do_not_conflict() {
    let test_db = setup_test_db().await;
    let db = test_db.db();
    let fleet = seed_fleet(db).await;
    let h = build_service(db, CacheLayer::disabled());

    h.service
        .create(fleet.request(0, 0, "2024-01-10", Some("2024-01-15")))
        .await
        .unwrap();
    let other = h
        .service
        .create(fleet.request(1, 1, "2024-01-10", Some("2024-01-15")))
        .await;

    assert!(other.is_ok());

    teardown_test_db(test_db).await;
}

#[tokio::test]
async fn test_create_validation_and_missing_references() {
    let test_db = setup_test_db().await;
    let db = test_db.db();
    let fleet = seed_fleet(db).await;
    let h = build_service(db, CacheLayer::disabled());

    let mut missing = fleet.request(0, 0, "2024-01-10", None);
    missing.route_id = None;
    match h.service.create(missing).await {
        Err(DomainError::ValidationError(msg)) => assert!(msg.contains("route_id")),
        other => panic!("expected validation error, got {:?}", other),
    }

    let inverted = fleet.request(0, 0, "2024-01-10", Some("2024-01-09"));
    assert!(matches!(
        h.service.create(inverted).await,
        Err(DomainError::ValidationError(_))
    ));

    let garbage = fleet.request(0, 0, "next tuesday", None);
    assert!(matches!(
        h.service.create(garbage).await,
        Err(DomainError::ValidationError(_))
    ));

    let unknown_vehicle =
        create_request(fleet.driver(0), "no-such-vehicle", fleet.route(), "2024-01-10", None);
    match h.service.create(unknown_vehicle).await {
        Err(DomainError::NotFound(msg)) => assert!(msg.contains("no-such-vehicle")),
        other => panic!("expected not found, got {:?}", other),
    }

    teardown_test_db(test_db).await;
}

#[tokio::test]
async fn test_out_of_range_year_is_rejected_before_storage() {
    let test_db = setup_test_db().await;
    let db = test_db.db();
    let fleet = seed_fleet(db).await;
    let h = build_service(db, CacheLayer::disabled());

    let far = h.service.create(fleet.request(0, 0, "+10000-01-01", None)).await;
    assert!(matches!(far, Err(DomainError::ValidationError(_))));

    // The store stays readable
    let page = h.service.list(ListAssignmentsQuery::default()).await.unwrap();
    assert_eq!(page.total_count, 0);

    teardown_test_db(test_db).await;
}

#[tokio::test]
async fn test_returned_record_matches_committed_precision() {
    let test_db = setup_test_db().await;
    let db = test_db.db();
    let fleet = seed_fleet(db).await;
    let h = build_service(db, CacheLayer::disabled());

    let created = h
        .service
        .create(fleet.request(
            0,
            0,
            "2024-01-10T08:30:00.123456789Z",
            Some("2024-01-10T17:00:00.999999999Z"),
        ))
        .await
        .unwrap();
    assert_eq!(created.start_date, at("2024-01-10T08:30:00.123456Z"));

    let fetched = h.service.get(&created.id).await.unwrap();
    assert_eq!(fetched, created);

    let updated = h
        .service
        .update(&created.id, UpdateAssignmentRequest {
            start_date: Some("2024-01-10T09:00:00.000000500Z".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(h.service.get(&created.id).await.unwrap(), updated);

    teardown_test_db(test_db).await;
}

#[tokio::test]
async fn test_retired_driver_cannot_be_booked() {
    let test_db = setup_test_db().await;
    let db = test_db.db();
    let fleet = seed_fleet(db).await;
    let h = build_service(db, CacheLayer::disabled());

    assert!(db.retire_resource(ResourceKind::Driver, fleet.driver(0)).await.unwrap());

    let result = h
        .service
        .create(fleet.request(0, 0, "2024-01-10", None))
        .await;
    assert!(matches!(result, Err(DomainError::NotFound(_))));

    teardown_test_db(test_db).await;
}

#[tokio::test]
async fn test_new_assignment_starts_pending_and_round_trips() {
    let test_db = setup_test_db().await;
    let db = test_db.db();
    let fleet = seed_fleet(db).await;
    let h = build_service(db, CacheLayer::disabled());

    let created = h
        .service
        .create(fleet.request(0, 0, "2024-01-10T08:30:00Z", Some("2024-01-10T17:00:00Z")))
        .await
        .unwrap();
    assert_eq!(created.status, AssignmentStatus::Pending);

    let fetched = h.service.get(&created.id).await.unwrap();
    assert_eq!(fetched, created);

    teardown_test_db(test_db).await;
}

#[tokio::test]
async fn test_complete_twice_fails_and_leaves_record_unchanged() {
    let test_db = setup_test_db().await;
    let db = test_db.db();
    let fleet = seed_fleet(db).await;
    let h = build_service(db, CacheLayer::disabled());

    let created = h
        .service
        .create(fleet.request(0, 0, "2024-01-10", None))
        .await
        .unwrap();

    let completed = h.service.complete(&created.id).await.unwrap();
    assert_eq!(completed.status, AssignmentStatus::Completed);
    // Open end closed at the clock's now
    assert_eq!(completed.end_date, Some(at("2024-01-12T12:00:00Z")));

    h.clock.set(at("2024-02-01T00:00:00Z"));
    let again = h.service.complete(&created.id).await;
    assert!(matches!(again, Err(DomainError::AlreadyCompleted(_))));

    let stored = h.service.get(&created.id).await.unwrap();
    assert_eq!(stored, completed);

    teardown_test_db(test_db).await;
}

#[tokio::test]
async fn test_complete_keeps_existing_end() {
    let test_db = setup_test_db().await;
    let db = test_db.db();
    let fleet = seed_fleet(db).await;
    let h = build_service(db, CacheLayer::disabled());

    let created = h
        .service
        .create(fleet.request(0, 0, "2024-01-10", Some("2024-01-11")))
        .await
        .unwrap();

    let completed = h.service.complete(&created.id).await.unwrap();
    assert_eq!(completed.end_date, Some(at("2024-01-11")));

    teardown_test_db(test_db).await;
}

#[tokio::test]
async fn test_status_transitions_through_update() {
    let test_db = setup_test_db().await;
    let db = test_db.db();
    let fleet = seed_fleet(db).await;
    let h = build_service(db, CacheLayer::disabled());

    let created = h
        .service
        .create(fleet.request(0, 0, "2024-01-10", None))
        .await
        .unwrap();

    let started = h
        .service
        .update(&created.id, UpdateAssignmentRequest {
            status: Some(AssignmentStatus::InProgress),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(started.status, AssignmentStatus::InProgress);

    let back = h
        .service
        .update(&created.id, UpdateAssignmentRequest {
            status: Some(AssignmentStatus::Pending),
            ..Default::default()
        })
        .await;
    assert!(matches!(back, Err(DomainError::ValidationError(_))));

    let done = h
        .service
        .update(&created.id, UpdateAssignmentRequest {
            status: Some(AssignmentStatus::Completed),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(done.status, AssignmentStatus::Completed);
    assert_eq!(done.end_date, Some(at("2024-01-12T12:00:00Z")));

    let reopen = h
        .service
        .update(&created.id, UpdateAssignmentRequest {
            status: Some(AssignmentStatus::InProgress),
            ..Default::default()
        })
        .await;
    assert!(matches!(reopen, Err(DomainError::AlreadyCompleted(_))));

    teardown_test_db(test_db).await;
}

#[tokio::test]
async fn test_update_excludes_itself_from_conflict_check() {
    let test_db = setup_test_db().await;
    let db = test_db.db();
    let fleet = seed_fleet(db).await;
    let h = build_service(db, CacheLayer::disabled());

    let created = h
        .service
        .create(fleet.request(0, 0, "2024-01-10", Some("2024-01-15")))
        .await
        .unwrap();

    // Extending its own window overlaps only itself
    let extended = h
        .service
        .update(&created.id, UpdateAssignmentRequest {
            end_date: Some(Some("2024-01-18".to_string())),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(extended.end_date, Some(at("2024-01-18")));

    let opened = h
        .service
        .update(&created.id, UpdateAssignmentRequest {
            end_date: Some(None),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(opened.end_date, None);

    teardown_test_db(test_db).await;
}

#[tokio::test]
async fn test_update_into_another_booking_conflicts() {
    let test_db = setup_test_db().await;
    let db = test_db.db();
    let fleet = seed_fleet(db).await;
    let h = build_service(db, CacheLayer::disabled());

    h.service
        .create(fleet.request(0, 0, "2024-01-10", Some("2024-01-15")))
        .await
        .unwrap();
    let other = h
        .service
        .create(fleet.request(1, 1, "2024-01-10", Some("2024-01-15")))
        .await
        .unwrap();

    let swap = h
        .service
        .update(&other.id, UpdateAssignmentRequest {
            vehicle_id: Some(fleet.vehicle(0).to_string()),
            ..Default::default()
        })
        .await;
    assert!(matches!(swap, Err(DomainError::ScheduleConflict { .. })));

    let unchanged = h.service.get(&other.id).await.unwrap();
    assert_eq!(unchanged.vehicle_id, fleet.vehicle(1));

    teardown_test_db(test_db).await;
}

#[tokio::test]
async fn test_update_missing_assignment_is_not_found() {
    let test_db = setup_test_db().await;
    let db = test_db.db();
    let h = build_service(db, CacheLayer::disabled());

    let result = h
        .service
        .update("missing", UpdateAssignmentRequest::default())
        .await;
    assert!(matches!(result, Err(DomainError::NotFound(_))));
    assert!(matches!(h.service.complete("missing").await, Err(DomainError::NotFound(_))));
    assert!(matches!(h.service.delete("missing").await, Err(DomainError::NotFound(_))));

    teardown_test_db(test_db).await;
}

#[tokio::test]
async fn test_delete_frees_the_slot() {
    let test_db = setup_test_db().await;
    let db = test_db.db();
    let fleet = seed_fleet(db).await;
    let h = build_service(db, CacheLayer::disabled());

    let created = h
        .service
        .create(fleet.request(0, 0, "2024-01-10", Some("2024-01-15")))
        .await
        .unwrap();

    h.service.delete(&created.id).await.unwrap();
    assert!(matches!(h.service.get(&created.id).await, Err(DomainError::NotFound(_))));
    assert!(matches!(h.service.delete(&created.id).await, Err(DomainError::NotFound(_))));

    let rebooked = h
        .service
        .create(fleet.request(0, 0, "2024-01-12", Some("2024-01-14")))
        .await;
    assert!(rebooked.is_ok(), "deleted assignments must not block new bookings");

    teardown_test_db(test_db).await;
}

#[tokio::test]
async fn test_list_current_only_returns_in_progress_covering_now() {
    let test_db = setup_test_db().await;
    let db = test_db.db();
    let fleet = seed_fleet(db).await;
    let h = build_service(db, CacheLayer::disabled());
    let now = at("2024-01-12T12:00:00Z");

    // Pending and already started: must not appear
    let pending = h
        .service
        .create(fleet.request(0, 0, "2024-01-10", None))
        .await
        .unwrap();

    let running = h
        .service
        .create(fleet.request(1, 1, "2024-01-11", Some("2024-01-12T12:00:00Z")))
        .await
        .unwrap();
    h.service
        .update(&running.id, UpdateAssignmentRequest {
            status: Some(AssignmentStatus::InProgress),
            ..Default::default()
        })
        .await
        .unwrap();

    let future = h
        .service
        .create(fleet.request(1, 1, "2024-02-01", None))
        .await
        .unwrap();
    h.service
        .update(&future.id, UpdateAssignmentRequest {
            status: Some(AssignmentStatus::InProgress),
            ..Default::default()
        })
        .await
        .unwrap();

    let current = h.service.list_current(now).await.unwrap();
    let ids: Vec<&str> = current.iter().map(|a| a.id.as_str()).collect();

    // end == now counts as covered
    assert_eq!(ids, vec![running.id.as_str()]);
    assert!(!ids.contains(&pending.id.as_str()));

    let via_clock = h.service.current_assignments().await.unwrap();
    assert_eq!(via_clock.len(), 1);

    teardown_test_db(test_db).await;
}

#[tokio::test]
async fn test_list_pagination_and_filters() {
    let test_db = setup_test_db().await;
    let db = test_db.db();
    let fleet = seed_fleet(db).await;
    let h = build_service(db, CacheLayer::disabled());

    let days = ["2024-03-01", "2024-03-03", "2024-03-05", "2024-03-07", "2024-03-09"];
    let mut ids = Vec::new();
    for (i, day) in days.iter().enumerate() {
        let end = format!("2024-03-{:02}", 2 + 2 * i);
        let created = h
            .service
            .create(fleet.request(0, 0, day, Some(&end)))
            .await
            .unwrap();
        ids.push(created.id);
    }
    h.service
        .update(&ids[0], UpdateAssignmentRequest {
            status: Some(AssignmentStatus::InProgress),
            ..Default::default()
        })
        .await
        .unwrap();

    let page = h
        .service
        .list(ListAssignmentsQuery {
            page: Some(2),
            limit: Some(2),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.total_count, 5);
    assert_eq!(page.total_pages, 3);
    assert_eq!(page.current_page, 2);
    // Newest start first
    let starts: Vec<_> = page.assignments.iter().map(|a| a.start_date).collect();
    assert_eq!(starts, vec![at("2024-03-05"), at("2024-03-03")]);

    let by_status = h
        .service
        .list(ListAssignmentsQuery {
            status: Some("in_progress".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_status.total_count, 1);
    assert_eq!(by_status.assignments[0].id, ids[0]);

    let since = h
        .service
        .list(ListAssignmentsQuery {
            start_date: Some("2024-03-05".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(since.total_count, 3);

    for bad in [
        ListAssignmentsQuery { page: Some(0), ..Default::default() },
        ListAssignmentsQuery { limit: Some(0), ..Default::default() },
        ListAssignmentsQuery { limit: Some(101), ..Default::default() },
        ListAssignmentsQuery { status: Some("cancelled".to_string()), ..Default::default() },
    ] {
        assert!(matches!(
            h.service.list(bad).await,
            Err(DomainError::ValidationError(_))
        ));
    }

    teardown_test_db(test_db).await;
}

#[tokio::test]
async fn test_store_never_holds_overlapping_bookings() {
    let test_db = setup_test_db().await;
    let db = test_db.db();
    let fleet = seed_fleet(db).await;
    let h = build_service(db, CacheLayer::disabled());

    // Deterministic mix of windows across both drivers and vehicles
    let mut created = Vec::new();
    for i in 0..24u32 {
        let day = 1 + (i * 7) % 27;
        let len = 1 + i % 4;
        let start = format!("2024-05-{:02}", day);
        let end = format!("2024-05-{:02}", (day + len).min(31));
        let driver = fleet.driver((i % 2) as usize);
        let vehicle = fleet.vehicle(((i / 2) % 2) as usize);
        match h
            .service
            .create(create_request(driver, vehicle, fleet.route(), &start, Some(&end)))
            .await
        {
            Ok(a) => created.push(a),
            Err(DomainError::ScheduleConflict { .. }) => {}
            Err(e) => panic!("unexpected error: {:?}", e),
        }
    }

    // Shift some bookings around; conflicts are expected and must be rejected
    for (i, a) in created.clone().iter().enumerate() {
        let shifted = a.start_date + chrono::Duration::days((i % 3) as i64 + 1);
        let _ = h
            .service
            .update(&a.id, UpdateAssignmentRequest {
                start_date: Some(format_instant(&shifted)),
                end_date: Some(Some(format_instant(&(shifted + chrono::Duration::days(2))))),
                ..Default::default()
            })
            .await;
    }

    let all = h
        .service
        .list(ListAssignmentsQuery { limit: Some(100), ..Default::default() })
        .await
        .unwrap();
    assert!(!all.assignments.is_empty());
    assert_no_overlaps(&all.assignments);

    teardown_test_db(test_db).await;
}
