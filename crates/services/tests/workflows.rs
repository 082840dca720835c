//! End-to-end checks of the transactional operations against a real
//! (in-memory) database with migrations applied.

use chrono::{DateTime, NaiveDate, Utc};
use db::DBService;
use db::models::{
    notification::Notification,
    profile::{CreateProfile, Profile, UserRole},
};
use services::services::{
    auth::Actor,
    events::{ChangeOp, EventHub, Topic},
    finance::{CreateEntryRequest, FinanceService},
    notification::NotificationService,
    route::{AddToRouteRequest, RouteError, RouteService},
    work_order::{CreateWorkOrderRequest, UpdateWorkOrderRequest, WorkOrderError, WorkOrderService},
};
use uuid::Uuid;

struct Harness {
    db: DBService,
    hub: EventHub,
    work_orders: WorkOrderService,
    routes: RouteService,
    finance: FinanceService,
    notifications: NotificationService,
    admin: Actor,
    tech: Actor,
}

async fn harness() -> Harness {
    let db = DBService::new_in_memory().await.expect("in-memory db");
    let hub = EventHub::default();
    let notifications = NotificationService::new(db.pool.clone(), hub.clone());
    let work_orders =
        WorkOrderService::new(db.pool.clone(), hub.clone(), notifications.clone());
    let routes = RouteService::new(db.pool.clone(), hub.clone(), notifications.clone());
    let finance = FinanceService::new(db.pool.clone());

    let admin = seed_profile(&db, "admin@example.com", UserRole::Admin).await;
    let tech = seed_profile(&db, "tech@example.com", UserRole::Technician).await;

    Harness {
        db,
        hub,
        work_orders,
        routes,
        finance,
        notifications,
        admin: Actor { id: admin.id, role: admin.role },
        tech: Actor { id: tech.id, role: tech.role },
    }
}

async fn seed_profile(db: &DBService, email: &str, role: UserRole) -> Profile {
    Profile::create(
        &db.pool,
        Uuid::new_v4(),
        &CreateProfile {
            email: email.into(),
            name: email.split('@').next().unwrap().into(),
            role,
        },
        "unused-hash",
    )
    .await
    .expect("seed profile")
}

fn create_request(phone: &str) -> CreateWorkOrderRequest {
    CreateWorkOrderRequest {
        client_name: "  Acme  ".into(),
        phone: phone.into(),
        address: "1 Main St".into(),
        service: Some("Boiler check".into()),
        description: None,
        scheduled_start: None,
        estimated_minutes: Some(60),
        assigned_to: None,
    }
}

fn ts(s: &str) -> DateTime<Utc> {
    s.parse().unwrap()
}

fn d(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

#[tokio::test]
async fn create_normalizes_phone_and_dedups_clients() {
    let h = harness().await;

    let first = h
        .work_orders
        .create_with_client(h.admin, create_request("+52 (999) 123-45-67"))
        .await
        .unwrap();
    assert_eq!(first.phone, "529991234567");
    assert_eq!(first.client_name, "Acme");
    assert_eq!(first.status, "new");

    // Same digits, different formatting: the client row is reused.
    let second = h
        .work_orders
        .create_with_client(h.admin, create_request("52 9991 23 4567"))
        .await
        .unwrap();
    assert_eq!(second.client_id, first.client_id);

    let clients = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM clients")
        .fetch_one(&h.db.pool)
        .await
        .unwrap();
    assert_eq!(clients, 1);
}

#[tokio::test]
async fn technician_cannot_assign_work_orders() {
    let h = harness().await;

    let mut request = create_request("5550100");
    request.assigned_to = Some(h.admin.id);

    let view = h.work_orders.create_with_client(h.tech, request).await.unwrap();
    assert_eq!(view.assigned_to, None, "assignment is admin-only");
    assert_eq!(view.created_by, h.tech.id);
}

#[tokio::test]
async fn admin_assignment_notifies_the_assignee_and_publishes_events() {
    let h = harness().await;
    let mut rx = h.hub.subscribe();

    let mut request = create_request("5550100");
    request.assigned_to = Some(h.tech.id);
    let view = h.work_orders.create_with_client(h.admin, request).await.unwrap();
    assert_eq!(view.assigned_to, Some(h.tech.id));

    let inbox = Notification::find_recent_for_user(&h.db.pool, h.tech.id, 50)
        .await
        .unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].kind, "work_order_assigned");
    assert_eq!(inbox[0].entity_id, Some(view.id));

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    assert!(events.iter().any(|e| {
        e.topic == Topic::Notifications && e.op == ChangeOp::Insert && e.user_id == Some(h.tech.id)
    }));
    assert!(events
        .iter()
        .any(|e| e.topic == Topic::WorkOrders && e.op == ChangeOp::Insert && e.entity_id == view.id));
}

#[tokio::test]
async fn update_moves_the_client_pointer_when_the_phone_dedups() {
    let h = harness().await;

    let original = h
        .work_orders
        .create_with_client(h.admin, create_request("5550100"))
        .await
        .unwrap();
    let other = h
        .work_orders
        .create_with_client(h.admin, create_request("5550200"))
        .await
        .unwrap();
    assert_ne!(original.client_id, other.client_id);

    let updated = h
        .work_orders
        .update_with_client(
            h.admin,
            original.id,
            UpdateWorkOrderRequest {
                client_name: "Acme".into(),
                phone: "555-02 00".into(),
                address: "1 Main St".into(),
                service: None,
                description: None,
                status: "scheduled".into(),
                scheduled_start: None,
                estimated_minutes: None,
                assigned_to: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.client_id, other.client_id);
    assert_eq!(updated.status, "scheduled");
}

#[tokio::test]
async fn move_status_rejects_unknown_keys() {
    let h = harness().await;
    let view = h
        .work_orders
        .create_with_client(h.admin, create_request("5550100"))
        .await
        .unwrap();

    let result = h.work_orders.move_status(view.id, "definitely_not_a_status").await;
    assert!(matches!(result, Err(WorkOrderError::UnknownStatus(_))));

    let moved = h.work_orders.move_status(view.id, "in_progress").await.unwrap();
    assert_eq!(moved.status, "in_progress");
}

#[tokio::test]
async fn agenda_normalizes_weekend_requests_to_monday() {
    let h = harness().await;

    // Monday 2025-03-03, 10:00 UTC.
    let mut request = create_request("5550100");
    request.scheduled_start = Some(ts("2025-03-03T10:00:00Z"));
    let view = h.work_orders.create_with_client(h.admin, request).await.unwrap();

    // Asking for Saturday 2025-03-08 snaps to that week's Monday.
    let week = h.work_orders.agenda_week(h.admin, d("2025-03-08")).await.unwrap();
    assert_eq!(week.monday, d("2025-03-03"));
    assert_eq!(week.days.len(), 5);
    assert_eq!(week.days[0].date, d("2025-03-03"));
    assert!(week.days[0].work_orders.iter().any(|wo| wo.id == view.id));
}

#[tokio::test]
async fn technician_sees_only_their_own_day() {
    let h = harness().await;

    let mut mine = create_request("5550100");
    mine.scheduled_start = Some(ts("2025-03-03T09:00:00Z"));
    mine.assigned_to = Some(h.tech.id);
    h.work_orders.create_with_client(h.admin, mine).await.unwrap();

    let mut other = create_request("5550200");
    other.scheduled_start = Some(ts("2025-03-03T11:00:00Z"));
    h.work_orders.create_with_client(h.admin, other).await.unwrap();

    let admin_day = h.work_orders.for_date(h.admin, d("2025-03-03")).await.unwrap();
    assert_eq!(admin_day.len(), 2);

    let tech_day = h.work_orders.for_date(h.tech, d("2025-03-03")).await.unwrap();
    assert_eq!(tech_day.len(), 1);
    assert_eq!(tech_day[0].assigned_to, Some(h.tech.id));
}

#[tokio::test]
async fn route_technician_is_resolved_server_side() {
    let h = harness().await;

    let mut assigned = create_request("5550100");
    assigned.assigned_to = Some(h.tech.id);
    let assigned = h.work_orders.create_with_client(h.admin, assigned).await.unwrap();

    // Admin adds a work order assigned to the technician: the item lands on
    // the technician, not the admin.
    let item = h
        .routes
        .add_to_route(
            h.admin,
            AddToRouteRequest {
                date: d("2025-03-03"),
                route_number: 1,
                work_order_id: assigned.id,
            },
        )
        .await
        .unwrap();
    assert_eq!(item.technician_id, h.tech.id);

    // Technician adds an unassigned work order: they get it themselves.
    let unassigned = h
        .work_orders
        .create_with_client(h.admin, create_request("5550200"))
        .await
        .unwrap();
    let item = h
        .routes
        .add_to_route(
            h.tech,
            AddToRouteRequest {
                date: d("2025-03-03"),
                route_number: 2,
                work_order_id: unassigned.id,
            },
        )
        .await
        .unwrap();
    assert_eq!(item.technician_id, h.tech.id);

    // Same work order, same date: rejected.
    let duplicate = h
        .routes
        .add_to_route(
            h.admin,
            AddToRouteRequest {
                date: d("2025-03-03"),
                route_number: 1,
                work_order_id: assigned.id,
            },
        )
        .await;
    assert!(matches!(duplicate, Err(RouteError::Duplicate)));

    // Lane numbers outside {1, 2} never hit the database.
    let bad_lane = h
        .routes
        .add_to_route(
            h.admin,
            AddToRouteRequest {
                date: d("2025-03-04"),
                route_number: 3,
                work_order_id: assigned.id,
            },
        )
        .await;
    assert!(matches!(bad_lane, Err(RouteError::Validation(_))));
}

#[tokio::test]
async fn finishing_a_route_item_is_scoped_and_monotonic() {
    let h = harness().await;

    let view = h
        .work_orders
        .create_with_client(h.admin, create_request("5550100"))
        .await
        .unwrap();
    let item = h
        .routes
        .add_to_route(
            h.admin,
            AddToRouteRequest {
                date: d("2025-03-03"),
                route_number: 1,
                work_order_id: view.id,
            },
        )
        .await
        .unwrap();
    // Unassigned work order added by the admin lands on the admin.
    assert_eq!(item.technician_id, h.admin.id);

    let forbidden = h.routes.finish(h.tech, item.id).await;
    assert!(matches!(forbidden, Err(RouteError::Forbidden)));

    let finished = h.routes.finish(h.admin, item.id).await.unwrap();
    assert!(finished.done);
    let first_finish = finished.finished_at.expect("finished_at set");

    let again = h.routes.finish(h.admin, item.id).await.unwrap();
    assert_eq!(again.finished_at, Some(first_finish), "finished_at is monotonic");
}

#[tokio::test]
async fn notification_read_at_is_monotonic() {
    let h = harness().await;

    let created = h
        .notifications
        .notify(h.tech.id, "test", "Hello", "Body", None)
        .await
        .unwrap();
    assert!(created.read_at.is_none());

    let read = h
        .notifications
        .mark_read(h.tech.id, created.id)
        .await
        .unwrap()
        .expect("own notification");
    let first_read = read.read_at.expect("read_at set");

    let read_again = h
        .notifications
        .mark_read(h.tech.id, created.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(read_again.read_at, Some(first_read), "read_at never moves");

    // Another user cannot touch it.
    let not_mine = h.notifications.mark_read(h.admin.id, created.id).await.unwrap();
    assert!(not_mine.is_none());

    h.notifications.notify(h.tech.id, "test", "Second", "Body", None).await.unwrap();
    let changed = h.notifications.mark_all_read(h.tech.id).await.unwrap();
    assert_eq!(changed, 1, "only unread rows are touched");
}

#[tokio::test]
async fn finance_series_and_summary() {
    let h = harness().await;

    for (day, entry_type, cents, category) in [
        ("2025-02-01", "income", 10_000, "Service"),
        ("2025-02-01", "expense", 2_500, "Fuel"),
        ("2025-02-03", "income", 4_000, "Service"),
    ] {
        h.finance
            .add_entry(
                h.admin,
                CreateEntryRequest {
                    entry_date: d(day),
                    entry_type: entry_type.parse().unwrap(),
                    amount_cents: cents,
                    category: Some(category.into()),
                    note: None,
                },
            )
            .await
            .unwrap();
    }

    let series = h.finance.series(d("2025-02-01"), d("2025-02-04")).await.unwrap();
    assert_eq!(series.len(), 4);
    assert_eq!(series[0].balance_cents, 7_500);
    assert_eq!(series[1].balance_cents, 0, "gap day is zero-filled");
    assert_eq!(series[2].income_cents, 4_000);

    let summary = h.finance.summary(d("2025-02-01"), d("2025-02-04")).await.unwrap();
    assert_eq!(summary.total_income_cents, 14_000);
    assert_eq!(summary.total_expense_cents, 2_500);
    assert_eq!(summary.balance_cents, 11_500);
    assert_eq!(summary.income_by_category["Service"], 14_000);
    assert_eq!(summary.expense_by_category["Fuel"], 2_500);
    assert_eq!(summary.best_day.unwrap().day, d("2025-02-01"));
    assert_eq!(summary.worst_day.unwrap().day, d("2025-02-02"));

    // Zero-amount and inverted ranges are rejected before touching the db.
    let rejected = h
        .finance
        .add_entry(
            h.admin,
            CreateEntryRequest {
                entry_date: d("2025-02-01"),
                entry_type: "income".parse().unwrap(),
                amount_cents: 0,
                category: None,
                note: None,
            },
        )
        .await;
    assert!(rejected.is_err());
}
