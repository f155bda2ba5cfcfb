// tests/lifecycle.rs

mod support;

use std::collections::HashMap;

use asset_tracker::{
    common::{
        clock::Clock,
        error::{AppError, Entity},
    },
    db::{EntityStore, StoreTx},
    models::{
        activity::Priority,
        inventory::{ItemFilter, ItemPatch, ItemStatus, MaintenanceInput, StatusChange, StatusGuard},
    },
    services::lifecycle_service::{
        TITLE_ITEM_LOANED, TITLE_ITEM_RETURNED, TITLE_MAINTENANCE_DONE, TITLE_STATUS_CHANGED,
    },
};
use chrono::{Duration, NaiveDate};
use support::harness;
use uuid::Uuid;

// status == checked-out <=> exatamente um empréstimo aberto para o item
async fn assert_invariant(h: &support::Harness) {
    let items = h.state.query_service.items_filtered(&ItemFilter::default()).await.unwrap();
    let open = h.state.query_service.open_assignments(None).await.unwrap();

    let mut open_per_item: HashMap<Uuid, usize> = HashMap::new();
    for a in &open {
        *open_per_item.entry(a.item_id).or_default() += 1;
    }

    for item in &items {
        let count = open_per_item.get(&item.id).copied().unwrap_or(0);
        assert!(count <= 1, "{} has {} open assignments", item.name, count);
        assert_eq!(
            item.status == ItemStatus::CheckedOut,
            count == 1,
            "{} is {:?} with {} open assignments",
            item.name,
            item.status,
            count
        );
    }
}

#[tokio::test]
async fn loan_return_and_loan_again() {
    let h = harness();
    let admin = h.admin().await;
    let u1 = h.user("Erik Svensson").await;
    let u2 = h.user("Maria Lind").await;
    let i1 = h.item("Borrmaskin Bosch", &admin).await;
    assert_eq!(i1.status, ItemStatus::Available);

    let lifecycle = &h.state.lifecycle_service;

    let loan = lifecycle.checkout(i1.id, u1.id).await.unwrap();
    assert_eq!(loan.item.status, ItemStatus::CheckedOut);
    assert_eq!(loan.item.assigned_to.as_deref(), Some("Erik Svensson"));
    assert!(loan.assignment.is_open());
    assert_eq!(h.state.query_service.open_assignments(None).await.unwrap().len(), 1);

    h.clock.advance(Duration::hours(3));
    let back = lifecycle.checkin(i1.id).await.unwrap();
    assert_eq!(back.item.status, ItemStatus::Available);
    assert_eq!(back.item.assigned_to, None);
    assert_eq!(back.assignment.id, loan.assignment.id);
    assert_eq!(
        back.assignment.return_date.map(|d| d.date_naive()),
        Some(h.clock.now().date_naive())
    );

    let again = lifecycle.checkout(i1.id, u2.id).await.unwrap();
    assert_eq!(again.assignment.user_id, u2.id);
    assert_ne!(again.assignment.id, loan.assignment.id);

    let activities = h.state.activity_service.list(100).await.unwrap();
    let loaned = activities.iter().filter(|a| a.title == TITLE_ITEM_LOANED).count();
    let returned = activities.iter().filter(|a| a.title == TITLE_ITEM_RETURNED).count();
    assert_eq!(loaned, 2);
    assert_eq!(returned, 1);
    assert!(activities
        .iter()
        .filter(|a| a.title == TITLE_ITEM_LOANED)
        .all(|a| a.priority == Priority::Low && a.related_item_id == Some(i1.id)));

    assert_invariant(&h).await;
}

#[tokio::test]
async fn second_checkin_is_rejected() {
    let h = harness();
    let admin = h.admin().await;
    let user = h.user("Erik Svensson").await;
    let item = h.item("Vinkelslip", &admin).await;

    h.state.lifecycle_service.checkout(item.id, user.id).await.unwrap();
    h.state.lifecycle_service.checkin(item.id).await.unwrap();

    let err = h.state.lifecycle_service.checkin(item.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotCheckedOut(id) if id == item.id));

    // Nunca emprestado também não pode ser devolvido
    let fresh = h.item("Skruvdragare", &admin).await;
    let err = h.state.lifecycle_service.checkin(fresh.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotCheckedOut(_)));
}

#[tokio::test]
async fn checkin_without_open_assignment_is_an_integrity_error() {
    let h = harness();
    let admin = h.admin().await;
    let item = h.item("Kapsåg", &admin).await;

    // Status "checked-out" gravado direto no store, sem empréstimo
    let mut tx = h.store.begin().await.unwrap();
    tx.set_item_status(
        item.id,
        StatusChange {
            status: ItemStatus::CheckedOut,
            assigned_to: None,
            guard: StatusGuard::Any,
        },
    )
    .await
    .unwrap()
    .unwrap();
    tx.commit().await.unwrap();

    let activities_before = h.state.activity_service.list(100).await.unwrap().len();

    let err = h.state.lifecycle_service.checkin(item.id).await.unwrap_err();
    assert!(matches!(err, AppError::NoOpenAssignment(id) if id == item.id));

    // Nada foi escrito: status intacto, nenhum empréstimo, nenhuma atividade
    let items = h.state.query_service.items_filtered(&ItemFilter::default()).await.unwrap();
    assert_eq!(items[0].status, ItemStatus::CheckedOut);
    assert!(h.state.query_service.closed_assignments(None).await.unwrap().is_empty());
    let activities_after = h.state.activity_service.list(100).await.unwrap().len();
    assert_eq!(activities_after, activities_before);
}

#[tokio::test]
async fn round_trip_leaves_one_closed_assignment() {
    let h = harness();
    let admin = h.admin().await;
    let user = h.user("Erik Svensson").await;
    let item = h.item("Stege 3m", &admin).await;

    h.state.lifecycle_service.checkout(item.id, user.id).await.unwrap();
    h.clock.advance(Duration::minutes(45));
    h.state.lifecycle_service.checkin(item.id).await.unwrap();

    let open = h.state.query_service.open_assignments(None).await.unwrap();
    let closed = h.state.query_service.closed_assignments(None).await.unwrap();
    assert!(open.is_empty());
    assert_eq!(closed.len(), 1);

    let assignment = &closed[0];
    let returned = assignment.return_date.unwrap();
    assert!(assignment.assigned_date <= returned);
    assert_eq!(returned - assignment.assigned_date, Duration::minutes(45));
    assert_eq!(assignment.item_name.as_deref(), Some("Stege 3m"));
    assert_eq!(assignment.user_name.as_deref(), Some("Erik Svensson"));
}

#[tokio::test]
async fn return_date_never_precedes_assigned_date() {
    let h = harness();
    let admin = h.admin().await;
    let user = h.user("Erik Svensson").await;
    let item = h.item("Slagborr", &admin).await;

    let loan = h.state.lifecycle_service.checkout(item.id, user.id).await.unwrap();

    // Relógio volta no tempo entre o checkout e o checkin
    h.clock.advance(Duration::hours(-2));
    let back = h.state.lifecycle_service.checkin(item.id).await.unwrap();
    assert_eq!(back.assignment.return_date, Some(loan.assignment.assigned_date));
}

#[tokio::test]
async fn checkout_of_checked_out_item_conflicts_without_side_effects() {
    let h = harness();
    let admin = h.admin().await;
    let u1 = h.user("Erik Svensson").await;
    let u2 = h.user("Maria Lind").await;
    let item = h.item("Motorsåg", &admin).await;

    h.state.lifecycle_service.checkout(item.id, u1.id).await.unwrap();
    let err = h.state.lifecycle_service.checkout(item.id, u2.id).await.unwrap_err();
    assert!(matches!(err, AppError::AlreadyCheckedOut(id) if id == item.id));

    let open = h.state.query_service.open_assignments(None).await.unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].user_id, u1.id);

    let loaned = h
        .state
        .activity_service
        .list(100)
        .await
        .unwrap()
        .into_iter()
        .filter(|a| a.title == TITLE_ITEM_LOANED)
        .count();
    assert_eq!(loaned, 1);
}

#[tokio::test]
async fn concurrent_checkouts_have_exactly_one_winner() {
    let h = harness();
    let admin = h.admin().await;
    let item = h.item("Laserpass", &admin).await;

    let mut users = Vec::new();
    for n in 0..8 {
        users.push(h.user(&format!("Användare {n}")).await);
    }

    let mut handles = Vec::new();
    for user in &users {
        let lifecycle = h.state.lifecycle_service.clone();
        let (item_id, user_id) = (item.id, user.id);
        handles.push(tokio::spawn(async move { lifecycle.checkout(item_id, user_id).await }));
    }

    let mut winners = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => winners += 1,
            Err(AppError::AlreadyCheckedOut(_)) => {}
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }
    assert_eq!(winners, 1);
    assert_invariant(&h).await;
}

#[tokio::test]
async fn missing_references_are_reported_and_nothing_changes() {
    let h = harness();
    let admin = h.admin().await;
    let user = h.user("Erik Svensson").await;
    let item = h.item("Hammare", &admin).await;

    let ghost = Uuid::new_v4();
    let err = h.state.lifecycle_service.checkout(ghost, user.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound { entity: Entity::Item, id } if id == ghost));

    let err = h.state.lifecycle_service.checkout(item.id, ghost).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound { entity: Entity::Profile, id } if id == ghost));

    let err = h.state.lifecycle_service.checkin(ghost).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound { entity: Entity::Item, .. }));

    let items = h.state.query_service.items_filtered(&ItemFilter::default()).await.unwrap();
    assert_eq!(items[0].status, ItemStatus::Available);
    assert!(h.state.query_service.open_assignments(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn maintenance_and_lost_items_cannot_be_checked_out() {
    let h = harness();
    let admin = h.admin().await;
    let user = h.user("Erik Svensson").await;
    let in_service = h.item("Kompressor", &admin).await;
    let missing = h.item("Mätband", &admin).await;

    let lifecycle = &h.state.lifecycle_service;
    lifecycle
        .set_status_override(in_service.id, ItemStatus::Maintenance, admin.id)
        .await
        .unwrap();
    lifecycle.set_status_override(missing.id, ItemStatus::Lost, admin.id).await.unwrap();

    let err = lifecycle.checkout(in_service.id, user.id).await.unwrap_err();
    assert!(matches!(err, AppError::ItemUnavailable { status: ItemStatus::Maintenance, .. }));
    let err = lifecycle.checkout(missing.id, user.id).await.unwrap_err();
    assert!(matches!(err, AppError::ItemUnavailable { status: ItemStatus::Lost, .. }));

    // De volta a "available", o empréstimo funciona
    lifecycle
        .set_status_override(in_service.id, ItemStatus::Available, admin.id)
        .await
        .unwrap();
    lifecycle.checkout(in_service.id, user.id).await.unwrap();
    assert_invariant(&h).await;
}

#[tokio::test]
async fn status_override_never_touches_loans() {
    let h = harness();
    let admin = h.admin().await;
    let user = h.user("Erik Svensson").await;
    let item = h.item("Svets", &admin).await;
    let lifecycle = &h.state.lifecycle_service;

    let err = lifecycle
        .set_status_override(item.id, ItemStatus::CheckedOut, admin.id)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::InvalidStatusTransition { from: ItemStatus::Available, to: ItemStatus::CheckedOut }
    ));

    lifecycle.checkout(item.id, user.id).await.unwrap();
    let err = lifecycle
        .set_status_override(item.id, ItemStatus::Lost, admin.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidStatusTransition { from: ItemStatus::CheckedOut, .. }));
    assert_invariant(&h).await;
}

#[tokio::test]
async fn status_override_is_logged_with_priority() {
    let h = harness();
    let admin = h.admin().await;
    let item = h.item("Fallskyddssele", &admin).await;
    let lifecycle = &h.state.lifecycle_service;

    lifecycle.set_status_override(item.id, ItemStatus::Maintenance, admin.id).await.unwrap();
    h.clock.advance(Duration::minutes(1));
    let lost = lifecycle.set_status_override(item.id, ItemStatus::Lost, admin.id).await.unwrap();
    assert_eq!(lost.status, ItemStatus::Lost);

    // Mesmo status: nada muda, nada é registrado
    h.clock.advance(Duration::minutes(1));
    lifecycle.set_status_override(item.id, ItemStatus::Lost, admin.id).await.unwrap();

    let changes: Vec<_> = h
        .state
        .activity_service
        .list(100)
        .await
        .unwrap()
        .into_iter()
        .filter(|a| a.title == TITLE_STATUS_CHANGED)
        .collect();
    assert_eq!(changes.len(), 2);
    assert_eq!(changes[0].priority, Priority::High);
    assert_eq!(changes[1].priority, Priority::Medium);
}

#[tokio::test]
async fn invariant_holds_across_mixed_sequences() {
    let h = harness();
    let admin = h.admin().await;
    let users = [h.user("Erik").await, h.user("Maria").await, h.user("Johan").await];
    let items = [
        h.item("Borr", &admin).await,
        h.item("Såg", &admin).await,
        h.item("Hjälm", &admin).await,
    ];
    let lifecycle = &h.state.lifecycle_service;

    // Sequência determinística de operações, incluindo as que devem falhar
    for step in 0..30usize {
        let item = &items[step % items.len()];
        let user = &users[(step * 7) % users.len()];
        h.clock.advance(Duration::minutes(5));

        if step % 3 == 2 {
            let _ = lifecycle.checkin(item.id).await;
        } else {
            let _ = lifecycle.checkout(item.id, user.id).await;
        }
        if step % 11 == 10 {
            let _ = lifecycle.set_status_override(item.id, ItemStatus::Maintenance, admin.id).await;
        }
        if step % 13 == 12 {
            let _ = lifecycle.set_status_override(item.id, ItemStatus::Available, admin.id).await;
        }

        assert_invariant(&h).await;
    }

    let closed = h.state.query_service.closed_assignments(None).await.unwrap();
    assert!(closed.iter().all(|a| a.assigned_date <= a.return_date.unwrap()));
}

#[tokio::test]
async fn maintenance_moves_last_checked_forward_only() {
    let h = harness();
    let admin = h.admin().await;
    let tech = h.user("Tekniker Tina").await;
    let item = h.item("Generator", &admin).await;
    // Sem data informada, last_checked começa como "hoje"
    assert_eq!(item.last_checked, NaiveDate::from_ymd_opt(2024, 1, 1));

    let lifecycle = &h.state.lifecycle_service;
    let log = lifecycle
        .log_maintenance(
            item.id,
            MaintenanceInput {
                user_id: Some(tech.id),
                maintenance_date: NaiveDate::from_ymd_opt(2024, 2, 10),
                description: Some("Oljebyte".to_string()),
                next_maintenance_date: NaiveDate::from_ymd_opt(2024, 8, 10),
            },
        )
        .await
        .unwrap();
    assert_eq!(log.user_name.as_deref(), Some("Tekniker Tina"));
    assert_eq!(log.item_name.as_deref(), Some("Generator"));

    // Registro retroativo não volta a data
    lifecycle
        .log_maintenance(
            item.id,
            MaintenanceInput {
                maintenance_date: NaiveDate::from_ymd_opt(2024, 1, 15),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let items = h.state.query_service.items_filtered(&ItemFilter::default()).await.unwrap();
    assert_eq!(items[0].last_checked, NaiveDate::from_ymd_opt(2024, 2, 10));

    let history = h.state.query_service.maintenance_history(Some(item.id)).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].maintenance_date, NaiveDate::from_ymd_opt(2024, 2, 10).unwrap());
    assert_eq!(history[1].user_name, None);

    let logged = h
        .state
        .activity_service
        .list(100)
        .await
        .unwrap()
        .into_iter()
        .filter(|a| a.title == TITLE_MAINTENANCE_DONE)
        .all(|a| a.priority == Priority::Medium);
    assert!(logged);

    let err = lifecycle
        .log_maintenance(Uuid::new_v4(), MaintenanceInput::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound { entity: Entity::Item, .. }));
}

#[tokio::test]
async fn update_item_checks_category_and_keeps_status() {
    let h = harness();
    let admin = h.admin().await;
    let user = h.user("Erik Svensson").await;
    let item = h.item("Bågfil", &admin).await;
    let tools = h
        .state
        .catalog_service
        .create_category(Some("Handverktyg"), None)
        .await
        .unwrap();

    h.state.lifecycle_service.checkout(item.id, user.id).await.unwrap();

    let updated = h
        .state
        .lifecycle_service
        .update_item(
            item.id,
            ItemPatch {
                name: Some("Bågfil Bahco".to_string()),
                category_id: Some(Some(tools.id)),
                serial_number: Some(Some("BH-22".to_string())),
                ..Default::default()
            },
            admin.id,
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "Bågfil Bahco");
    assert_eq!(updated.category_name.as_deref(), Some("Handverktyg"));
    assert_eq!(updated.status, ItemStatus::CheckedOut);

    let err = h
        .state
        .lifecycle_service
        .update_item(
            item.id,
            ItemPatch { category_id: Some(Some(Uuid::new_v4())), ..Default::default() },
            admin.id,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound { entity: Entity::Category, .. }));

    // `Some(None)` limpa o campo
    let cleared = h
        .state
        .lifecycle_service
        .update_item(item.id, ItemPatch { serial_number: Some(None), ..Default::default() }, admin.id)
        .await
        .unwrap();
    assert_eq!(cleared.serial_number, None);
    assert_eq!(cleared.category_id, Some(tools.id));
}
