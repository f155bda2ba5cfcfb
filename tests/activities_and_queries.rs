// tests/activities_and_queries.rs

mod support;

use asset_tracker::{
    common::error::{AppError, Entity},
    models::{
        activity::{NewActivity, Priority},
        dashboard::Overview,
        inventory::{ItemFilter, ItemStatus, ItemType, NewItem},
    },
    services::catalog_service::{DEFAULT_CATEGORY_NAME, TITLE_PROFILE_CREATED},
};
use chrono::{Duration, NaiveDate, TimeZone, Utc};
use support::{harness, harness_at};
use uuid::Uuid;

fn note(title: &str) -> NewActivity {
    NewActivity { title: title.to_string(), ..Default::default() }
}

#[tokio::test]
async fn activity_with_unknown_reference_is_rejected() {
    let h = harness();
    let feed = &h.state.activity_service;

    let ghost_item = Uuid::new_v4();
    let err = feed
        .log(NewActivity { related_item_id: Some(ghost_item), ..note("Okänt verktyg") })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound { entity: Entity::Item, id } if id == ghost_item));

    let ghost_user = Uuid::new_v4();
    let err = feed
        .log(NewActivity { user_id: Some(ghost_user), ..note("Okänd person") })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound { entity: Entity::Profile, id } if id == ghost_user));

    assert!(feed.list(100).await.unwrap().is_empty());

    // Referências válidas seguem funcionando e o nome é resolvido
    let admin = h.admin().await;
    let item = h.item("Borrmaskin", &admin).await;
    let before = feed.list(100).await.unwrap().len();
    let activity = feed
        .log(NewActivity { related_item_id: Some(item.id), user_id: Some(admin.id), ..note("Kontroll") })
        .await
        .unwrap();
    assert_eq!(activity.item_name.as_deref(), Some("Borrmaskin"));
    assert_eq!(feed.list(100).await.unwrap().len(), before + 1);
}

#[tokio::test]
async fn activities_are_ordered_by_timestamp_not_insertion() {
    let h = harness_at(Utc.with_ymd_and_hms(2024, 3, 10, 10, 0, 0).unwrap());
    let feed = &h.state.activity_service;

    feed.log(note("tio")).await.unwrap();
    // Registrado depois, mas com horário anterior
    h.clock.set(Utc.with_ymd_and_hms(2024, 3, 10, 9, 0, 0).unwrap());
    feed.log(note("nio")).await.unwrap();
    h.clock.set(Utc.with_ymd_and_hms(2024, 3, 10, 11, 0, 0).unwrap());
    feed.log(note("elva")).await.unwrap();

    let titles: Vec<_> = feed.list(10).await.unwrap().into_iter().map(|a| a.title).collect();
    assert_eq!(titles, ["elva", "tio", "nio"]);

    let top = feed.list(2).await.unwrap();
    assert_eq!(top.len(), 2);
    assert_eq!(top[1].title, "tio");
}

#[tokio::test]
async fn date_bucket_is_recomputed_on_every_read() {
    let h = harness_at(Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap());
    let feed = &h.state.activity_service;

    let logged = feed.log(note("Inventering")).await.unwrap();
    assert_eq!(logged.date, "idag");
    assert_eq!(logged.priority, Priority::Low);

    h.clock.advance(Duration::days(1));
    assert_eq!(feed.list(1).await.unwrap()[0].date, "igår");

    h.clock.advance(Duration::days(1));
    assert_eq!(feed.list(1).await.unwrap()[0].date, "2024-03-10");
}

#[tokio::test]
async fn activity_names_are_frozen_at_write_time() {
    let h = harness();
    let user = h.user("Erik Svensson").await;

    h.state
        .catalog_service
        .update_profile(
            user.id,
            asset_tracker::models::people::ProfilePatch {
                name: Some("Erik Berg".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let created = h
        .state
        .activity_service
        .list(10)
        .await
        .unwrap()
        .into_iter()
        .find(|a| a.title == TITLE_PROFILE_CREATED)
        .unwrap();
    assert_eq!(created.user_name.as_deref(), Some("Erik Svensson"));
}

#[tokio::test]
async fn categories_report_item_counts() {
    let h = harness();
    let admin = h.admin().await;
    let catalog = &h.state.catalog_service;

    let power = catalog.create_category(Some("Elverktyg"), Some("Eldrivna")).await.unwrap();
    let unnamed = catalog.create_category(Some("   "), None).await.unwrap();
    assert_eq!(unnamed.name, DEFAULT_CATEGORY_NAME);

    for name in ["Borr", "Slip"] {
        h.state
            .lifecycle_service
            .create_item(NewItem { name: name.to_string(), category_id: Some(power.id), ..Default::default() }, admin.id)
            .await
            .unwrap();
    }
    h.item("Lös hammare", &admin).await;

    let counts = h.state.query_service.categories_with_counts().await.unwrap();
    let power_count = counts.iter().find(|c| c.category.id == power.id).unwrap().item_count;
    let unnamed_count = counts.iter().find(|c| c.category.id == unnamed.id).unwrap().item_count;
    assert_eq!(power_count, 2);
    assert_eq!(unnamed_count, 0);

    let names: Vec<_> = catalog.list_categories().await.unwrap().into_iter().map(|c| c.name).collect();
    assert_eq!(names, ["Elverktyg", DEFAULT_CATEGORY_NAME]);
}

#[tokio::test]
async fn item_filters_combine_with_and() {
    let h = harness();
    let admin = h.admin().await;
    let user = h.user("Maria Lind").await;
    let safety = h.state.catalog_service.create_category(Some("Skydd"), None).await.unwrap();

    let create = |name: &str, item_type: ItemType, category| NewItem {
        name: name.to_string(),
        item_type: Some(item_type),
        category_id: category,
        ..Default::default()
    };
    let lifecycle = &h.state.lifecycle_service;
    let helmet = lifecycle
        .create_item(create("Hjälm", ItemType::Safety, Some(safety.id)), admin.id)
        .await
        .unwrap();
    lifecycle
        .create_item(create("Hörselskydd", ItemType::Safety, Some(safety.id)), admin.id)
        .await
        .unwrap();
    lifecycle.create_item(create("Borr", ItemType::Tool, None), admin.id).await.unwrap();

    lifecycle.checkout(helmet.id, user.id).await.unwrap();

    let queries = &h.state.query_service;
    let safety_items = queries
        .items_filtered(&ItemFilter { item_type: Some(ItemType::Safety), ..Default::default() })
        .await
        .unwrap();
    assert_eq!(safety_items.len(), 2);
    assert!(safety_items.iter().all(|i| i.category_name.as_deref() == Some("Skydd")));

    let loaned_safety = queries
        .items_filtered(&ItemFilter {
            category_id: Some(safety.id),
            status: Some(ItemStatus::CheckedOut),
            item_type: Some(ItemType::Safety),
        })
        .await
        .unwrap();
    assert_eq!(loaned_safety.len(), 1);
    assert_eq!(loaned_safety[0].id, helmet.id);
    assert_eq!(loaned_safety[0].assigned_to.as_deref(), Some("Maria Lind"));

    let none = queries
        .items_filtered(&ItemFilter {
            status: Some(ItemStatus::CheckedOut),
            item_type: Some(ItemType::Tool),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn assignments_can_be_narrowed_to_one_user() {
    let h = harness();
    let admin = h.admin().await;
    let erik = h.user("Erik").await;
    let maria = h.user("Maria").await;
    let drill = h.item("Borr", &admin).await;
    let saw = h.item("Såg", &admin).await;
    let lifecycle = &h.state.lifecycle_service;

    lifecycle.checkout(drill.id, erik.id).await.unwrap();
    h.clock.advance(Duration::hours(1));
    lifecycle.checkout(saw.id, maria.id).await.unwrap();
    h.clock.advance(Duration::hours(1));
    lifecycle.checkin(drill.id).await.unwrap();

    let queries = &h.state.query_service;
    let open = queries.open_assignments(None).await.unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].item_name.as_deref(), Some("Såg"));

    assert!(queries.open_assignments(Some(erik.id)).await.unwrap().is_empty());
    let eriks_history = queries.closed_assignments(Some(erik.id)).await.unwrap();
    assert_eq!(eriks_history.len(), 1);
    assert_eq!(eriks_history[0].user_name.as_deref(), Some("Erik"));
}

#[tokio::test]
async fn overview_counts_statuses_and_certificates() {
    let h = harness();
    let admin = h.admin().await;
    let user = h.user("Erik").await;
    let lifecycle = &h.state.lifecycle_service;

    let a = h.item("A", &admin).await;
    let b = h.item("B", &admin).await;
    let c = h.item("C", &admin).await;
    h.item("D", &admin).await;
    lifecycle.checkout(a.id, user.id).await.unwrap();
    lifecycle.set_status_override(b.id, ItemStatus::Maintenance, admin.id).await.unwrap();
    lifecycle.set_status_override(c.id, ItemStatus::Lost, admin.id).await.unwrap();

    let certs = &h.state.certificate_service;
    let soon = h.certificate("Snart").await;
    let later = h.certificate("Senare").await;
    let gone = h.certificate("Utgånget").await;
    certs
        .add_certificate_to_user(user.id, soon.id, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap())
        .await
        .unwrap();
    certs
        .add_certificate_to_user(user.id, later.id, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap())
        .await
        .unwrap();
    certs
        .add_certificate_to_user(user.id, gone.id, NaiveDate::from_ymd_opt(2023, 12, 1).unwrap())
        .await
        .unwrap();

    let overview = h.state.query_service.overview().await.unwrap();
    assert_eq!(
        overview,
        Overview {
            total_items: 4,
            available: 1,
            checked_out: 1,
            in_maintenance: 1,
            lost: 1,
            active_certificates: 2,
            expiring_certificates: 1,
        }
    );
}
