use anyhow::Result;
use directory_tests::{drop_employees, insert_employee, migrated_db};
use products_hr::{HrModule, LISTING_UNAVAILABLE, ListQuery};

async fn directory() -> Result<HrModule> {
    let db = migrated_db().await?;
    let boss = insert_employee(&db, "Olga Ivanova", 300_000.0, None).await?;
    insert_employee(&db, "Ivan Petrov", 150_000.0, Some(boss.id)).await?;
    insert_employee(&db, "Petr Ivanov", 150_000.0, Some(boss.id)).await?;
    insert_employee(&db, "Sergey PETROVSKY", 90_000.0, None).await?;
    Ok(HrModule::new(db))
}

fn names(listing: &products_hr::Listing) -> Vec<&str> {
    listing
        .employees
        .iter()
        .map(|e| e.full_name.as_str())
        .collect()
}

#[tokio::test]
async fn search_matches_substrings_ignoring_case() -> Result<()> {
    let hr = directory().await?;
    let listing = hr
        .employees(&ListQuery::from_params(Some("petrov"), None, None))
        .await;
    assert_eq!(names(&listing), vec!["Ivan Petrov", "Sergey PETROVSKY"]);
    assert!(listing.warning.is_none());

    let listing = hr
        .employees(&ListQuery::from_params(Some("ivan"), None, None))
        .await;
    assert_eq!(names(&listing), vec!["Olga Ivanova", "Ivan Petrov", "Petr Ivanov"]);
    Ok(())
}

#[tokio::test]
async fn search_treats_wildcards_literally() -> Result<()> {
    let hr = directory().await?;
    let listing = hr
        .employees(&ListQuery::from_params(Some("%"), None, None))
        .await;
    assert!(listing.employees.is_empty());
    assert!(listing.warning.is_none());
    Ok(())
}

#[tokio::test]
async fn sorts_descending_with_id_tie_break() -> Result<()> {
    let hr = directory().await?;
    let listing = hr
        .employees(&ListQuery::from_params(None, Some("salary"), Some("desc")))
        .await;
    let ids: Vec<_> = listing.employees.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![1, 2, 3, 4]);

    let listing = hr
        .employees(&ListQuery::from_params(None, Some("full_name"), None))
        .await;
    assert_eq!(
        names(&listing),
        vec!["Ivan Petrov", "Olga Ivanova", "Petr Ivanov", "Sergey PETROVSKY"]
    );
    Ok(())
}

#[tokio::test]
async fn unknown_sort_field_keeps_default_order() -> Result<()> {
    let hr = directory().await?;
    let listing = hr
        .employees(&ListQuery::from_params(None, Some("salary; drop table"), Some("desc")))
        .await;
    let ids: Vec<_> = listing.employees.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![1, 2, 3, 4]);
    Ok(())
}

#[tokio::test]
async fn listing_carries_manager_names() -> Result<()> {
    let hr = directory().await?;
    let listing = hr.employees(&ListQuery::default()).await;
    let managers: Vec<_> = listing
        .employees
        .iter()
        .map(|e| e.manager_name.as_deref())
        .collect();
    assert_eq!(
        managers,
        vec![None, Some("Olga Ivanova"), Some("Olga Ivanova"), None]
    );
    Ok(())
}

#[tokio::test]
async fn failing_store_degrades_to_warning() -> Result<()> {
    let hr = directory().await?;
    drop_employees(hr.db()).await?;
    let listing = hr.employees(&ListQuery::default()).await;
    assert!(listing.employees.is_empty());
    assert_eq!(listing.warning.as_deref(), Some(LISTING_UNAVAILABLE));
    Ok(())
}

#[tokio::test]
async fn demo_seed_only_fills_an_empty_directory() -> Result<()> {
    let hr = HrModule::new(migrated_db().await?);
    assert_eq!(hr.seed_demo().await?, 7);
    assert_eq!(hr.seed_demo().await?, 0);
    let listing = hr.employees(&ListQuery::default()).await;
    assert_eq!(listing.employees.len(), 7);
    Ok(())
}
