mod helper;

use helper::{create_test_store, record};
use version_ledger::version::error::StoreError;
use version_ledger::version::types::Ledger;

#[test]
fn save_then_load_round_trips_ledger() {
    let (_temp_dir, store) = create_test_store();
    let ledger: Ledger = [
        ("node".to_string(), record(1024, "9f86d081884c7d65", false)),
        ("@scoped__pkg".to_string(), record(0, "", false)),
        ("left-pad".to_string(), record(3, "", true)),
    ]
    .into_iter()
    .collect();

    store.save(&ledger).unwrap();

    assert!(store.exists());
    assert_eq!(store.load().unwrap(), ledger);
}

#[test]
fn save_replaces_previous_ledger() {
    let (_temp_dir, store) = create_test_store();
    let initial: Ledger = [("node".to_string(), record(1, "a", false))]
        .into_iter()
        .collect();
    let updated: Ledger = [("react".to_string(), record(2, "b", false))]
        .into_iter()
        .collect();

    store.save(&initial).unwrap();
    store.save(&updated).unwrap();

    assert_eq!(store.load().unwrap(), updated);
}

#[test]
fn load_reads_ledger_written_by_other_tools() {
    let (_temp_dir, store) = create_test_store();
    std::fs::write(
        store.versions_path(),
        r#"{"jquery": {"version": 12, "contentHash": "beef", "deprecated": false}}"#,
    )
    .unwrap();

    let ledger = store.load().unwrap();

    assert_eq!(ledger.version_info("jquery").unwrap(), &record(12, "beef", false));
    assert!(matches!(
        ledger.version_info("angular"),
        Err(StoreError::MissingVersionInfo(_))
    ));
}

#[test]
fn change_list_round_trips_in_order() {
    let (_temp_dir, store) = create_test_store();
    let changes = vec![
        "react".to_string(),
        "node".to_string(),
        "left-pad".to_string(),
    ];

    store.save_changes(&changes).unwrap();

    assert_eq!(store.load_changes().unwrap(), changes);
}
