//! Backing files: format, startup checks and atomic replacement.

mod common;

use common::{date, file_store, APPLICANT, MANAGER, PROJECT};
use flatdb_core::{Config, CoreError, Entity};
use flatdb_housing::{Enquiry, FlatUnit, MaritalStatus, Project, Role, User};
use flatdb_testkit::{
    field_text_strategy, operation_sequence_strategy, PropTestConfig, StoreOperation, TempDataDir,
};
use proptest::prelude::*;
use std::collections::BTreeMap;

#[test]
fn rows_survive_a_reopen_field_for_field() {
    let (dir, mut store, sample) = file_store();

    let mut enquiry = store.get_by_key::<Enquiry>(&sample.enquiry).unwrap();
    enquiry.reply("Yes,\nbasement level\\B2").unwrap();
    store.save(&enquiry).unwrap();
    let users = store.get_all::<User>();
    let projects = store.get_all::<Project>();
    let units = store.get_all::<FlatUnit>();
    drop(store);

    let store = flatdb_housing::open(dir.path(), dir.config()).unwrap();
    assert_eq!(store.get_all::<User>(), users);
    assert_eq!(store.get_all::<Project>(), projects);
    assert_eq!(store.get_all::<FlatUnit>(), units);
    assert_eq!(
        store.get_by_key::<Enquiry>(&sample.enquiry).unwrap().reply_text(),
        Some("Yes,\nbasement level\\B2")
    );
}

#[test]
fn files_hold_one_line_per_entity_in_key_order() {
    let (dir, _store, _) = file_store();

    let rows = dir.rows(User::TYPE_NAME);
    let keys: Vec<&str> = rows.iter().map(|r| r[0].as_str()).collect();
    assert_eq!(keys, ["S1234567A", "T2109876H", "T8765432F"]);
    assert_eq!(rows[0], ["S1234567A", "John", "35", "Single", "Applicant"]);

    let project = &dir.rows(Project::TYPE_NAME)[0];
    assert_eq!(
        project,
        &[PROJECT, "Yishun", "2025-02-15", "2025-03-20", MANAGER, "3", "true"]
    );

    // An unbooked unit leaves its nullable field empty.
    for unit in dir.rows(FlatUnit::TYPE_NAME) {
        assert_eq!(unit.len(), 5);
        assert_eq!(unit[4], "");
    }
}

#[test]
fn missing_backing_file_is_fatal_without_create() {
    let dir = TempDataDir::new();
    let err = flatdb_housing::open(dir.path(), Config::new().sync_writes(false)).unwrap_err();
    assert!(matches!(err, CoreError::MissingBackingFile { .. }));
}

#[test]
fn repeated_primary_key_is_fatal() {
    let dir = TempDataDir::new();
    dir.seed(
        User::TYPE_NAME,
        &[
            &[APPLICANT, "John", "35", "Single", "Applicant"],
            &[APPLICANT, "Jon", "36", "Single", "Applicant"],
        ],
    );

    let err = flatdb_housing::open(dir.path(), dir.config()).unwrap_err();
    assert!(matches!(err.root(), CoreError::DuplicateKey { .. }));
}

#[test]
fn unparseable_field_names_the_line() {
    let dir = TempDataDir::new();
    dir.seed_text(
        User::TYPE_NAME,
        "S1234567A,John,35,Single,Applicant\nS7654321B,Ann,old,Single,Applicant\n",
    );

    let err = flatdb_housing::open(dir.path(), dir.config()).unwrap_err();
    assert!(matches!(err, CoreError::Row { line: 2, .. }));
}

#[test]
fn unknown_enum_variant_is_fatal() {
    let dir = TempDataDir::new();
    dir.seed(
        User::TYPE_NAME,
        &[&[APPLICANT, "John", "35", "Divorced", "Applicant"]],
    );

    let err = flatdb_housing::open(dir.path(), dir.config()).unwrap_err();
    assert!(matches!(err.root(), CoreError::Field { .. }));
}

#[test]
fn abandoned_temp_write_is_never_read() {
    let (dir, store, _) = file_store();
    let before = dir.text(User::TYPE_NAME);
    drop(store);

    dir.abandon_temp_write(User::TYPE_NAME, &["S0000000Z", "Ghost", "99", "Single"]);

    let store = flatdb_housing::open(dir.path(), dir.config()).unwrap();
    assert_eq!(store.len::<User>(), 3);
    assert!(!store.contains::<User>("S0000000Z"));
    assert_eq!(dir.text(User::TYPE_NAME), before);
}

#[test]
fn a_second_store_on_the_same_directory_is_refused() {
    let (dir, _store, _) = file_store();
    let err = flatdb_housing::open(dir.path(), dir.config()).unwrap_err();
    assert!(matches!(err, CoreError::DirectoryLocked));
}

#[test]
fn saved_project_changes_reach_the_file() {
    let (dir, mut store, _) = file_store();
    let mut project = store.get_by_key::<Project>(PROJECT).unwrap();
    project.set_closing_date(date(2025, 4, 30));
    project.set_officer_slots(5);
    store.save_or_restore(&mut project).unwrap();

    let row = &dir.rows(Project::TYPE_NAME)[0];
    assert_eq!(row[3], "2025-04-30");
    assert_eq!(row[5], "5");
}

proptest! {
    #![proptest_config(PropTestConfig::quick().to_proptest_config())]

    /// After any sequence of saves and deletes, the file holds exactly the
    /// surviving users in key order, and a reopen reads the same set.
    #[test]
    fn file_matches_model_after_any_sequence(ops in operation_sequence_strategy(1, 12)) {
        let dir = TempDataDir::new();
        let mut store = flatdb_housing::open(dir.path(), dir.config()).unwrap();
        let mut model: BTreeMap<String, String> = BTreeMap::new();

        for op in ops {
            match op {
                StoreOperation::Save { key, value } => {
                    let user = User::new(&key, &value, 30, MaritalStatus::Single, Role::Applicant);
                    store.save(&user).unwrap();
                    model.insert(key, value);
                }
                StoreOperation::Delete { key } => {
                    let probe = User::new(&key, "", 0, MaritalStatus::Single, Role::Applicant);
                    let removed = store.delete(&probe).unwrap();
                    prop_assert_eq!(removed, model.remove(&key).is_some());
                }
            }
        }

        let rows = dir.rows(User::TYPE_NAME);
        let on_disk: Vec<(String, String)> =
            rows.iter().map(|r| (r[0].clone(), r[1].clone())).collect();
        let expected: Vec<(String, String)> = model.clone().into_iter().collect();
        prop_assert_eq!(on_disk, expected);

        drop(store);
        let store = flatdb_housing::open(dir.path(), dir.config()).unwrap();
        let names: BTreeMap<String, String> = store
            .get_all::<User>()
            .into_iter()
            .map(|u| (u.nric().to_string(), u.name().to_string()))
            .collect();
        prop_assert_eq!(names, model);
    }

    /// Free text with separators and escapes reads back unchanged.
    #[test]
    fn enquiry_text_round_trips(message in field_text_strategy()) {
        let (dir, mut store, _) = file_store();
        let enquiry = Enquiry::new(APPLICANT, PROJECT, message.clone());
        store.save(&enquiry).unwrap();
        drop(store);

        let store = flatdb_housing::open(dir.path(), dir.config()).unwrap();
        let loaded = store.get_by_key::<Enquiry>(enquiry.id()).unwrap();
        prop_assert_eq!(loaded.message(), message.as_str());
    }

    /// A reply reads back exactly as written, and a blank one is never stored.
    #[test]
    fn enquiry_reply_round_trips(reply in prop_oneof![Just(String::new()), field_text_strategy()]) {
        let (dir, mut store, sample) = file_store();
        let mut enquiry = store.get_by_key::<Enquiry>(&sample.enquiry).unwrap();
        let accepted = enquiry.reply(reply.clone()).is_ok();
        prop_assert_eq!(accepted, !reply.trim().is_empty());
        store.save(&enquiry).unwrap();
        drop(store);

        let store = flatdb_housing::open(dir.path(), dir.config()).unwrap();
        let loaded = store.get_by_key::<Enquiry>(&sample.enquiry).unwrap();
        let expected = if accepted { Some(reply.as_str()) } else { None };
        prop_assert_eq!(loaded.reply_text(), expected);
    }
}
