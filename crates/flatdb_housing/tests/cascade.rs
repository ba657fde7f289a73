//! Cascading deletes and saves across entity types.

mod common;

use common::{file_store, memory_store, APPLICANT, MANAGER, OFFICER, PROJECT};
use flatdb_core::{CoreError, Entity, RelationContainer, RelationshipError};
use flatdb_housing::{
    Application, ApplicationStatus, Enquiry, FlatUnit, Project, ProjectUnits, Registration, User,
    UserApplication,
};

#[test]
fn deleting_a_project_deletes_its_units_in_one_call() {
    let (dir, mut store, sample) = file_store();
    assert_eq!(store.len::<FlatUnit>(), 2);

    let project = store.get_by_key::<Project>(PROJECT).unwrap();
    assert!(store.delete(&project).unwrap());

    assert!(store.get_by_key::<Project>(PROJECT).is_none());
    for unit in &sample.units {
        assert!(store.get_by_key::<FlatUnit>(unit).is_none());
    }
    assert!(store.get_all::<FlatUnit>().is_empty());
    assert!(store.get_all::<Application>().is_empty());
    assert!(store.get_all::<Registration>().is_empty());
    assert!(store.get_all::<Enquiry>().is_empty());

    // Users are not owned by the project.
    assert_eq!(store.len::<User>(), 3);
    assert!(store.relation::<UserApplication>().unwrap().is_empty());

    assert_eq!(dir.text(FlatUnit::TYPE_NAME), "");
    assert_eq!(dir.text(Project::TYPE_NAME), "");
    assert_eq!(dir.rows(User::TYPE_NAME).len(), 3);
}

#[test]
fn deleting_a_project_survives_a_reopen() {
    let (dir, mut store, _) = file_store();
    let project = store.get_by_key::<Project>(PROJECT).unwrap();
    store.delete(&project).unwrap();
    drop(store);

    let store = flatdb_housing::open(dir.path(), dir.config()).unwrap();
    assert_eq!(store.len::<Project>(), 0);
    assert_eq!(store.len::<FlatUnit>(), 0);
    assert_eq!(store.len::<User>(), 3);
}

#[test]
fn deleting_an_applicant_removes_their_records_and_frees_their_flat() {
    let (_backends, mut store, sample) = memory_store();

    let mut unit = store.get_by_key::<FlatUnit>(&sample.units[0]).unwrap();
    unit.book(APPLICANT).unwrap();
    store.save(&unit).unwrap();

    let applicant = store.get_by_key::<User>(APPLICANT).unwrap();
    assert!(store.delete(&applicant).unwrap());

    assert!(store.get_by_key::<Application>(&sample.application).is_none());
    assert!(store.get_by_key::<Enquiry>(&sample.enquiry).is_none());
    assert_eq!(store.get_by_key::<FlatUnit>(&sample.units[0]).unwrap().booked_by(), None);
    assert!(store
        .relation::<UserApplication>()
        .unwrap()
        .target_of(APPLICANT)
        .is_none());

    // The officer's registration is untouched.
    assert!(store.get_by_key::<Registration>(&sample.registration).is_some());
}

#[test]
fn deleting_a_manager_is_refused() {
    let (_backends, mut store, _) = memory_store();
    let manager = store.get_by_key::<User>(MANAGER).unwrap();

    let err = store.delete(&manager).unwrap_err();
    assert!(err.is_save());
    assert!(matches!(
        err.root(),
        CoreError::Relationship(RelationshipError::Cascade { .. })
    ));
    assert!(store.contains::<User>(MANAGER));
    assert!(store.contains::<Project>(PROJECT));
}

#[test]
fn deleting_an_officer_removes_their_registration() {
    let (_backends, mut store, sample) = memory_store();
    let officer = store.get_by_key::<User>(OFFICER).unwrap();
    store.delete(&officer).unwrap();

    assert!(store.get_by_key::<Registration>(&sample.registration).is_none());
    assert!(store.get_by_key::<Application>(&sample.application).is_some());
}

#[test]
fn saving_a_dependent_attaches_it_to_its_project() {
    let (_backends, store, sample) = memory_store();
    let units = store.relation::<ProjectUnits>().unwrap();

    let mut children = units.children_of(PROJECT);
    children.sort_unstable();
    let mut expected: Vec<&str> = sample.units.iter().map(String::as_str).collect();
    expected.sort_unstable();
    assert_eq!(children, expected);
}

#[test]
fn saving_a_dependent_of_a_missing_project_fails() {
    let (backends, mut store, _) = memory_store();
    let before = backends.text(FlatUnit::TYPE_NAME);

    let orphan = FlatUnit::new("Nowhere", flatdb_housing::FlatType::TwoRoom, 1);
    let err = store.save(&orphan).unwrap_err();

    assert!(matches!(
        err.root(),
        CoreError::Relationship(RelationshipError::Cascade { .. })
    ));
    assert!(!store.contains::<FlatUnit>(orphan.id()));
    assert_eq!(backends.text(FlatUnit::TYPE_NAME), before);
}

#[test]
fn an_applicant_holds_one_active_application() {
    let (_backends, mut store, sample) = memory_store();

    let second = Application::new(APPLICANT, PROJECT, flatdb_housing::FlatType::ThreeRoom);
    let err = store.save(&second).unwrap_err();
    assert!(matches!(
        err.root(),
        CoreError::Relationship(RelationshipError::AlreadyPaired { .. })
    ));
    assert!(!store.contains::<Application>(second.id()));

    // Once the first is withdrawn the slot is free.
    let mut first = store.get_by_key::<Application>(&sample.application).unwrap();
    first.set_status(ApplicationStatus::Withdrawn);
    store.save_or_restore(&mut first).unwrap();
    store.save(&second).unwrap();

    let pairs = store.relation::<UserApplication>().unwrap();
    assert_eq!(pairs.target_of(APPLICANT), Some(second.id()));
}

#[test]
fn saving_an_application_rewrites_the_stored_project() {
    let (backends, mut store, sample) = memory_store();
    let projects_before = backends.text(Project::TYPE_NAME);

    // An unsaved project edit stays out of the application's cascade.
    let mut draft = store.get_by_key::<Project>(PROJECT).unwrap();
    draft.set_officer_slots(9);

    let mut application = store.get_by_key::<Application>(&sample.application).unwrap();
    application.set_status(ApplicationStatus::Successful);
    store.save(&application).unwrap();

    assert_eq!(store.get_by_key::<Project>(PROJECT).unwrap().state().officer_slots, 3);
    assert_eq!(backends.text(Project::TYPE_NAME), projects_before);

    store.save(&draft).unwrap();
    assert_eq!(store.get_by_key::<Project>(PROJECT).unwrap().state().officer_slots, 9);
}
