//! Shared fixture for the housing integration tests.

#![allow(dead_code)]

use chrono::NaiveDate;
use flatdb_core::{Config, EntityStore};
use flatdb_housing::{
    Application, Enquiry, FlatType, FlatUnit, MaritalStatus, Project, Registration, Role, User,
};
use flatdb_testkit::{BackendSet, TempDataDir};

pub const MANAGER: &str = "T8765432F";
pub const APPLICANT: &str = "S1234567A";
pub const OFFICER: &str = "T2109876H";
pub const PROJECT: &str = "Acacia Breeze";

/// Keys of the sample records.
pub struct Sample {
    pub units: Vec<String>,
    pub application: String,
    pub registration: String,
    pub enquiry: String,
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Fills an empty store through the public API: three users, one project
/// with two units, and one application, registration and enquiry.
pub fn populate(store: &mut EntityStore) -> Sample {
    for user in [
        User::new(MANAGER, "Jessica", 26, MaritalStatus::Married, Role::Manager),
        User::new(APPLICANT, "John", 35, MaritalStatus::Single, Role::Applicant),
        User::new(OFFICER, "Daniel", 36, MaritalStatus::Single, Role::Officer),
    ] {
        store.save(&user).unwrap();
    }

    let mut project = Project::new(
        PROJECT,
        "Yishun",
        date(2025, 2, 15),
        date(2025, 3, 20),
        MANAGER,
        3,
    );
    project.set_visible(true);
    store.save(&project).unwrap();

    let units = vec![
        FlatUnit::new(PROJECT, FlatType::TwoRoom, 350_000),
        FlatUnit::new(PROJECT, FlatType::ThreeRoom, 450_000),
    ];
    for unit in &units {
        store.save(unit).unwrap();
    }

    let application = Application::new(APPLICANT, PROJECT, FlatType::TwoRoom);
    store.save(&application).unwrap();
    let registration = Registration::new(OFFICER, PROJECT);
    store.save(&registration).unwrap();
    let enquiry = Enquiry::new(APPLICANT, PROJECT, "Is there parking, and a gym?");
    store.save(&enquiry).unwrap();

    Sample {
        units: units.iter().map(|u| u.id().to_string()).collect(),
        application: application.id().to_string(),
        registration: registration.id().to_string(),
        enquiry: enquiry.id().to_string(),
    }
}

/// An in-memory store whose backends the test can inspect and break.
pub fn memory_store() -> (BackendSet, EntityStore, Sample) {
    let backends = BackendSet::new();
    let mut store = flatdb_housing::open_with(Config::default(), backends.factory()).unwrap();
    let sample = populate(&mut store);
    (backends, store, sample)
}

/// A file-backed store in a fresh temporary directory.
pub fn file_store() -> (TempDataDir, EntityStore, Sample) {
    let dir = TempDataDir::new();
    let mut store = flatdb_housing::open(dir.path(), dir.config()).unwrap();
    let sample = populate(&mut store);
    (dir, store, sample)
}
