//! Shared setup for the FlatDB benchmarks.

use chrono::NaiveDate;
use flatdb_core::{Config, EntityStore};
use flatdb_housing::{FlatType, FlatUnit, MaritalStatus, Project, Role, User};
use flatdb_storage::{InMemoryBackend, StorageBackend};

/// Manager NRIC used by every generated project.
pub const MANAGER: &str = "T0000000M";

/// Opens an empty housing store backed by memory.
pub fn memory_store() -> EntityStore {
    flatdb_housing::open_with(Config::new(), |_| {
        Box::new(InMemoryBackend::new()) as Box<dyn StorageBackend>
    })
    .expect("empty store opens")
}

/// Opens a memory store holding one manager, `projects` projects and
/// `units_per_project` units in each.
pub fn populated_store(projects: usize, units_per_project: usize) -> EntityStore {
    let mut store = memory_store();
    store
        .save(&User::new(MANAGER, "Manager", 40, MaritalStatus::Married, Role::Manager))
        .expect("manager saves");
    let open = date(2025, 2, 15);
    let close = date(2025, 3, 20);
    for p in 0..projects {
        let name = format!("Project {p:04}");
        store
            .save(&Project::new(&name, "Yishun", open, close, MANAGER, 3))
            .expect("project saves");
        for u in 0..units_per_project {
            let flat_type = if u % 2 == 0 { FlatType::TwoRoom } else { FlatType::ThreeRoom };
            store
                .save(&FlatUnit::new(&name, flat_type, 350_000))
                .expect("unit saves");
        }
    }
    store
}

/// Generates `count` applicant users.
pub fn applicants(count: usize) -> Vec<User> {
    (0..count)
        .map(|i| {
            User::new(
                format!("S{i:07}A"),
                format!("Applicant {i}"),
                35,
                MaritalStatus::Single,
                Role::Applicant,
            )
        })
        .collect()
}

/// Builds a calendar date.
pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}
