//! # FlatDB Housing
//!
//! The schema of a housing-project application workflow, declared on top of
//! `flatdb_core`.
//!
//! | Entity         | Key             | References                    |
//! |----------------|-----------------|-------------------------------|
//! | [`User`]       | NRIC            |                               |
//! | [`Project`]    | name            | manager                       |
//! | [`FlatUnit`]   | generated       | project, booked-by (optional) |
//! | [`Application`]| generated       | applicant, project            |
//! | [`Registration`]| generated      | officer, project              |
//! | [`Enquiry`]    | generated       | author, project               |
//!
//! Deleting a project deletes its units, applications, registrations and
//! enquiries in the same call. Saving an application re-saves its project.
//!
//! ```rust,no_run
//! use flatdb_core::Config;
//! use flatdb_housing::{FlatType, FlatUnit, Project};
//! use std::path::Path;
//!
//! let mut store = flatdb_housing::open(Path::new("data"), Config::default())?;
//! for unit in store.query_by(&[FlatUnit::in_project("Acacia"), FlatUnit::available()]) {
//!     println!("{} {}", unit.id(), unit.flat_type());
//! }
//! if let Some(project) = store.get_by_key::<Project>("Acacia") {
//!     store.delete(&project)?;
//! }
//! # Ok::<(), flatdb_core::CoreError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod application;
mod enquiry;
mod enums;
mod flat_unit;
mod project;
mod registration;
mod relations;
mod user;

pub use application::{Application, ApplicationState};
pub use enquiry::{Enquiry, EnquiryState};
pub use enums::{
    ApplicationStatus, FlatType, MaritalStatus, RegistrationStatus, Role, APPLICATION_STATUS,
    FLAT_TYPE, MARITAL_STATUS, REGISTRATION_STATUS, ROLE,
};
pub use flat_unit::{FlatUnit, UnitState};
pub use project::{Project, ProjectState};
pub use registration::Registration;
pub use relations::{
    ProjectApplications, ProjectEnquiries, ProjectRegistrations, ProjectUnits, UserApplication,
};
pub use user::User;

use flatdb_core::codec::ConverterRegistry;
use flatdb_core::storage::StorageBackend;
use flatdb_core::{Config, CoreResult, Entity, EntityStore, StoreBuilder};
use std::path::Path;

/// Type names of every housing entity, owners before dependents.
pub const TYPE_NAMES: [&str; 6] = [
    User::TYPE_NAME,
    Project::TYPE_NAME,
    FlatUnit::TYPE_NAME,
    Application::TYPE_NAME,
    Registration::TYPE_NAME,
    Enquiry::TYPE_NAME,
];

/// The default converters plus every housing enumeration.
#[must_use]
pub fn converters() -> ConverterRegistry {
    let mut registry = ConverterRegistry::with_defaults();
    enums::register_all(&mut registry);
    registry
}

/// Opens the housing store kept in `dir`, one `<Type>.<ext>` file per entity
/// type.
///
/// # Errors
///
/// Fails if the directory is locked, a backing file is missing (unless
/// `create_if_missing`), or any row does not parse.
pub fn open(dir: &Path, config: Config) -> CoreResult<EntityStore> {
    let builder = StoreBuilder::in_dir(dir, config)?
        .register_file::<User>()
        .register_file::<Project>()
        .register_file::<FlatUnit>()
        .register_file::<Application>()
        .register_file::<Registration>()
        .register_file::<Enquiry>();
    wire(builder).open()
}

/// Opens the housing store with the backend `backend_for` returns for each
/// type name.
///
/// # Errors
///
/// Same as [`open`], minus the directory checks.
pub fn open_with<F>(config: Config, mut backend_for: F) -> CoreResult<EntityStore>
where
    F: FnMut(&'static str) -> Box<dyn StorageBackend>,
{
    let builder = StoreBuilder::new(config)
        .register::<User>(backend_for(User::TYPE_NAME))
        .register::<Project>(backend_for(Project::TYPE_NAME))
        .register::<FlatUnit>(backend_for(FlatUnit::TYPE_NAME))
        .register::<Application>(backend_for(Application::TYPE_NAME))
        .register::<Registration>(backend_for(Registration::TYPE_NAME))
        .register::<Enquiry>(backend_for(Enquiry::TYPE_NAME));
    wire(builder).open()
}

fn wire(builder: StoreBuilder) -> StoreBuilder {
    builder
        .converters(converters())
        .relation::<ProjectUnits>()
        .relation::<ProjectApplications>()
        .relation::<ProjectRegistrations>()
        .relation::<ProjectEnquiries>()
        .relation::<UserApplication>()
        .load_resolver::<FlatUnit>()
        .load_resolver::<Application>()
        .load_resolver::<Registration>()
        .load_resolver::<Enquiry>()
        .save_resolver::<Project>()
        .save_resolver::<FlatUnit>()
        .save_resolver::<Application>()
        .save_resolver::<Registration>()
        .save_resolver::<Enquiry>()
        .delete_resolver::<User>()
        .delete_resolver::<Project>()
}
