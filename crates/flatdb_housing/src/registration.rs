//! Officer registrations to handle a project.

use crate::enums::{RegistrationStatus, REGISTRATION_STATUS};
use crate::relations::{attach_all, require, ProjectRegistrations};
use crate::{Project, User};
use flatdb_core::codec::TEXT;
use flatdb_core::{
    Backup, CoreResult, Entity, EntityKey, EntityStore, FieldDescriptor, LoadResolver, Predicate,
    SaveResolver, Tracked,
};

/// An officer's request to handle a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    id: String,
    officer: String,
    project: String,
    status: Tracked<RegistrationStatus>,
}

impl Registration {
    /// Creates a pending registration with a generated key.
    #[must_use]
    pub fn new(officer: impl Into<String>, project: impl Into<String>) -> Self {
        Self {
            id: EntityKey::generate_prefixed("REG").into_string(),
            officer: officer.into(),
            project: project.into(),
            status: Tracked::new(RegistrationStatus::Pending),
        }
    }

    /// Returns the generated key.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the NRIC of the officer.
    #[must_use]
    pub fn officer(&self) -> &str {
        &self.officer
    }

    /// Returns the name of the project.
    #[must_use]
    pub fn project(&self) -> &str {
        &self.project
    }

    /// Returns the current status.
    #[must_use]
    pub fn status(&self) -> RegistrationStatus {
        *self.status.get()
    }

    /// Approves the registration.
    pub fn approve(&mut self) {
        *self.status.modify() = RegistrationStatus::Approved;
    }

    /// Rejects the registration.
    pub fn reject(&mut self) {
        *self.status.modify() = RegistrationStatus::Rejected;
    }

    /// Matches the registrations of `nric`.
    #[must_use]
    pub fn by_officer(nric: &str) -> Predicate<Self> {
        let nric = nric.to_string();
        Predicate::new(move |r: &Self| r.officer == nric)
    }

    /// Matches registrations in `status`.
    #[must_use]
    pub fn with_status(status: RegistrationStatus) -> Predicate<Self> {
        Predicate::new(move |r: &Self| *r.status.get() == status)
    }
}

impl Backup for Registration {
    fn backup(&mut self) {
        self.status.backup();
    }

    fn restore(&mut self) {
        self.status.restore();
    }
}

impl Entity for Registration {
    const TYPE_NAME: &'static str = "Registration";

    fn key(&self) -> &str {
        &self.id
    }

    fn blank() -> Self {
        Self {
            id: String::new(),
            officer: String::new(),
            project: String::new(),
            status: Tracked::new(RegistrationStatus::Pending),
        }
    }

    fn fields() -> Vec<FieldDescriptor<Self>> {
        vec![
            FieldDescriptor::<Self>::new(
                "id",
                0,
                TEXT,
                |r| r.id.clone().into(),
                |r, v| {
                    r.id = v.try_into()?;
                    Ok(())
                },
            ),
            FieldDescriptor::<Self>::new(
                "officer",
                1,
                TEXT,
                |r| r.officer.clone().into(),
                |r, v| {
                    r.officer = v.try_into()?;
                    Ok(())
                },
            )
            .foreign_key::<User>(),
            FieldDescriptor::<Self>::new(
                "project",
                2,
                TEXT,
                |r| r.project.clone().into(),
                |r, v| {
                    r.project = v.try_into()?;
                    Ok(())
                },
            )
            .foreign_key::<Project>(),
            FieldDescriptor::<Self>::new(
                "status",
                3,
                REGISTRATION_STATUS,
                |r| (*r.status.get()).into(),
                |r, v| {
                    *r.status.live_mut() = v.try_into()?;
                    Ok(())
                },
            ),
        ]
    }
}

impl LoadResolver for Registration {
    fn resolve_load(store: &mut EntityStore) -> CoreResult<()> {
        attach_all::<Project, Self>(store, Self::project)
    }
}

impl SaveResolver for Registration {
    fn resolve_save(&self, store: &mut EntityStore) -> CoreResult<()> {
        let dependent = format!("registration {}", self.id);
        require::<Project>(store, &self.project, &dependent)?;
        require::<User>(store, &self.officer, &dependent)?;
        store
            .relation_mut::<ProjectRegistrations>()?
            .add_keys(&self.project, &self.id)?;
        Ok(())
    }
}
