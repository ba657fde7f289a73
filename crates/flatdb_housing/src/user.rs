//! Users of the system: applicants, officers and managers.

use crate::enums::{MaritalStatus, Role, MARITAL_STATUS, ROLE};
use crate::relations::delete_keys;
use crate::{Application, Enquiry, FlatUnit, Project, Registration};
use flatdb_core::codec::{INT, TEXT};
use flatdb_core::{CoreResult, DeleteResolver, Entity, EntityStore, FieldDescriptor, RelationshipError};

/// A registered person, keyed by NRIC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    nric: String,
    name: String,
    age: u32,
    marital_status: MaritalStatus,
    role: Role,
}

impl User {
    /// Creates a user.
    #[must_use]
    pub fn new(
        nric: impl Into<String>,
        name: impl Into<String>,
        age: u32,
        marital_status: MaritalStatus,
        role: Role,
    ) -> Self {
        Self {
            nric: nric.into(),
            name: name.into(),
            age,
            marital_status,
            role,
        }
    }

    /// Returns the NRIC.
    #[must_use]
    pub fn nric(&self) -> &str {
        &self.nric
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the age in years.
    #[must_use]
    pub const fn age(&self) -> u32 {
        self.age
    }

    /// Returns the marital status.
    #[must_use]
    pub const fn marital_status(&self) -> MaritalStatus {
        self.marital_status
    }

    /// Returns the role.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }
}

impl Entity for User {
    const TYPE_NAME: &'static str = "User";

    fn key(&self) -> &str {
        &self.nric
    }

    fn blank() -> Self {
        Self::new("", "", 0, MaritalStatus::Single, Role::Applicant)
    }

    fn fields() -> Vec<FieldDescriptor<Self>> {
        vec![
            FieldDescriptor::<Self>::new(
                "nric",
                0,
                TEXT,
                |u| u.nric.clone().into(),
                |u, v| {
                    u.nric = v.try_into()?;
                    Ok(())
                },
            ),
            FieldDescriptor::<Self>::new(
                "name",
                1,
                TEXT,
                |u| u.name.clone().into(),
                |u, v| {
                    u.name = v.try_into()?;
                    Ok(())
                },
            ),
            FieldDescriptor::<Self>::new(
                "age",
                2,
                INT,
                |u| u.age.into(),
                |u, v| {
                    u.age = v.try_into()?;
                    Ok(())
                },
            ),
            FieldDescriptor::<Self>::new(
                "marital_status",
                3,
                MARITAL_STATUS,
                |u| u.marital_status.into(),
                |u, v| {
                    u.marital_status = v.try_into()?;
                    Ok(())
                },
            ),
            FieldDescriptor::<Self>::new(
                "role",
                4,
                ROLE,
                |u| u.role.into(),
                |u, v| {
                    u.role = v.try_into()?;
                    Ok(())
                },
            ),
        ]
    }
}

impl DeleteResolver for User {
    /// Deletes everything the user authored and frees any flat they booked.
    ///
    /// A user who still manages a project cannot be deleted.
    fn resolve_delete(&self, store: &mut EntityStore) -> CoreResult<()> {
        let managed = store.count_by(&[Project::managed_by(&self.nric)]);
        if managed > 0 {
            return Err(RelationshipError::cascade(format!(
                "user {} still manages {managed} project(s)",
                self.nric
            ))
            .into());
        }

        for mut unit in store.query_by(&[FlatUnit::booked_by_user(&self.nric)]) {
            unit.release();
            store.save(&unit)?;
        }

        // Deleting the applications also unpairs the active one.
        let applications = keys(store.query_by(&[Application::by_applicant(&self.nric)]));
        delete_keys::<Application>(store, &applications)?;
        let registrations = keys(store.query_by(&[Registration::by_officer(&self.nric)]));
        delete_keys::<Registration>(store, &registrations)?;
        let enquiries = keys(store.query_by(&[Enquiry::by_author(&self.nric)]));
        delete_keys::<Enquiry>(store, &enquiries)
    }
}

fn keys<E: Entity>(entities: Vec<E>) -> Vec<String> {
    entities.iter().map(|e| e.key().to_string()).collect()
}
