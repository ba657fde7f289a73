//! Applications for a flat in a project.

use crate::enums::{ApplicationStatus, FlatType, APPLICATION_STATUS, FLAT_TYPE};
use crate::relations::{attach_all, require, ProjectApplications, UserApplication};
use crate::{Project, User};
use flatdb_core::codec::{BOOL, TEXT};
use flatdb_core::{
    Backup, CoreResult, Entity, EntityKey, EntityStore, FieldDescriptor, LoadResolver, Predicate,
    SaveResolver, Tracked,
};

/// Fields of an application that change after it is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationState {
    /// Where the application is in its lifecycle.
    pub status: ApplicationStatus,
    /// Whether the applicant asked to withdraw.
    pub withdrawal_requested: bool,
}

/// An applicant's request for a flat type in a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Application {
    id: String,
    applicant: String,
    project: String,
    flat_type: FlatType,
    state: Tracked<ApplicationState>,
}

impl Application {
    /// Creates a pending application with a generated key.
    #[must_use]
    pub fn new(
        applicant: impl Into<String>,
        project: impl Into<String>,
        flat_type: FlatType,
    ) -> Self {
        Self {
            id: EntityKey::generate_prefixed("APP").into_string(),
            applicant: applicant.into(),
            project: project.into(),
            flat_type,
            state: Tracked::new(ApplicationState {
                status: ApplicationStatus::Pending,
                withdrawal_requested: false,
            }),
        }
    }

    /// Returns the generated key.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the NRIC of the applicant.
    #[must_use]
    pub fn applicant(&self) -> &str {
        &self.applicant
    }

    /// Returns the name of the project applied to.
    #[must_use]
    pub fn project(&self) -> &str {
        &self.project
    }

    /// Returns the requested flat type.
    #[must_use]
    pub const fn flat_type(&self) -> FlatType {
        self.flat_type
    }

    /// Returns the current status.
    #[must_use]
    pub fn status(&self) -> ApplicationStatus {
        self.state.status
    }

    /// Returns whether the applicant asked to withdraw.
    #[must_use]
    pub fn withdrawal_requested(&self) -> bool {
        self.state.withdrawal_requested
    }

    /// Moves the application to `status`.
    pub fn set_status(&mut self, status: ApplicationStatus) {
        self.state.modify().status = status;
    }

    /// Records the applicant's request to withdraw.
    pub fn request_withdrawal(&mut self) {
        self.state.modify().withdrawal_requested = true;
    }

    /// Matches the applications of `nric`.
    #[must_use]
    pub fn by_applicant(nric: &str) -> Predicate<Self> {
        let nric = nric.to_string();
        Predicate::new(move |a: &Self| a.applicant == nric)
    }

    /// Matches applications in `status`.
    #[must_use]
    pub fn with_status(status: ApplicationStatus) -> Predicate<Self> {
        Predicate::new(move |a: &Self| a.state.status == status)
    }

    /// Matches applications awaiting a withdrawal decision.
    #[must_use]
    pub fn withdrawal_pending() -> Predicate<Self> {
        Predicate::new(|a: &Self| a.state.withdrawal_requested && a.state.status.is_active())
    }
}

impl Backup for Application {
    fn backup(&mut self) {
        self.state.backup();
    }

    fn restore(&mut self) {
        self.state.restore();
    }
}

impl Entity for Application {
    const TYPE_NAME: &'static str = "Application";

    fn key(&self) -> &str {
        &self.id
    }

    fn blank() -> Self {
        Self {
            id: String::new(),
            applicant: String::new(),
            project: String::new(),
            flat_type: FlatType::TwoRoom,
            state: Tracked::new(ApplicationState {
                status: ApplicationStatus::Pending,
                withdrawal_requested: false,
            }),
        }
    }

    fn fields() -> Vec<FieldDescriptor<Self>> {
        vec![
            FieldDescriptor::<Self>::new(
                "id",
                0,
                TEXT,
                |a| a.id.clone().into(),
                |a, v| {
                    a.id = v.try_into()?;
                    Ok(())
                },
            ),
            FieldDescriptor::<Self>::new(
                "applicant",
                1,
                TEXT,
                |a| a.applicant.clone().into(),
                |a, v| {
                    a.applicant = v.try_into()?;
                    Ok(())
                },
            )
            .foreign_key::<User>(),
            FieldDescriptor::<Self>::new(
                "project",
                2,
                TEXT,
                |a| a.project.clone().into(),
                |a, v| {
                    a.project = v.try_into()?;
                    Ok(())
                },
            )
            .foreign_key::<Project>(),
            FieldDescriptor::<Self>::new(
                "flat_type",
                3,
                FLAT_TYPE,
                |a| a.flat_type.into(),
                |a, v| {
                    a.flat_type = v.try_into()?;
                    Ok(())
                },
            ),
            FieldDescriptor::<Self>::new(
                "status",
                4,
                APPLICATION_STATUS,
                |a| a.state.status.into(),
                |a, v| {
                    a.state.live_mut().status = v.try_into()?;
                    Ok(())
                },
            ),
            FieldDescriptor::<Self>::new(
                "withdrawal_requested",
                5,
                BOOL,
                |a| a.state.withdrawal_requested.into(),
                |a, v| {
                    a.state.live_mut().withdrawal_requested = v.try_into()?;
                    Ok(())
                },
            ),
        ]
    }
}

impl LoadResolver for Application {
    fn resolve_load(store: &mut EntityStore) -> CoreResult<()> {
        attach_all::<Project, Self>(store, Self::project)?;

        for application in store.query_by(&[Predicate::new(|a: &Self| a.status().is_active())]) {
            if store.contains::<User>(&application.applicant) {
                store
                    .relation_mut::<UserApplication>()?
                    .add_keys(&application.applicant, &application.id)?;
            }
        }
        Ok(())
    }
}

impl SaveResolver for Application {
    /// Attaches the application to its project and applicant, then re-saves
    /// the project as the store holds it, so both files are rewritten in the
    /// same unit of work. Changes made to a project clone that was never
    /// saved are not picked up.
    ///
    /// An applicant holds at most one active application; saving a second
    /// one fails the cascade.
    fn resolve_save(&self, store: &mut EntityStore) -> CoreResult<()> {
        let dependent = format!("application {}", self.id);
        let project = require::<Project>(store, &self.project, &dependent)?;
        require::<User>(store, &self.applicant, &dependent)?;

        store
            .relation_mut::<ProjectApplications>()?
            .add_keys(&self.project, &self.id)?;

        let pairs = store.relation_mut::<UserApplication>()?;
        let paired = pairs.source_of(&self.id).is_some();
        if self.status().is_active() {
            if !paired {
                pairs.add_keys(&self.applicant, &self.id)?;
            }
        } else if paired {
            pairs.remove(self);
        }

        store.save(&project)
    }
}
