//! Housing projects.

use crate::relations::{child_keys, delete_keys, require};
use crate::{Application, Enquiry, FlatUnit, Registration, User};
use chrono::NaiveDate;
use flatdb_core::codec::{BOOL, DATE, INT, TEXT};
use flatdb_core::{
    Backup, CoreResult, DeleteResolver, Entity, EntityStore, FieldDescriptor, Predicate,
    SaveResolver, Tracked,
};

/// Fields of a project that change after it is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectState {
    /// Last day applications are accepted.
    pub closing_date: NaiveDate,
    /// Number of officers that may be approved to handle the project.
    pub officer_slots: u32,
    /// Whether applicants can see the project.
    pub visible: bool,
}

/// A housing project, keyed by its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    name: String,
    neighbourhood: String,
    opening_date: NaiveDate,
    manager: String,
    state: Tracked<ProjectState>,
}

impl Project {
    /// Creates a hidden project.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        neighbourhood: impl Into<String>,
        opening_date: NaiveDate,
        closing_date: NaiveDate,
        manager: impl Into<String>,
        officer_slots: u32,
    ) -> Self {
        Self {
            name: name.into(),
            neighbourhood: neighbourhood.into(),
            opening_date,
            manager: manager.into(),
            state: Tracked::new(ProjectState {
                closing_date,
                officer_slots,
                visible: false,
            }),
        }
    }

    /// Returns the project name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the neighbourhood.
    #[must_use]
    pub fn neighbourhood(&self) -> &str {
        &self.neighbourhood
    }

    /// Returns the first day applications are accepted.
    #[must_use]
    pub const fn opening_date(&self) -> NaiveDate {
        self.opening_date
    }

    /// Returns the NRIC of the managing user.
    #[must_use]
    pub fn manager(&self) -> &str {
        &self.manager
    }

    /// Returns the mutable fields.
    #[must_use]
    pub fn state(&self) -> &ProjectState {
        self.state.get()
    }

    /// Returns whether applications are accepted on `date`.
    #[must_use]
    pub fn is_open_on(&self, date: NaiveDate) -> bool {
        self.opening_date <= date && date <= self.state.closing_date
    }

    /// Shows or hides the project.
    pub fn set_visible(&mut self, visible: bool) {
        self.state.modify().visible = visible;
    }

    /// Changes the number of officer slots.
    pub fn set_officer_slots(&mut self, slots: u32) {
        self.state.modify().officer_slots = slots;
    }

    /// Moves the closing date.
    pub fn set_closing_date(&mut self, date: NaiveDate) {
        self.state.modify().closing_date = date;
    }

    /// Matches the projects managed by `nric`.
    #[must_use]
    pub fn managed_by(nric: &str) -> Predicate<Self> {
        let nric = nric.to_string();
        Predicate::new(move |p: &Self| p.manager == nric)
    }

    /// Matches the projects applicants can see.
    #[must_use]
    pub fn visible() -> Predicate<Self> {
        Predicate::new(|p: &Self| p.state.visible)
    }
}

impl Backup for Project {
    fn backup(&mut self) {
        self.state.backup();
    }

    fn restore(&mut self) {
        self.state.restore();
    }
}

impl Entity for Project {
    const TYPE_NAME: &'static str = "Project";

    fn key(&self) -> &str {
        &self.name
    }

    fn blank() -> Self {
        Self::new("", "", NaiveDate::MIN, NaiveDate::MIN, "", 0)
    }

    fn fields() -> Vec<FieldDescriptor<Self>> {
        vec![
            FieldDescriptor::<Self>::new(
                "name",
                0,
                TEXT,
                |p| p.name.clone().into(),
                |p, v| {
                    p.name = v.try_into()?;
                    Ok(())
                },
            ),
            FieldDescriptor::<Self>::new(
                "neighbourhood",
                1,
                TEXT,
                |p| p.neighbourhood.clone().into(),
                |p, v| {
                    p.neighbourhood = v.try_into()?;
                    Ok(())
                },
            ),
            FieldDescriptor::<Self>::new(
                "opening_date",
                2,
                DATE,
                |p| p.opening_date.into(),
                |p, v| {
                    p.opening_date = v.try_into()?;
                    Ok(())
                },
            ),
            FieldDescriptor::<Self>::new(
                "closing_date",
                3,
                DATE,
                |p| p.state.closing_date.into(),
                |p, v| {
                    p.state.live_mut().closing_date = v.try_into()?;
                    Ok(())
                },
            ),
            FieldDescriptor::<Self>::new(
                "manager",
                4,
                TEXT,
                |p| p.manager.clone().into(),
                |p, v| {
                    p.manager = v.try_into()?;
                    Ok(())
                },
            )
            .foreign_key::<User>(),
            FieldDescriptor::<Self>::new(
                "officer_slots",
                5,
                INT,
                |p| p.state.officer_slots.into(),
                |p, v| {
                    p.state.live_mut().officer_slots = v.try_into()?;
                    Ok(())
                },
            ),
            FieldDescriptor::<Self>::new(
                "visible",
                6,
                BOOL,
                |p| p.state.visible.into(),
                |p, v| {
                    p.state.live_mut().visible = v.try_into()?;
                    Ok(())
                },
            ),
        ]
    }
}

impl SaveResolver for Project {
    fn resolve_save(&self, store: &mut EntityStore) -> CoreResult<()> {
        require::<User>(store, &self.manager, &format!("project {}", self.name))?;
        Ok(())
    }
}

impl DeleteResolver for Project {
    /// Deletes every unit, application, registration and enquiry of the
    /// project.
    fn resolve_delete(&self, store: &mut EntityStore) -> CoreResult<()> {
        let units = child_keys::<Self, FlatUnit>(store, &self.name);
        delete_keys::<FlatUnit>(store, &units)?;
        let applications = child_keys::<Self, Application>(store, &self.name);
        delete_keys::<Application>(store, &applications)?;
        let registrations = child_keys::<Self, Registration>(store, &self.name);
        delete_keys::<Registration>(store, &registrations)?;
        let enquiries = child_keys::<Self, Enquiry>(store, &self.name);
        delete_keys::<Enquiry>(store, &enquiries)
    }
}
