//! Flat units offered by a project.

use crate::enums::{FlatType, FLAT_TYPE};
use crate::relations::{attach_all, require, ProjectUnits};
use crate::{Project, User};
use flatdb_core::codec::{Value, INT, TEXT};
use flatdb_core::{
    Backup, CoreError, CoreResult, Entity, EntityKey, EntityStore, FieldDescriptor, LoadResolver,
    Predicate, SaveResolver, Tracked,
};

/// Fields of a unit that change after it is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitState {
    /// Asking price in dollars.
    pub price: i64,
    /// NRIC of the applicant who booked the unit.
    pub booked_by: Option<String>,
}

/// One flat of a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatUnit {
    id: String,
    project: String,
    flat_type: FlatType,
    state: Tracked<UnitState>,
}

impl FlatUnit {
    /// Creates an unbooked unit with a generated key.
    #[must_use]
    pub fn new(project: impl Into<String>, flat_type: FlatType, price: i64) -> Self {
        Self {
            id: EntityKey::generate_prefixed("UNIT").into_string(),
            project: project.into(),
            flat_type,
            state: Tracked::new(UnitState {
                price,
                booked_by: None,
            }),
        }
    }

    /// Returns the generated key.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the name of the owning project.
    #[must_use]
    pub fn project(&self) -> &str {
        &self.project
    }

    /// Returns the flat type.
    #[must_use]
    pub const fn flat_type(&self) -> FlatType {
        self.flat_type
    }

    /// Returns the asking price.
    #[must_use]
    pub fn price(&self) -> i64 {
        self.state.price
    }

    /// Returns the NRIC of the applicant who booked the unit.
    #[must_use]
    pub fn booked_by(&self) -> Option<&str> {
        self.state.booked_by.as_deref()
    }

    /// Books the unit for `applicant`.
    ///
    /// # Errors
    ///
    /// Fails without changing the unit if someone else already booked it.
    pub fn book(&mut self, applicant: &str) -> CoreResult<()> {
        match self.booked_by() {
            Some(current) if current != applicant => Err(CoreError::invalid_operation(format!(
                "unit {} is already booked by {current}",
                self.id
            ))),
            _ => {
                self.state.modify().booked_by = Some(applicant.to_string());
                Ok(())
            }
        }
    }

    /// Makes the unit available again.
    pub fn release(&mut self) {
        self.state.modify().booked_by = None;
    }

    /// Matches the units of `project`.
    #[must_use]
    pub fn in_project(project: &str) -> Predicate<Self> {
        let project = project.to_string();
        Predicate::new(move |u: &Self| u.project == project)
    }

    /// Matches the units of type `flat_type`.
    #[must_use]
    pub fn of_type(flat_type: FlatType) -> Predicate<Self> {
        Predicate::new(move |u: &Self| u.flat_type == flat_type)
    }

    /// Matches units nobody has booked.
    #[must_use]
    pub fn available() -> Predicate<Self> {
        Predicate::new(|u: &Self| u.state.booked_by.is_none())
    }

    /// Matches the units booked by `nric`.
    #[must_use]
    pub fn booked_by_user(nric: &str) -> Predicate<Self> {
        let nric = nric.to_string();
        Predicate::new(move |u: &Self| u.state.booked_by.as_deref() == Some(nric.as_str()))
    }
}

impl Backup for FlatUnit {
    fn backup(&mut self) {
        self.state.backup();
    }

    fn restore(&mut self) {
        self.state.restore();
    }
}

impl Entity for FlatUnit {
    const TYPE_NAME: &'static str = "FlatUnit";

    fn key(&self) -> &str {
        &self.id
    }

    fn blank() -> Self {
        Self {
            id: String::new(),
            project: String::new(),
            flat_type: FlatType::TwoRoom,
            state: Tracked::new(UnitState {
                price: 0,
                booked_by: None,
            }),
        }
    }

    fn fields() -> Vec<FieldDescriptor<Self>> {
        vec![
            FieldDescriptor::<Self>::new(
                "id",
                0,
                TEXT,
                |u| u.id.clone().into(),
                |u, v| {
                    u.id = v.try_into()?;
                    Ok(())
                },
            ),
            FieldDescriptor::<Self>::new(
                "project",
                1,
                TEXT,
                |u| u.project.clone().into(),
                |u, v| {
                    u.project = v.try_into()?;
                    Ok(())
                },
            )
            .foreign_key::<Project>(),
            FieldDescriptor::<Self>::new(
                "flat_type",
                2,
                FLAT_TYPE,
                |u| u.flat_type.into(),
                |u, v| {
                    u.flat_type = v.try_into()?;
                    Ok(())
                },
            ),
            FieldDescriptor::<Self>::new(
                "price",
                3,
                INT,
                |u| u.state.price.into(),
                |u, v| {
                    u.state.live_mut().price = v.try_into()?;
                    Ok(())
                },
            ),
            FieldDescriptor::<Self>::new(
                "booked_by",
                4,
                TEXT,
                |u| Value::optional(u.state.booked_by.clone()),
                |u, v| {
                    u.state.live_mut().booked_by = v.into_optional()?;
                    Ok(())
                },
            )
            .nullable()
            .foreign_key::<User>(),
        ]
    }
}

impl LoadResolver for FlatUnit {
    fn resolve_load(store: &mut EntityStore) -> CoreResult<()> {
        attach_all::<Project, Self>(store, Self::project)
    }
}

impl SaveResolver for FlatUnit {
    fn resolve_save(&self, store: &mut EntityStore) -> CoreResult<()> {
        let dependent = format!("unit {}", self.id);
        require::<Project>(store, &self.project, &dependent)?;
        if let Some(nric) = self.booked_by() {
            require::<User>(store, nric, &dependent)?;
        }
        store
            .relation_mut::<ProjectUnits>()?
            .add_keys(&self.project, &self.id)?;
        Ok(())
    }
}
