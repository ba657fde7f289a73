//! Enquiries about a project and their replies.

use crate::relations::{attach_all, require, ProjectEnquiries};
use crate::{Project, User};
use flatdb_core::codec::{Value, TEXT};
use flatdb_core::{
    Backup, CoreError, CoreResult, Entity, EntityKey, EntityStore, FieldDescriptor, LoadResolver,
    Predicate, SaveResolver, Tracked,
};

/// Fields of an enquiry that change after it is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnquiryState {
    /// The question asked.
    pub message: String,
    /// The answer, once given.
    pub reply: Option<String>,
}

/// A question from a user about a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enquiry {
    id: String,
    author: String,
    project: String,
    state: Tracked<EnquiryState>,
}

impl Enquiry {
    /// Creates an unanswered enquiry with a generated key.
    #[must_use]
    pub fn new(
        author: impl Into<String>,
        project: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: EntityKey::generate_prefixed("ENQ").into_string(),
            author: author.into(),
            project: project.into(),
            state: Tracked::new(EnquiryState {
                message: message.into(),
                reply: None,
            }),
        }
    }

    /// Returns the generated key.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the NRIC of the author.
    #[must_use]
    pub fn author(&self) -> &str {
        &self.author
    }

    /// Returns the name of the project asked about.
    #[must_use]
    pub fn project(&self) -> &str {
        &self.project
    }

    /// Returns the question.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.state.message
    }

    /// Returns the answer, if any.
    #[must_use]
    pub fn reply_text(&self) -> Option<&str> {
        self.state.reply.as_deref()
    }

    /// Rewrites the question.
    ///
    /// # Errors
    ///
    /// An answered enquiry can no longer be edited.
    pub fn edit_message(&mut self, message: impl Into<String>) -> CoreResult<()> {
        if self.state.reply.is_some() {
            return Err(CoreError::invalid_operation(format!(
                "enquiry {} has already been answered",
                self.id
            )));
        }
        self.state.modify().message = message.into();
        Ok(())
    }

    /// Answers the enquiry, replacing any earlier answer.
    ///
    /// # Errors
    ///
    /// A blank answer is refused and the enquiry stays unchanged.
    pub fn reply(&mut self, reply: impl Into<String>) -> CoreResult<()> {
        let reply = reply.into();
        if reply.trim().is_empty() {
            return Err(CoreError::invalid_operation(format!(
                "reply to enquiry {} is blank",
                self.id
            )));
        }
        self.state.modify().reply = Some(reply);
        Ok(())
    }

    /// Matches the enquiries written by `nric`.
    #[must_use]
    pub fn by_author(nric: &str) -> Predicate<Self> {
        let nric = nric.to_string();
        Predicate::new(move |e: &Self| e.author == nric)
    }

    /// Matches enquiries nobody has answered.
    #[must_use]
    pub fn unanswered() -> Predicate<Self> {
        Predicate::new(|e: &Self| e.state.reply.is_none())
    }
}

impl Backup for Enquiry {
    fn backup(&mut self) {
        self.state.backup();
    }

    fn restore(&mut self) {
        self.state.restore();
    }
}

impl Entity for Enquiry {
    const TYPE_NAME: &'static str = "Enquiry";

    fn key(&self) -> &str {
        &self.id
    }

    fn blank() -> Self {
        Self {
            id: String::new(),
            author: String::new(),
            project: String::new(),
            state: Tracked::new(EnquiryState {
                message: String::new(),
                reply: None,
            }),
        }
    }

    fn fields() -> Vec<FieldDescriptor<Self>> {
        vec![
            FieldDescriptor::<Self>::new(
                "id",
                0,
                TEXT,
                |e| e.id.clone().into(),
                |e, v| {
                    e.id = v.try_into()?;
                    Ok(())
                },
            ),
            FieldDescriptor::<Self>::new(
                "author",
                1,
                TEXT,
                |e| e.author.clone().into(),
                |e, v| {
                    e.author = v.try_into()?;
                    Ok(())
                },
            )
            .foreign_key::<User>(),
            FieldDescriptor::<Self>::new(
                "project",
                2,
                TEXT,
                |e| e.project.clone().into(),
                |e, v| {
                    e.project = v.try_into()?;
                    Ok(())
                },
            )
            .foreign_key::<Project>(),
            FieldDescriptor::<Self>::new(
                "message",
                3,
                TEXT,
                |e| e.state.message.clone().into(),
                |e, v| {
                    e.state.live_mut().message = v.try_into()?;
                    Ok(())
                },
            ),
            FieldDescriptor::<Self>::new(
                "reply",
                4,
                TEXT,
                |e| Value::optional(e.state.reply.clone()),
                |e, v| {
                    e.state.live_mut().reply = v.into_optional()?;
                    Ok(())
                },
            )
            .nullable(),
        ]
    }
}

impl LoadResolver for Enquiry {
    fn resolve_load(store: &mut EntityStore) -> CoreResult<()> {
        attach_all::<Project, Self>(store, Self::project)
    }
}

impl SaveResolver for Enquiry {
    fn resolve_save(&self, store: &mut EntityStore) -> CoreResult<()> {
        let dependent = format!("enquiry {}", self.id);
        require::<Project>(store, &self.project, &dependent)?;
        require::<User>(store, &self.author, &dependent)?;
        store
            .relation_mut::<ProjectEnquiries>()?
            .add_keys(&self.project, &self.id)?;
        Ok(())
    }
}
