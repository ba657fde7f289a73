//! Relationship containers of the housing schema and helpers shared by the
//! resolvers.

use crate::{Application, Enquiry, FlatUnit, Project, Registration, User};
use flatdb_core::{CoreResult, Entity, EntityStore, OneToMany, OneToOne, RelationshipError};

/// Flat units offered by a project.
pub type ProjectUnits = OneToMany<Project, FlatUnit>;

/// Applications made to a project.
pub type ProjectApplications = OneToMany<Project, Application>;

/// Officer registrations to a project.
pub type ProjectRegistrations = OneToMany<Project, Registration>;

/// Enquiries about a project.
pub type ProjectEnquiries = OneToMany<Project, Enquiry>;

/// The single active application of an applicant.
pub type UserApplication = OneToOne<User, Application>;

/// Looks up the `T` that `dependent` refers to, failing the cascade if it
/// does not exist.
pub(crate) fn require<T: Entity>(
    store: &EntityStore,
    key: &str,
    dependent: &str,
) -> CoreResult<T> {
    store.get_by_key::<T>(key).ok_or_else(|| {
        RelationshipError::cascade(format!("{dependent} refers to missing {} {key}", T::TYPE_NAME))
            .into()
    })
}

/// Keys of the `V`s owned by `owner`, in key order.
pub(crate) fn child_keys<U: Entity, V: Entity>(store: &EntityStore, owner: &str) -> Vec<String> {
    store
        .relation::<OneToMany<U, V>>()
        .map(|r| r.children_of(owner).into_iter().map(str::to_string).collect())
        .unwrap_or_default()
}

/// Deletes every `V` with one of `keys`, stopping at the first failure.
pub(crate) fn delete_keys<V: Entity>(store: &mut EntityStore, keys: &[String]) -> CoreResult<()> {
    for key in keys {
        if let Some(entity) = store.get_by_key::<V>(key) {
            store.delete(&entity)?;
        }
    }
    Ok(())
}

/// Attaches every `V` to its owning `U` as named by `owner_of`, skipping
/// children whose owner is not stored.
pub(crate) fn attach_all<U: Entity, V: Entity>(
    store: &mut EntityStore,
    owner_of: fn(&V) -> &str,
) -> CoreResult<()> {
    for child in store.get_all::<V>() {
        let owner = owner_of(&child);
        if store.contains::<U>(owner) {
            store
                .relation_mut::<OneToMany<U, V>>()?
                .add_keys(owner, child.key())?;
        }
    }
    Ok(())
}
