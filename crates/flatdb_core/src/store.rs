//! The entity store.

use crate::backup::Backup;
use crate::collection::{Collections, Reference};
use crate::config::Config;
use crate::dir::DataDir;
use crate::entity::Entity;
use crate::error::{CoreError, CoreResult};
use crate::query::{matches_all, Predicate};
use crate::relation::{RelationContainer, Relations, RelationshipError};
use crate::resolver::LoadHook;
use crate::transaction::{Savepoint, UnitOfWork};
use flatdb_codec::ConverterRegistry;
use std::cmp::Ordering;
use std::fmt;
use std::path::Path;
use tracing::{debug, error, warn};

/// The authoritative in-memory collections of every registered entity type.
///
/// A store is built with [`StoreBuilder`](crate::StoreBuilder), which loads
/// every backing file and runs the load resolvers before handing it out.
/// Reads return clones; the only way to change what the store holds is
/// [`EntityStore::save`] and [`EntityStore::delete`], both of which rewrite
/// the affected backing files before returning.
///
/// # Example
///
/// ```rust,ignore
/// let mut store = StoreBuilder::in_dir(path, Config::default())?
///     .register_file::<User>()
///     .open()?;
///
/// store.save(&user)?;
/// let adults = store.query_by(&[Predicate::new(|u: &User| u.age >= 21)]);
/// ```
pub struct EntityStore {
    pub(crate) collections: Collections,
    pub(crate) relations: Relations,
    pub(crate) registry: ConverterRegistry,
    pub(crate) load_hooks: Vec<LoadHook>,
    pub(crate) config: Config,
    pub(crate) dir: Option<DataDir>,
    uow: UnitOfWork,
    needs_reload: bool,
}

impl EntityStore {
    pub(crate) fn assemble(
        collections: Collections,
        relations: Relations,
        registry: ConverterRegistry,
        load_hooks: Vec<LoadHook>,
        config: Config,
        dir: Option<DataDir>,
    ) -> Self {
        Self {
            collections,
            relations,
            registry,
            load_hooks,
            config,
            dir,
            uow: UnitOfWork::default(),
            needs_reload: false,
        }
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Returns every entity of type `E` in primary-key order.
    ///
    /// Returns an empty list if `E` is not registered.
    #[must_use]
    pub fn get_all<E: Entity>(&self) -> Vec<E> {
        self.collections
            .typed::<E>()
            .map(|c| c.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns every entity of type `E`, ordered by `compare`.
    #[must_use]
    pub fn get_all_sorted_by<E, F>(&self, compare: F) -> Vec<E>
    where
        E: Entity,
        F: FnMut(&E, &E) -> Ordering,
    {
        let mut all = self.get_all::<E>();
        all.sort_by(compare);
        all
    }

    /// Returns the entity of type `E` with primary key `key`.
    #[must_use]
    pub fn get_by_key<E: Entity>(&self, key: &str) -> Option<E> {
        self.collections
            .typed::<E>()
            .and_then(|c| c.get(key))
            .cloned()
    }

    /// Returns whether an entity of type `E` with `key` exists.
    #[must_use]
    pub fn contains<E: Entity>(&self, key: &str) -> bool {
        self.collections
            .typed::<E>()
            .is_some_and(|c| c.contains(key))
    }

    /// Returns the entities matching every predicate, in key order.
    ///
    /// An empty predicate list returns all entities.
    #[must_use]
    pub fn query_by<E: Entity>(&self, predicates: &[Predicate<E>]) -> Vec<E> {
        self.collections
            .typed::<E>()
            .map(|c| {
                c.iter()
                    .filter(|e| matches_all(predicates, e))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Returns the entities matching every predicate, ordered by `compare`.
    #[must_use]
    pub fn query_sorted_by<E, F>(&self, predicates: &[Predicate<E>], compare: F) -> Vec<E>
    where
        E: Entity,
        F: FnMut(&E, &E) -> Ordering,
    {
        let mut matched = self.query_by(predicates);
        matched.sort_by(compare);
        matched
    }

    /// Counts the entities matching every predicate without cloning them.
    #[must_use]
    pub fn count_by<E: Entity>(&self, predicates: &[Predicate<E>]) -> usize {
        self.collections
            .typed::<E>()
            .map_or(0, |c| c.iter().filter(|e| matches_all(predicates, e)).count())
    }

    /// Returns the number of entities of type `E`.
    #[must_use]
    pub fn len<E: Entity>(&self) -> usize {
        self.collections.typed::<E>().map_or(0, |c| c.len())
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Inserts or replaces `entity`, runs its save resolver, and rewrites the
    /// backing file of every type touched.
    ///
    /// # Errors
    ///
    /// On any failure of the resolver cascade or of a file rewrite, every
    /// in-memory change made by this call is undone, any file already
    /// rewritten is rewritten back, and [`CoreError::Save`] is returned. The
    /// caller should then `restore()` the entity it mutated, or use
    /// [`EntityStore::save_or_restore`].
    ///
    /// Refused while [`EntityStore::needs_reload`] is set.
    pub fn save<E: Entity>(&mut self, entity: &E) -> CoreResult<()> {
        self.check_consistent()?;
        let savepoint = self.uow.begin();
        let result = self.stage_save(entity);
        self.conclude(savepoint, result, E::TYPE_NAME, entity.key())
    }

    /// Saves `entity`, restoring its snapshot if the save fails.
    pub fn save_or_restore<E: Entity + Backup>(&mut self, entity: &mut E) -> CoreResult<()> {
        let result = self.save(&*entity);
        if result.is_err() {
            entity.restore();
        }
        result
    }

    /// Runs the delete resolver of `entity`, removes it, and rewrites the
    /// backing file of every type touched.
    ///
    /// The resolver runs first, so a cascade failure leaves the entity and
    /// its dependents untouched. Returns `Ok(false)` if no entity with that
    /// key is stored.
    ///
    /// # Errors
    ///
    /// Same rollback guarantees as [`EntityStore::save`].
    pub fn delete<E: Entity>(&mut self, entity: &E) -> CoreResult<bool> {
        self.check_consistent()?;
        let savepoint = self.uow.begin();
        let result = self.stage_delete(entity);
        let removed = matches!(result, Ok(true));
        self.conclude(savepoint, result.map(|_| ()), E::TYPE_NAME, entity.key())?;
        Ok(removed)
    }

    /// Returns whether a rollback could not be completed.
    ///
    /// Set when relationship containers could not be rebuilt, or a backing
    /// file could not be rewritten back, after a failed save or delete. Writes
    /// are refused until [`EntityStore::reload`] succeeds.
    #[must_use]
    pub fn needs_reload(&self) -> bool {
        self.needs_reload
    }

    fn check_consistent(&self) -> CoreResult<()> {
        if self.needs_reload && !self.uow.is_open() {
            return Err(CoreError::invalid_operation(
                "an earlier rollback was incomplete; reload the store before writing",
            ));
        }
        Ok(())
    }

    fn stage_save<E: Entity>(&mut self, entity: &E) -> CoreResult<()> {
        if entity.key().is_empty() {
            return Err(CoreError::invalid_operation(format!(
                "{} has an empty primary key",
                E::TYPE_NAME
            )));
        }

        let collection = self.collections.typed_mut::<E>()?;
        let previous = collection.insert(entity.clone());
        let hook = collection.save_hook;
        self.uow.record::<E>(entity.key().to_string(), previous);
        debug!(entity_type = E::TYPE_NAME, key = entity.key(), "staged save");

        // A resolver that re-saves an entity already being saved higher up
        // the stack stages it again but does not re-run the resolver.
        if let Some(hook) = hook {
            if self.uow.enter(E::TYPE_NAME, entity.key()) {
                let result = hook(entity, self);
                self.uow.leave();
                result?;
            }
        }

        self.uow.mark_dirty(E::TYPE_NAME);
        Ok(())
    }

    fn stage_delete<E: Entity>(&mut self, entity: &E) -> CoreResult<bool> {
        let collection = self.collections.typed_mut::<E>()?;
        let Some(stored) = collection.get(entity.key()).cloned() else {
            return Ok(false);
        };
        let hook = collection.delete_hook;

        if let Some(hook) = hook {
            hook(&stored, self)?;
        }

        let previous = self.collections.typed_mut::<E>()?.remove(stored.key());
        self.uow.record::<E>(stored.key().to_string(), previous);
        self.relations.forget(E::TYPE_NAME, stored.key());
        self.uow.mark_dirty(E::TYPE_NAME);
        debug!(entity_type = E::TYPE_NAME, key = stored.key(), "staged delete");
        Ok(true)
    }

    fn conclude(
        &mut self,
        savepoint: Savepoint,
        result: CoreResult<()>,
        entity_type: &'static str,
        key: &str,
    ) -> CoreResult<()> {
        self.uow.end();
        match result {
            Err(e) => {
                self.uow.rollback_to(savepoint, &mut self.collections);
                self.rebuild_relations();
                if savepoint.outermost {
                    warn!(entity_type, key, error = %e, "rolled back");
                    self.uow.clear();
                    Err(CoreError::save(entity_type, key, e))
                } else {
                    Err(e)
                }
            }
            Ok(()) if !savepoint.outermost => Ok(()),
            Ok(()) => self.commit(entity_type, key),
        }
    }

    /// Rewrites the backing file of every dirty type.
    fn commit(&mut self, entity_type: &'static str, key: &str) -> CoreResult<()> {
        let dirty = self.uow.dirty();
        let mut flushed = Vec::with_capacity(dirty.len());

        for name in dirty {
            let registry = &self.registry;
            let outcome = self
                .collections
                .erased_mut(name)
                .and_then(|c| c.persist(registry));

            if let Err(e) = outcome {
                warn!(entity_type, key, failed = name, error = %e, "rewrite failed, rolling back");
                self.uow.rollback_to(Savepoint::root(), &mut self.collections);
                self.uow.clear();
                for done in flushed {
                    let registry = &self.registry;
                    let restored = self
                        .collections
                        .erased_mut(done)
                        .and_then(|c| c.persist(registry));
                    if let Err(re) = restored {
                        error!(entity_type = done, error = %re, "could not rewrite backing file during rollback");
                        self.needs_reload = true;
                    }
                }
                self.rebuild_relations();
                return Err(CoreError::save(entity_type, key, e));
            }
            flushed.push(name);
        }

        self.uow.clear();
        debug!(entity_type, key, files = flushed.len(), "committed");
        Ok(())
    }

    /// Rebuilds the relationship containers after a rollback. A failure
    /// leaves them partial, so the store is marked as needing a reload.
    fn rebuild_relations(&mut self) {
        if let Err(e) = self.resolve_loads() {
            error!(error = %e, "load resolver failed while rebuilding relations");
            self.needs_reload = true;
        }
    }

    /// Runs every load resolver from empty relationship containers.
    pub(crate) fn resolve_loads(&mut self) -> CoreResult<()> {
        self.relations.clear_all();
        let hooks = self.load_hooks.clone();
        for hook in hooks {
            hook(self)?;
        }
        Ok(())
    }

    /// Discards the in-memory state and loads every backing file again.
    ///
    /// # Errors
    ///
    /// Fails if called from inside a resolver, or if any file fails to load;
    /// the store should not be used after a failed reload.
    pub fn reload(&mut self) -> CoreResult<()> {
        if self.uow.is_open() {
            return Err(CoreError::invalid_operation(
                "reload is not allowed during a save or delete",
            ));
        }
        let names: Vec<&'static str> = self.collections.names().to_vec();
        for name in names {
            let registry = &self.registry;
            self.collections.erased_mut(name)?.load(registry)?;
        }
        self.resolve_loads()?;
        self.needs_reload = false;
        Ok(())
    }

    // ========================================================================
    // Relations
    // ========================================================================

    /// Returns the relationship container of type `C`.
    #[must_use]
    pub fn relation<C: RelationContainer>(&self) -> Option<&C> {
        self.relations.get::<C>()
    }

    /// Returns the relationship container of type `C` for mutation.
    ///
    /// Intended for resolvers; containers are otherwise derived state.
    pub fn relation_mut<C: RelationContainer>(&mut self) -> CoreResult<&mut C> {
        self.relations.get_mut::<C>()
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    /// Returns the registered type names in registration order.
    #[must_use]
    pub fn type_names(&self) -> Vec<&'static str> {
        self.collections.names().to_vec()
    }

    /// Returns the number of entities of the named type.
    pub fn row_count(&self, type_name: &str) -> CoreResult<usize> {
        Ok(self.collections.erased(type_name)?.len())
    }

    /// Returns the field names of the named type in storage order.
    pub fn field_names(&self, type_name: &str) -> CoreResult<Vec<&'static str>> {
        Ok(self.collections.erased(type_name)?.field_names())
    }

    /// Returns every entity of the named type as `(field, raw value)` rows.
    pub fn named_rows(&self, type_name: &str) -> CoreResult<Vec<Vec<(&'static str, String)>>> {
        self.collections.erased(type_name)?.named_rows(&self.registry)
    }

    /// Describes where the named type is stored.
    pub fn backing_location(&self, type_name: &str) -> CoreResult<String> {
        Ok(self.collections.erased(type_name)?.backend_description())
    }

    /// Returns every foreign key naming an entity that is not stored.
    ///
    /// References to unregistered types are not checked.
    #[must_use]
    pub fn dangling_references(&self) -> Vec<RelationshipError> {
        let mut dangling = Vec::new();
        for collection in self.collections.iter() {
            for Reference {
                key,
                field,
                target_type,
                target_key,
            } in collection.references()
            {
                let Ok(target) = self.collections.erased(target_type) else {
                    continue;
                };
                if !target.contains_key(&target_key) {
                    dangling.push(RelationshipError::DanglingReference {
                        entity_type: collection.type_name(),
                        key,
                        field,
                        target_type,
                        target_key,
                    });
                }
            }
        }
        dangling
    }

    /// Returns the summary of every relationship container.
    #[must_use]
    pub fn relation_summary(&self) -> Vec<(String, usize)> {
        self.relations.summary()
    }

    /// Returns the converter registry.
    #[must_use]
    pub fn registry(&self) -> &ConverterRegistry {
        &self.registry
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the data directory, if the store is file-backed.
    #[must_use]
    pub fn data_dir(&self) -> Option<&Path> {
        self.dir.as_ref().map(DataDir::path)
    }
}

impl fmt::Debug for EntityStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: Vec<(&str, usize)> = self
            .collections
            .iter()
            .map(|c| (c.type_name(), c.len()))
            .collect();
        f.debug_struct("EntityStore")
            .field("collections", &counts)
            .field("relations", &self.relations)
            .field("data_dir", &self.data_dir())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::Tracked;
    use crate::relation::OneToMany;
    use crate::resolver::{DeleteResolver, LoadResolver, SaveResolver};
    use crate::schema::FieldDescriptor;
    use crate::StoreBuilder;
    use flatdb_codec::{INT, TEXT};
    use flatdb_storage::{InMemoryBackend, StorageBackend, StorageError, StorageResult};
    use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
    use std::sync::Arc;

    #[derive(Debug, Clone, PartialEq)]
    struct TeamState {
        city: String,
        wins: i64,
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Team {
        name: String,
        state: Tracked<TeamState>,
    }

    impl Team {
        fn new(name: &str, city: &str) -> Self {
            Self {
                name: name.to_string(),
                state: Tracked::new(TeamState {
                    city: city.to_string(),
                    wins: 0,
                }),
            }
        }

        fn record_win(&mut self) {
            self.state.modify().wins += 1;
        }
    }

    impl Backup for Team {
        fn backup(&mut self) {
            self.state.backup();
        }

        fn restore(&mut self) {
            self.state.restore();
        }
    }

    impl Entity for Team {
        const TYPE_NAME: &'static str = "Team";

        fn key(&self) -> &str {
            &self.name
        }

        fn blank() -> Self {
            Self::new("", "")
        }

        fn fields() -> Vec<FieldDescriptor<Self>> {
            vec![
                FieldDescriptor::<Self>::new(
                    "name",
                    0,
                    TEXT,
                    |t| t.name.clone().into(),
                    |t, v| {
                        t.name = v.try_into()?;
                        Ok(())
                    },
                ),
                FieldDescriptor::<Self>::new(
                    "city",
                    1,
                    TEXT,
                    |t| t.state.city.clone().into(),
                    |t, v| {
                        t.state.live_mut().city = v.try_into()?;
                        Ok(())
                    },
                ),
                FieldDescriptor::<Self>::new(
                    "wins",
                    2,
                    INT,
                    |t| t.state.wins.into(),
                    |t, v| {
                        t.state.live_mut().wins = v.try_into()?;
                        Ok(())
                    },
                ),
            ]
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Player {
        id: String,
        team: String,
        number: i64,
    }

    impl Player {
        fn new(id: &str, team: &str, number: i64) -> Self {
            Self {
                id: id.to_string(),
                team: team.to_string(),
                number,
            }
        }
    }

    impl Entity for Player {
        const TYPE_NAME: &'static str = "Player";

        fn key(&self) -> &str {
            &self.id
        }

        fn blank() -> Self {
            Self::new("", "", 0)
        }

        fn fields() -> Vec<FieldDescriptor<Self>> {
            vec![
                FieldDescriptor::<Self>::new(
                    "id",
                    0,
                    TEXT,
                    |p| p.id.clone().into(),
                    |p, v| {
                        p.id = v.try_into()?;
                        Ok(())
                    },
                ),
                FieldDescriptor::<Self>::new(
                    "team",
                    1,
                    TEXT,
                    |p| p.team.clone().into(),
                    |p, v| {
                        p.team = v.try_into()?;
                        Ok(())
                    },
                )
                .foreign_key::<Team>(),
                FieldDescriptor::<Self>::new(
                    "number",
                    2,
                    INT,
                    |p| p.number.into(),
                    |p, v| {
                        p.number = v.try_into()?;
                        Ok(())
                    },
                ),
            ]
        }
    }

    type Roster = OneToMany<Team, Player>;

    impl LoadResolver for Player {
        fn resolve_load(store: &mut EntityStore) -> CoreResult<()> {
            for player in store.get_all::<Player>() {
                if store.contains::<Team>(&player.team) {
                    store
                        .relation_mut::<Roster>()?
                        .add_keys(&player.team, &player.id)?;
                }
            }
            Ok(())
        }
    }

    impl SaveResolver for Player {
        fn resolve_save(&self, store: &mut EntityStore) -> CoreResult<()> {
            let team = store.get_by_key::<Team>(&self.team).ok_or_else(|| {
                RelationshipError::cascade(format!("player {} has no team {}", self.id, self.team))
            })?;
            store.relation_mut::<Roster>()?.add_keys(&team.name, &self.id)?;
            store.save(&team)
        }
    }

    impl DeleteResolver for Team {
        fn resolve_delete(&self, store: &mut EntityStore) -> CoreResult<()> {
            let keys: Vec<String> = store
                .relation::<Roster>()
                .map(|r| r.children_of(&self.name).iter().map(ToString::to_string).collect())
                .unwrap_or_default();
            for key in keys {
                if let Some(player) = store.get_by_key::<Player>(&key) {
                    store.delete(&player)?;
                }
            }
            Ok(())
        }
    }

    /// In-memory backend whose writes can be switched to fail.
    #[derive(Clone, Default)]
    struct Flaky {
        inner: InMemoryBackend,
        fail: Arc<AtomicBool>,
    }

    impl Flaky {
        fn with_data(data: &str) -> Self {
            Self {
                inner: InMemoryBackend::with_data(data.as_bytes().to_vec()),
                fail: Arc::default(),
            }
        }

        fn fail_writes(&self, fail: bool) {
            self.fail.store(fail, AtomicOrdering::SeqCst);
        }
    }

    impl StorageBackend for Flaky {
        fn describe(&self) -> String {
            self.inner.describe()
        }

        fn exists(&self) -> bool {
            self.inner.exists()
        }

        fn create_empty(&mut self) -> StorageResult<()> {
            self.inner.create_empty()
        }

        fn read_all(&self) -> StorageResult<Vec<u8>> {
            self.inner.read_all()
        }

        fn replace(&mut self, data: &[u8]) -> StorageResult<()> {
            if self.fail.load(AtomicOrdering::SeqCst) {
                return Err(StorageError::write_rejected(self.describe(), "injected failure"));
            }
            self.inner.replace(data)
        }
    }

    struct Fixture {
        store: EntityStore,
        teams: Flaky,
        players: Flaky,
    }

    fn fixture(teams: &str, players: &str) -> Fixture {
        let teams = Flaky::with_data(teams);
        let players = Flaky::with_data(players);
        let store = StoreBuilder::new(Config::default())
            .register::<Team>(teams.clone())
            .register::<Player>(players.clone())
            .relation::<Roster>()
            .load_resolver::<Player>()
            .save_resolver::<Player>()
            .delete_resolver::<Team>()
            .open()
            .unwrap();
        Fixture {
            store,
            teams,
            players,
        }
    }

    fn seeded() -> Fixture {
        fixture(
            "Lions,Leeds,3\nOwls,Oxford,1\n",
            "p1,Lions,9\np2,Lions,4\np3,Owls,7\n",
        )
    }

    #[test]
    fn open_loads_rows_and_relations() {
        let fx = seeded();
        assert_eq!(fx.store.len::<Team>(), 2);
        assert_eq!(fx.store.len::<Player>(), 3);

        let roster = fx.store.relation::<Roster>().unwrap();
        assert_eq!(roster.children_of("Lions"), vec!["p1", "p2"]);
        assert_eq!(roster.owner_of("p3"), Some("Owls"));
    }

    #[test]
    fn queries() {
        let fx = seeded();
        let lions = Predicate::new(|p: &Player| p.team == "Lions");

        assert_eq!(fx.store.count_by(&[lions]), 2);
        assert_eq!(fx.store.count_by::<Player>(&[]), 3);

        let by_number = fx
            .store
            .get_all_sorted_by::<Player, _>(|a, b| a.number.cmp(&b.number));
        let ids: Vec<&str> = by_number.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["p2", "p3", "p1"]);

        let high = fx.store.query_sorted_by(
            &[Predicate::new(|p: &Player| p.number > 5)],
            |a: &Player, b: &Player| b.number.cmp(&a.number),
        );
        assert_eq!(high.len(), 2);
        assert_eq!(high[0].id, "p1");

        assert!(fx.store.contains::<Team>("Owls"));
        assert!(fx.store.get_by_key::<Team>("Eagles").is_none());
    }

    #[test]
    fn save_runs_resolver_and_rewrites_files() {
        let mut fx = seeded();
        fx.store.save(&Player::new("p4", "Owls", 11)).unwrap();

        assert_eq!(
            fx.players.inner.text(),
            "p1,Lions,9\np2,Lions,4\np3,Owls,7\np4,Owls,11\n"
        );
        assert_eq!(
            fx.store.relation::<Roster>().unwrap().owner_of("p4"),
            Some("Owls")
        );
    }

    #[test]
    fn save_replaces_existing_key() {
        let mut fx = seeded();
        fx.store.save(&Player::new("p1", "Lions", 10)).unwrap();

        assert_eq!(fx.store.len::<Player>(), 3);
        assert_eq!(fx.store.get_by_key::<Player>("p1").unwrap().number, 10);
    }

    #[test]
    fn failed_rewrite_of_resaved_owner_rolls_back_everything() {
        let mut fx = seeded();
        let teams_before = fx.teams.inner.text();
        let players_before = fx.players.inner.text();

        fx.teams.fail_writes(true);
        let err = fx.store.save(&Player::new("p4", "Owls", 11)).unwrap_err();

        assert!(err.is_save());
        assert!(matches!(err.root(), CoreError::Storage(_)));
        assert!(!fx.store.contains::<Player>("p4"));
        assert_eq!(fx.store.relation::<Roster>().unwrap().owner_of("p4"), None);
        assert_eq!(fx.teams.inner.text(), teams_before);
        assert_eq!(fx.players.inner.text(), players_before);
    }

    #[test]
    fn failed_resolver_leaves_store_untouched() {
        let mut fx = seeded();
        let err = fx
            .store
            .save(&Player::new("p9", "Nowhere", 1))
            .unwrap_err();

        assert!(matches!(
            err.root(),
            CoreError::Relationship(RelationshipError::Cascade { .. })
        ));
        assert!(!fx.store.contains::<Player>("p9"));
    }

    #[test]
    fn save_or_restore_reverts_mutation() {
        let mut fx = seeded();
        let mut lions = fx.store.get_by_key::<Team>("Lions").unwrap();
        lions.record_win();
        assert_eq!(lions.state.wins, 4);

        fx.teams.fail_writes(true);
        assert!(fx.store.save_or_restore(&mut lions).is_err());

        assert_eq!(lions.state.wins, 3);
        assert_eq!(fx.store.get_by_key::<Team>("Lions").unwrap(), lions);
    }

    #[test]
    fn delete_cascades_to_dependents() {
        let mut fx = seeded();
        let lions = fx.store.get_by_key::<Team>("Lions").unwrap();

        assert!(fx.store.delete(&lions).unwrap());

        assert!(fx.store.get_by_key::<Team>("Lions").is_none());
        assert_eq!(fx.store.len::<Player>(), 1);
        assert_eq!(fx.players.inner.text(), "p3,Owls,7\n");
        assert_eq!(fx.teams.inner.text(), "Owls,Oxford,1\n");
        assert!(fx.store.relation::<Roster>().unwrap().children_of("Lions").is_empty());
    }

    #[test]
    fn failed_cascade_keeps_owner_and_dependents() {
        let mut fx = seeded();
        let lions = fx.store.get_by_key::<Team>("Lions").unwrap();

        fx.players.fail_writes(true);
        assert!(fx.store.delete(&lions).is_err());

        assert!(fx.store.contains::<Team>("Lions"));
        assert_eq!(fx.store.len::<Player>(), 3);
        assert_eq!(
            fx.store.relation::<Roster>().unwrap().children_of("Lions"),
            vec!["p1", "p2"]
        );
    }

    #[test]
    fn failed_owner_rewrite_restores_flushed_dependents() {
        let mut fx = seeded();
        let lions = fx.store.get_by_key::<Team>("Lions").unwrap();
        let players_before = fx.players.inner.text();

        // Players are flushed first and succeed; the team file then fails.
        fx.teams.fail_writes(true);
        assert!(fx.store.delete(&lions).is_err());

        assert_eq!(fx.players.inner.text(), players_before);
        assert_eq!(fx.store.len::<Player>(), 3);
    }

    #[test]
    fn delete_absent_is_noop() {
        let mut fx = seeded();
        fx.teams.fail_writes(true);
        assert!(!fx.store.delete(&Team::new("Eagles", "Exeter")).unwrap());
    }

    #[test]
    fn empty_key_is_rejected() {
        let mut fx = seeded();
        let err = fx.store.save(&Team::new("", "Nowhere")).unwrap_err();
        assert!(matches!(err.root(), CoreError::InvalidOperation { .. }));
        assert_eq!(fx.store.len::<Team>(), 2);
    }

    #[test]
    fn dangling_references_are_reported() {
        let fx = fixture("Lions,Leeds,0\n", "p1,Lions,1\np2,Ghosts,2\n");
        let dangling = fx.store.dangling_references();
        assert_eq!(dangling.len(), 1);
        assert!(matches!(
            &dangling[0],
            RelationshipError::DanglingReference { target_key, .. } if target_key == "Ghosts"
        ));
    }

    #[test]
    fn reload_picks_up_file_changes() {
        let mut fx = seeded();
        let mut writer = fx.players.inner.clone();
        writer.replace(b"p1,Owls,9\n").unwrap();

        fx.store.reload().unwrap();

        assert_eq!(fx.store.len::<Player>(), 1);
        assert_eq!(
            fx.store.relation::<Roster>().unwrap().children_of("Owls"),
            vec!["p1"]
        );
    }

    static COACH_LOADS_FAIL: AtomicBool = AtomicBool::new(false);

    #[derive(Debug, Clone, PartialEq)]
    struct Coach {
        id: String,
    }

    impl Entity for Coach {
        const TYPE_NAME: &'static str = "Coach";

        fn key(&self) -> &str {
            &self.id
        }

        fn blank() -> Self {
            Self { id: String::new() }
        }

        fn fields() -> Vec<FieldDescriptor<Self>> {
            vec![FieldDescriptor::<Self>::new(
                "id",
                0,
                TEXT,
                |c| c.id.clone().into(),
                |c, v| {
                    c.id = v.try_into()?;
                    Ok(())
                },
            )]
        }
    }

    impl LoadResolver for Coach {
        fn resolve_load(_store: &mut EntityStore) -> CoreResult<()> {
            if COACH_LOADS_FAIL.load(AtomicOrdering::SeqCst) {
                return Err(CoreError::invalid_operation("coach index unavailable"));
            }
            Ok(())
        }
    }

    #[test]
    fn incomplete_rollback_blocks_writes_until_reload() {
        let teams = Flaky::with_data("Lions,Leeds,3\n");
        let players = Flaky::with_data("p1,Lions,9\n");
        let mut store = StoreBuilder::new(Config::default())
            .register::<Team>(teams.clone())
            .register::<Player>(players.clone())
            .register::<Coach>(InMemoryBackend::new())
            .relation::<Roster>()
            .load_resolver::<Player>()
            .load_resolver::<Coach>()
            .save_resolver::<Player>()
            .open()
            .unwrap();
        assert!(!store.needs_reload());

        COACH_LOADS_FAIL.store(true, AtomicOrdering::SeqCst);
        teams.fail_writes(true);
        assert!(store.save(&Player::new("p2", "Lions", 4)).unwrap_err().is_save());
        assert!(store.needs_reload());

        teams.fail_writes(false);
        let err = store.save(&Player::new("p2", "Lions", 4)).unwrap_err();
        assert!(matches!(err, CoreError::InvalidOperation { .. }));
        assert!(!store.contains::<Player>("p2"));

        COACH_LOADS_FAIL.store(false, AtomicOrdering::SeqCst);
        store.reload().unwrap();
        assert!(!store.needs_reload());
        assert_eq!(store.relation::<Roster>().unwrap().children_of("Lions"), vec!["p1"]);
        store.save(&Player::new("p2", "Lions", 4)).unwrap();
        assert_eq!(players.inner.text(), "p1,Lions,9\np2,Lions,4\n");
    }

    #[test]
    fn introspection_by_name() {
        let fx = seeded();
        assert_eq!(fx.store.type_names(), vec!["Team", "Player"]);
        assert_eq!(fx.store.row_count("Player").unwrap(), 3);
        assert_eq!(
            fx.store.field_names("Team").unwrap(),
            vec!["name", "city", "wins"]
        );
        let rows = fx.store.named_rows("Team").unwrap();
        assert_eq!(rows[0][1], ("city", "Leeds".to_string()));
        assert!(matches!(
            fx.store.row_count("Coach"),
            Err(CoreError::UnknownEntityType { .. })
        ));
    }
}
