//! Store construction.

use crate::collection::{Collection, Collections};
use crate::config::Config;
use crate::dir::DataDir;
use crate::entity::Entity;
use crate::error::{CoreError, CoreResult};
use crate::relation::{RelationContainer, Relations};
use crate::resolver::{DeleteResolver, LoadHook, LoadResolver, SaveResolver};
use crate::schema::Schema;
use crate::store::EntityStore;
use flatdb_codec::ConverterRegistry;
use flatdb_storage::StorageBackend;
use std::path::Path;
use tracing::info;

/// Registers entity types, relationship containers and resolvers, then opens
/// the store with a full load.
///
/// Registration errors (a bad field declaration, a resolver for a type that
/// was never registered) are held until [`StoreBuilder::open`], which reports
/// the first one.
///
/// # Example
///
/// ```rust,ignore
/// let store = StoreBuilder::in_dir(Path::new("data"), Config::default())?
///     .converters(registry)
///     .register_file::<Project>()
///     .register_file::<FlatUnit>()
///     .relation::<OneToMany<Project, FlatUnit>>()
///     .load_resolver::<FlatUnit>()
///     .delete_resolver::<Project>()
///     .open()?;
/// ```
pub struct StoreBuilder {
    config: Config,
    dir: Option<DataDir>,
    registry: ConverterRegistry,
    collections: Collections,
    relations: Relations,
    load_hooks: Vec<LoadHook>,
    deferred: Option<CoreError>,
}

impl StoreBuilder {
    /// Creates a builder with no data directory; every type must be
    /// registered with an explicit backend.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            dir: None,
            registry: ConverterRegistry::with_defaults(),
            collections: Collections::default(),
            relations: Relations::new(),
            load_hooks: Vec::new(),
            deferred: None,
        }
    }

    /// Creates a builder over the data directory at `path`, taking its lock.
    ///
    /// # Errors
    ///
    /// Fails if the directory is missing (and `create_if_missing` is off) or
    /// locked by another store.
    pub fn in_dir(path: &Path, config: Config) -> CoreResult<Self> {
        let dir = DataDir::open(path, &config)?;
        let mut builder = Self::new(config);
        builder.dir = Some(dir);
        Ok(builder)
    }

    /// Replaces the converter registry.
    #[must_use]
    pub fn converters(mut self, registry: ConverterRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Registers entity type `E` stored in `backend`.
    #[must_use]
    pub fn register<E: Entity>(mut self, backend: impl StorageBackend + 'static) -> Self {
        let registered = Schema::<E>::new()
            .and_then(|schema| self.collections.insert(Collection::new(schema, Box::new(backend))));
        self.defer(registered);
        self
    }

    /// Registers entity type `E` stored in `<dir>/<TYPE_NAME>.<ext>`.
    #[must_use]
    pub fn register_file<E: Entity>(mut self) -> Self {
        let backend = self.dir.as_ref().map(|d| d.backend_for(E::TYPE_NAME));
        if let Some(backend) = backend {
            return self.register::<E>(backend);
        }
        self.defer(Err(CoreError::invalid_operation(format!(
            "cannot register {} as a file: builder has no data directory",
            E::TYPE_NAME
        ))));
        self
    }

    /// Registers an empty relationship container of type `C`.
    #[must_use]
    pub fn relation<C: RelationContainer + Default>(mut self) -> Self {
        self.relations.register::<C>();
        self
    }

    /// Registers the load resolver of `E`. Load resolvers run in
    /// registration order.
    #[must_use]
    pub fn load_resolver<E: LoadResolver>(mut self) -> Self {
        self.load_hooks.push(E::resolve_load);
        self
    }

    /// Registers the save resolver of `E`.
    #[must_use]
    pub fn save_resolver<E: SaveResolver>(mut self) -> Self {
        let registered = self.collections.typed_mut::<E>().map(|c| {
            c.save_hook = Some(<E as SaveResolver>::resolve_save);
        });
        self.defer(registered);
        self
    }

    /// Registers the delete resolver of `E`.
    #[must_use]
    pub fn delete_resolver<E: DeleteResolver>(mut self) -> Self {
        let registered = self.collections.typed_mut::<E>().map(|c| {
            c.delete_hook = Some(<E as DeleteResolver>::resolve_delete);
        });
        self.defer(registered);
        self
    }

    fn defer(&mut self, result: CoreResult<()>) {
        if let Err(e) = result {
            self.deferred.get_or_insert(e);
        }
    }

    /// Loads every registered type, then runs the load resolvers.
    ///
    /// # Errors
    ///
    /// Any failure is fatal: an unregistered field type, a missing backing
    /// file (unless `create_if_missing`), an unparseable row, a repeated
    /// primary key, or a failing load resolver.
    pub fn open(mut self) -> CoreResult<EntityStore> {
        if let Some(e) = self.deferred.take() {
            return Err(e);
        }

        for name in self.collections.names().to_vec() {
            let collection = self.collections.erased_mut(name)?;
            collection.validate(&self.registry)?;

            if !collection.backing_exists() {
                if self.config.create_if_missing {
                    collection.create_backing()?;
                } else {
                    return Err(CoreError::MissingBackingFile {
                        entity_type: name,
                        location: collection.backend_description(),
                    });
                }
            }
        }

        let mut total = 0;
        for name in self.collections.names().to_vec() {
            total += self.collections.erased_mut(name)?.load(&self.registry)?;
        }

        let mut store = EntityStore::assemble(
            self.collections,
            self.relations,
            self.registry,
            self.load_hooks,
            self.config,
            self.dir,
        );
        store.resolve_loads()?;

        info!(
            types = store.type_names().len(),
            rows = total,
            dir = ?store.data_dir(),
            "store opened"
        );
        Ok(store)
    }
}
