//! TransformationRegistry - maps step names to their constructors

use std::collections::BTreeMap;

use tracing::debug;

use super::builtin::{IdentityTransformation, UnionTablesTransformation};
use super::{CliOption, Transformation, TransformationContext};

type Factory = fn(TransformationContext) -> Box<dyn Transformation>;

fn build<T: Transformation + 'static>(ctx: TransformationContext) -> Box<dyn Transformation> {
    Box::new(T::create(ctx))
}

/// Static metadata of a registered transformation
#[derive(Debug, Clone)]
pub struct TransformationInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub cli_options: Vec<CliOption>,
}

struct Entry {
    info: TransformationInfo,
    factory: Factory,
}

/// Known transformations, by name
pub struct TransformationRegistry {
    entries: BTreeMap<&'static str, Entry>,
}

impl TransformationRegistry {
    /// Create registry with the builtin transformations
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        registry.register::<IdentityTransformation>();
        registry.register::<UnionTablesTransformation>();
        registry
    }

    /// Create an empty registry
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Register `T` under its name, replacing any previous entry
    pub fn register<T: Transformation + 'static>(&mut self) {
        debug!(name = T::name(), "TransformationRegistry::register: called");
        self.entries.insert(
            T::name(),
            Entry {
                info: TransformationInfo {
                    name: T::name(),
                    description: T::description(),
                    cli_options: T::cli_options(),
                },
                factory: build::<T>,
            },
        );
    }

    pub fn get(&self, name: &str) -> Option<&TransformationInfo> {
        self.entries.get(name).map(|e| &e.info)
    }

    pub fn has(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&'static str> {
        self.entries.keys().copied().collect()
    }

    /// Metadata of every registered transformation, sorted by name
    pub fn infos(&self) -> impl Iterator<Item = &TransformationInfo> {
        self.entries.values().map(|e| &e.info)
    }

    /// Instantiate the transformation `name` for one run
    pub fn create(&self, name: &str, ctx: TransformationContext) -> Option<Box<dyn Transformation>> {
        debug!(%name, "TransformationRegistry::create: called");
        self.entries.get(name).map(|e| (e.factory)(ctx))
    }
}

impl Default for TransformationRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metastore::MetastoreReader;
    use crate::models::TransformationConfig;
    use crate::session::MemorySession;
    use crate::table::Table;
    use crate::transformation::ExtraOptions;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    struct Noop {
        ctx: TransformationContext,
    }

    #[async_trait]
    impl Transformation for Noop {
        fn create(ctx: TransformationContext) -> Self {
            Self { ctx }
        }

        fn name() -> &'static str {
            "Noop"
        }

        fn description() -> &'static str {
            "Does nothing"
        }

        fn cli_options() -> Vec<CliOption> {
            vec![CliOption::flag("loud", "Be loud")]
        }

        fn context(&self) -> &TransformationContext {
            &self.ctx
        }

        async fn run(
            &self,
            _metastore: &MetastoreReader,
            _info_date: NaiveDate,
            _options: &BTreeMap<String, String>,
            _extra: &ExtraOptions,
        ) -> eyre::Result<Table> {
            Ok(Table::new())
        }
    }

    fn ctx() -> TransformationContext {
        TransformationContext::new(Arc::new(MemorySession::new()), Arc::new(TransformationConfig::default()))
    }

    #[test]
    fn test_standard_registry_has_builtins() {
        let registry = TransformationRegistry::standard();
        assert!(registry.has("Identity"));
        assert!(registry.has("UnionTables"));
        assert_eq!(registry.names(), vec!["Identity", "UnionTables"]);
    }

    #[test]
    fn test_register_custom() {
        let mut registry = TransformationRegistry::empty();
        assert!(!registry.has("Noop"));

        registry.register::<Noop>();

        let info = registry.get("Noop").unwrap();
        assert_eq!(info.description, "Does nothing");
        assert_eq!(info.cli_options.len(), 1);
        assert!(info.cli_options[0].is_flag);
    }

    #[tokio::test]
    async fn test_create_and_run() {
        let mut registry = TransformationRegistry::empty();
        registry.register::<Noop>();

        let context = ctx();
        let step = registry.create("Noop", context.clone()).unwrap();
        let reader = MetastoreReader::new(
            context.session.clone(),
            context.config.clone(),
            NaiveDate::from_ymd_opt(2022, 2, 14).unwrap(),
        );

        let table = step
            .run(&reader, reader.info_date(), &BTreeMap::new(), &ExtraOptions::new())
            .await
            .unwrap();
        assert!(table.is_empty());
        assert!(registry.create("Missing", ctx()).is_none());
    }
}
