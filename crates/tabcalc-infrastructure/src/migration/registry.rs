//! Migration registry: the ordered table of schema steps.

use super::traits::MigrationStep;
use semver::Version;
use std::sync::Arc;

/// Ordered, linear chain of migration steps.
///
/// Steps must form a continuous chain: 1.0.0 → 1.1.0 → 2.0.0 → ...
///
/// # Example
///
/// ```ignore
/// let mut registry = MigrationRegistry::new(Version::new(1, 1, 0));
/// registry.register(Arc::new(FlatToSessionedMigration));  // 1.0.0 → 1.1.0
///
/// for step in registry.pending(&Version::new(1, 0, 0), &Version::new(1, 1, 0)) {
///     step.apply(&mut raw)?;
/// }
/// ```
#[derive(Debug)]
pub struct MigrationRegistry {
    steps: Vec<Arc<dyn MigrationStep>>,
    /// The latest version this registry can migrate to.
    latest_version: Version,
}

impl MigrationRegistry {
    pub fn new(latest_version: Version) -> Self {
        Self {
            steps: Vec::new(),
            latest_version,
        }
    }

    /// Registers a step, validating chain continuity.
    ///
    /// # Panics
    ///
    /// Panics if the step does not start where the previous step ends, or if
    /// it targets a version beyond the registry's latest version.
    pub fn register(&mut self, step: Arc<dyn MigrationStep>) {
        if let Some(last) = self.steps.last() {
            assert_eq!(
                last.to_version(),
                step.from_version(),
                "Migration chain broken: expected step from {} (previous to_version), but got step from {}. \
                 Description: '{}' (previous) -> '{}' (current)",
                last.to_version(),
                step.from_version(),
                last.description(),
                step.description()
            );
        }

        if step.to_version() > self.latest_version {
            panic!(
                "Migration target version {} exceeds registry's latest version {}",
                step.to_version(),
                self.latest_version
            );
        }

        self.steps.push(step);
    }

    /// Registers multiple steps at once, in order.
    pub fn register_all(&mut self, steps: Vec<Arc<dyn MigrationStep>>) {
        for step in steps {
            self.register(step);
        }
    }

    pub fn latest_version(&self) -> &Version {
        &self.latest_version
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Steps to run for data at `stored`, when upgrading to `current`.
    ///
    /// A step is pending iff `stored < step.to_version() <= current`. Returned
    /// in ascending order of target version.
    pub fn pending(&self, stored: &Version, current: &Version) -> Vec<Arc<dyn MigrationStep>> {
        self.steps
            .iter()
            .filter(|step| {
                let target = step.to_version();
                stored < &target && &target <= current
            })
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::raw::RawStore;
    use tabcalc_core::error::Result;

    #[derive(Debug)]
    struct NamedStep {
        from: Version,
        to: Version,
    }

    impl MigrationStep for NamedStep {
        fn from_version(&self) -> Version {
            self.from.clone()
        }

        fn to_version(&self) -> Version {
            self.to.clone()
        }

        fn description(&self) -> &str {
            "test step"
        }

        fn apply(&self, _raw: &mut RawStore) -> Result<()> {
            Ok(())
        }
    }

    fn step(from: (u64, u64, u64), to: (u64, u64, u64)) -> Arc<dyn MigrationStep> {
        Arc::new(NamedStep {
            from: Version::new(from.0, from.1, from.2),
            to: Version::new(to.0, to.1, to.2),
        })
    }

    fn registry() -> MigrationRegistry {
        let mut registry = MigrationRegistry::new(Version::new(2, 0, 0));
        registry.register_all(vec![
            step((1, 0, 0), (1, 1, 0)),
            step((1, 1, 0), (1, 2, 0)),
            step((1, 2, 0), (2, 0, 0)),
        ]);
        registry
    }

    fn targets(steps: &[Arc<dyn MigrationStep>]) -> Vec<String> {
        steps.iter().map(|s| s.to_version().to_string()).collect()
    }

    #[test]
    fn test_pending_selects_half_open_range() {
        let registry = registry();
        assert_eq!(registry.len(), 3);

        let pending = registry.pending(&Version::new(1, 0, 0), &Version::new(1, 2, 0));
        assert_eq!(targets(&pending), vec!["1.1.0", "1.2.0"]);

        let pending = registry.pending(&Version::new(1, 1, 0), &Version::new(2, 0, 0));
        assert_eq!(targets(&pending), vec!["1.2.0", "2.0.0"]);
    }

    #[test]
    fn test_nothing_pending_when_up_to_date() {
        let registry = registry();
        let version = Version::new(2, 0, 0);
        assert!(registry.pending(&version, &version).is_empty());
    }

    #[test]
    fn test_zero_version_runs_everything() {
        let registry = registry();
        let pending = registry.pending(&Version::new(0, 0, 0), &Version::new(2, 0, 0));
        assert_eq!(pending.len(), 3);
    }

    #[test]
    #[should_panic(expected = "Migration chain broken")]
    fn test_register_rejects_gap() {
        let mut registry = MigrationRegistry::new(Version::new(2, 0, 0));
        registry.register(step((1, 0, 0), (1, 1, 0)));
        registry.register(step((1, 2, 0), (2, 0, 0)));
    }

    #[test]
    #[should_panic(expected = "exceeds registry's latest version")]
    fn test_register_rejects_step_beyond_latest() {
        let mut registry = MigrationRegistry::new(Version::new(1, 1, 0));
        registry.register(step((1, 1, 0), (1, 2, 0)));
    }
}
