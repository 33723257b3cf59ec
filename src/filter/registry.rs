//! The [`Filter`] trait and the registry hosts look filters up in.

use std::collections::HashMap;
use std::fmt;

use super::params::{ParameterDecl, ParameterSet};
use crate::algo::Progress;
use crate::error::{MeshError, Result};
use crate::mesh::HalfEdgeMesh;

/// Menu category a filter is listed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterClass {
    /// Uncategorised.
    Generic,
    /// Noise removal and fairing.
    Smoothing,
}

impl fmt::Display for FilterClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FilterClass::Generic => "generic",
            FilterClass::Smoothing => "smoothing",
        };
        f.write_str(name)
    }
}

/// Static metadata a host needs to list and configure a filter.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterDescriptor {
    /// Stable identifier used for lookup.
    pub id: &'static str,
    /// Human-readable name.
    pub name: &'static str,
    /// Help text.
    pub description: &'static str,
    /// Category.
    pub class: FilterClass,
    /// Declared parameters with their defaults.
    pub parameters: Vec<ParameterDecl>,
}

/// Result of a successful [`Filter::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOutcome {
    /// Status line for the host's log.
    pub message: String,
    /// Number of vertices the filter touched.
    pub vertices_affected: usize,
}

/// A mesh operation that a host can register, configure and run.
///
/// The host first calls [`Filter::prepare`] when the user opens the filter,
/// then [`Filter::apply`] with the chosen parameters.
pub trait Filter: Send + Sync {
    /// Metadata for listing the filter.
    fn descriptor(&self) -> FilterDescriptor;

    /// Parameters initialised to their declared defaults.
    fn default_parameters(&self) -> ParameterSet {
        ParameterSet::from_decls(self.descriptor().parameters)
    }

    /// Bring the mesh into the state [`Filter::apply`] expects.
    fn prepare(&self, mesh: &mut HalfEdgeMesh) -> Result<()>;

    /// Run the filter.
    fn apply(
        &self,
        mesh: &mut HalfEdgeMesh,
        params: &ParameterSet,
        progress: &Progress,
    ) -> Result<FilterOutcome>;
}

/// Filters indexed by id, in registration order.
///
/// ```
/// use mcflow::filter::FilterRegistry;
///
/// let registry = FilterRegistry::with_builtin_filters();
/// assert!(registry.get("mean_curvature_flow").is_some());
/// assert!(registry.get("no_such_filter").is_none());
/// ```
#[derive(Default)]
pub struct FilterRegistry {
    filters: Vec<Box<dyn Filter>>,
    index: HashMap<&'static str, usize>,
}

impl FilterRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every filter this crate ships.
    pub fn with_builtin_filters() -> Self {
        let mut registry = Self::new();
        registry.filters.push(Box::new(super::MeanCurvatureFlowFilter::new()));
        registry.reindex();
        registry
    }

    /// Add a filter.
    ///
    /// # Errors
    ///
    /// [`MeshError::DuplicateFilter`] if the id is taken; the registry is
    /// left unchanged.
    pub fn register<F: Filter + 'static>(&mut self, filter: F) -> Result<()> {
        let id = filter.descriptor().id;
        if self.index.contains_key(id) {
            return Err(MeshError::DuplicateFilter { id: id.to_string() });
        }
        self.index.insert(id, self.filters.len());
        self.filters.push(Box::new(filter));
        log::debug!("registered filter `{}`", id);
        Ok(())
    }

    /// Look a filter up by id.
    pub fn get(&self, id: &str) -> Option<&dyn Filter> {
        self.index
            .get(id)
            .and_then(|&i| self.filters.get(i))
            .map(|f| f.as_ref())
    }

    /// Like [`Self::get`], but failing with [`MeshError::UnknownFilter`].
    pub fn require(&self, id: &str) -> Result<&dyn Filter> {
        self.get(id)
            .ok_or_else(|| MeshError::UnknownFilter { id: id.to_string() })
    }

    /// Descriptors of every registered filter, in registration order.
    pub fn descriptors(&self) -> Vec<FilterDescriptor> {
        self.filters.iter().map(|f| f.descriptor()).collect()
    }

    /// Number of registered filters.
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Whether no filter is registered.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    fn reindex(&mut self) {
        self.index = self
            .filters
            .iter()
            .enumerate()
            .map(|(i, f)| (f.descriptor().id, i))
            .collect();
    }
}

impl fmt::Debug for FilterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<&str> = self.filters.iter().map(|f| f.descriptor().id).collect();
        f.debug_struct("FilterRegistry").field("filters", &ids).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop;

    impl Filter for Noop {
        fn descriptor(&self) -> FilterDescriptor {
            FilterDescriptor {
                id: "noop",
                name: "No-op",
                description: "Does nothing.",
                class: FilterClass::Generic,
                parameters: vec![ParameterDecl::bool("Loud", false, "Loud", "Log more.")],
            }
        }

        fn prepare(&self, _mesh: &mut HalfEdgeMesh) -> Result<()> {
            Ok(())
        }

        fn apply(
            &self,
            _mesh: &mut HalfEdgeMesh,
            _params: &ParameterSet,
            _progress: &Progress,
        ) -> Result<FilterOutcome> {
            Ok(FilterOutcome {
                message: "nothing to do".to_string(),
                vertices_affected: 0,
            })
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = FilterRegistry::new();
        assert!(registry.is_empty());
        registry.register(Noop).unwrap();

        let filter = registry.get("noop").unwrap();
        assert_eq!(filter.descriptor().name, "No-op");
        assert!(!filter.default_parameters().get_bool("Loud").unwrap());
        assert!(registry.get("missing").is_none());
        assert!(matches!(
            registry.require("missing"),
            Err(MeshError::UnknownFilter { .. })
        ));
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut registry = FilterRegistry::with_builtin_filters();
        registry.register(Noop).unwrap();

        let err = registry.register(Noop).unwrap_err();
        assert!(matches!(err, MeshError::DuplicateFilter { ref id } if id == "noop"));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_descriptors_in_registration_order() {
        let mut registry = FilterRegistry::with_builtin_filters();
        registry.register(Noop).unwrap();

        let ids: Vec<&str> = registry.descriptors().iter().map(|d| d.id).collect();
        assert_eq!(ids, ["mean_curvature_flow", "noop"]);
    }

    #[test]
    fn test_class_names() {
        assert_eq!(FilterClass::Generic.to_string(), "generic");
        assert_eq!(FilterClass::Smoothing.to_string(), "smoothing");
    }
}
