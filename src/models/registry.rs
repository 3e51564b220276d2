//! Name-keyed model factories
//!
//! Each pluggable family has its own table mapping a configuration key to a
//! factory. The registry is filled once (built-ins plus any user variants),
//! then only read: the orchestrator asks it for one instance per family at
//! construction and never reselects.
//!
//! ```rust
//! use std::sync::Arc;
//! use popbal_rs::config::ModelSelection;
//! use popbal_rs::models::{ModelRegistry, PowerLaw};
//!
//! let mut registry = ModelRegistry::with_builtin();
//! registry.register_breakup("cubic", |_selection| Ok(Arc::new(PowerLaw::new(1.0, 3.0))));
//!
//! let model = registry.create_breakup(&ModelSelection::new("cubic")).unwrap();
//! assert_eq!(model.name(), "powerLaw");
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::ModelSelection;
use crate::error::{PbeError, PbeResult};
use crate::models::breakup::{BreakupRateModel, CoulaloglouTavlarides, Exponential, PowerLaw};
use crate::models::coalescence::{CoalescenceRateModel, ConstantKernel, HydrodynamicKernel};
use crate::models::daughter::{DaughterDistributionModel, Uniform, UniformBinary};
use crate::models::shape::{NonSpherical, ShapeModel, Spherical};

/// Factory building one model of a family from its selection
pub type Factory<T> = Box<dyn Fn(&ModelSelection) -> PbeResult<Arc<T>> + Send + Sync>;

/// Factory table of one family
struct Family<T: ?Sized> {
    label: &'static str,
    factories: HashMap<String, Factory<T>>,
}

impl<T: ?Sized> Family<T> {
    fn new(label: &'static str) -> Self {
        Self {
            label,
            factories: HashMap::new(),
        }
    }

    fn register(&mut self, name: &str, factory: Factory<T>) {
        if self.factories.insert(name.to_string(), factory).is_some() {
            log::debug!("Replacing {} '{}'", self.label, name);
        }
    }

    fn create(&self, selection: &ModelSelection) -> PbeResult<Arc<T>> {
        let factory = self
            .factories
            .get(&selection.model)
            .ok_or_else(|| PbeError::UnknownModel {
                family: self.label,
                name: selection.model.clone(),
                available: self.available(),
            })?;
        factory(selection)
    }

    fn available(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }
}

/// Factories for every model family
pub struct ModelRegistry {
    breakup: Family<dyn BreakupRateModel>,
    daughter: Family<dyn DaughterDistributionModel>,
    shape: Family<dyn ShapeModel>,
    coalescence: Family<dyn CoalescenceRateModel>,
}

impl ModelRegistry {
    /// Registry without any model
    pub fn empty() -> Self {
        Self {
            breakup: Family::new("breakup rate model"),
            daughter: Family::new("daughter distribution model"),
            shape: Family::new("shape model"),
            coalescence: Family::new("coalescence rate model"),
        }
    }

    /// Registry holding every model shipped with the crate
    pub fn with_builtin() -> Self {
        let mut registry = Self::empty();

        registry.register_breakup("exponential", |s| Ok(Arc::new(Exponential::from_selection(s)?)));
        registry.register_breakup("powerLaw", |s| Ok(Arc::new(PowerLaw::from_selection(s)?)));
        registry.register_breakup("coulaloglouTavlarides", |s| {
            Ok(Arc::new(CoulaloglouTavlarides::from_selection(s)?))
        });

        registry.register_daughter("uniformBinary", |s| {
            Ok(Arc::new(UniformBinary::from_selection(s)?))
        });
        registry.register_daughter("uniform", |s| Ok(Arc::new(Uniform::from_selection(s)?)));

        registry.register_shape("spherical", |s| Ok(Arc::new(Spherical::from_selection(s)?)));
        registry.register_shape("nonSpherical", |s| {
            Ok(Arc::new(NonSpherical::from_selection(s)?))
        });

        registry.register_coalescence("constant", |s| {
            Ok(Arc::new(ConstantKernel::from_selection(s)?))
        });
        registry.register_coalescence("hydrodynamic", |s| {
            Ok(Arc::new(HydrodynamicKernel::from_selection(s)?))
        });

        registry
    }

    // ======================================== Registration ========================================

    pub fn register_breakup<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&ModelSelection) -> PbeResult<Arc<dyn BreakupRateModel>> + Send + Sync + 'static,
    {
        self.breakup.register(name, Box::new(factory));
    }

    pub fn register_daughter<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&ModelSelection) -> PbeResult<Arc<dyn DaughterDistributionModel>>
            + Send
            + Sync
            + 'static,
    {
        self.daughter.register(name, Box::new(factory));
    }

    pub fn register_shape<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&ModelSelection) -> PbeResult<Arc<dyn ShapeModel>> + Send + Sync + 'static,
    {
        self.shape.register(name, Box::new(factory));
    }

    pub fn register_coalescence<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&ModelSelection) -> PbeResult<Arc<dyn CoalescenceRateModel>>
            + Send
            + Sync
            + 'static,
    {
        self.coalescence.register(name, Box::new(factory));
    }

    // ========================================== Creation ==========================================

    pub fn create_breakup(&self, selection: &ModelSelection) -> PbeResult<Arc<dyn BreakupRateModel>> {
        self.breakup.create(selection)
    }

    pub fn create_daughter(
        &self,
        selection: &ModelSelection,
    ) -> PbeResult<Arc<dyn DaughterDistributionModel>> {
        self.daughter.create(selection)
    }

    pub fn create_shape(&self, selection: &ModelSelection) -> PbeResult<Arc<dyn ShapeModel>> {
        self.shape.create(selection)
    }

    pub fn create_coalescence(
        &self,
        selection: &ModelSelection,
    ) -> PbeResult<Arc<dyn CoalescenceRateModel>> {
        self.coalescence.create(selection)
    }

    // ========================================== Listing ==========================================

    pub fn available_breakup(&self) -> Vec<String> {
        self.breakup.available()
    }

    pub fn available_daughter(&self) -> Vec<String> {
        self.daughter.available()
    }

    pub fn available_shape(&self) -> Vec<String> {
        self.shape.available()
    }

    pub fn available_coalescence(&self) -> Vec<String> {
        self.coalescence.available()
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

impl std::fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("breakup", &self.available_breakup())
            .field("daughter", &self.available_daughter())
            .field("shape", &self.available_shape())
            .field("coalescence", &self.available_coalescence())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_keys() {
        let registry = ModelRegistry::with_builtin();

        assert_eq!(
            registry.available_breakup(),
            vec!["coulaloglouTavlarides", "exponential", "powerLaw"]
        );
        assert_eq!(registry.available_daughter(), vec!["uniform", "uniformBinary"]);
        assert_eq!(registry.available_shape(), vec!["nonSpherical", "spherical"]);
        assert_eq!(registry.available_coalescence(), vec!["constant", "hydrodynamic"]);
    }

    #[test]
    fn test_create_passes_parameters() {
        let registry = ModelRegistry::default();
        let shape = registry
            .create_shape(&ModelSelection::new("nonSpherical").with("factor", 1.2))
            .unwrap();
        assert_eq!(shape.name(), "nonSpherical");
    }

    #[test]
    fn test_unknown_key_lists_alternatives() {
        let registry = ModelRegistry::with_builtin();
        let err = registry
            .create_daughter(&ModelSelection::new("ternary"))
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Unknown daughter distribution model 'ternary' (available: uniform, uniformBinary)"
        );
    }

    #[test]
    fn test_empty_registry() {
        let registry = ModelRegistry::empty();
        assert!(registry.available_shape().is_empty());
        assert!(registry.create_shape(&ModelSelection::new("spherical")).is_err());
    }
}
