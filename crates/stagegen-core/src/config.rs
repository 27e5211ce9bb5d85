//! Package build configuration.

use rustc_hash::FxHashMap;

/// Tunable builder properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildProperty {
    /// Maximum number of recorded soft diagnostics; 0 keeps all of them.
    MaxDiagnostics,
    /// Fold operators whose operands are both constants.
    FoldConstants,
    /// Reject expression statements that are not calls.
    StrictExprStmt,
}

impl BuildProperty {
    pub fn default_value(&self) -> usize {
        match self {
            BuildProperty::MaxDiagnostics => 100,
            BuildProperty::FoldConstants => 1,
            BuildProperty::StrictExprStmt => 1,
        }
    }
}

/// Configuration of a [`Package`](../../stagegen_builder/struct.Package.html).
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Package name used for the output file and to qualify named types.
    pub name: String,
    /// Import path of the package.
    pub path: String,
    properties: FxHashMap<BuildProperty, usize>,
}

impl BuildConfig {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            path: name.clone(),
            name,
            properties: FxHashMap::default(),
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_property(mut self, property: BuildProperty, value: usize) -> Self {
        self.set_property(property, value);
        self
    }

    pub fn set_property(&mut self, property: BuildProperty, value: usize) {
        self.properties.insert(property, value);
    }

    pub fn property(&self, property: BuildProperty) -> usize {
        self.properties
            .get(&property)
            .copied()
            .unwrap_or_else(|| property.default_value())
    }

    /// Boolean view of a property.
    pub fn enabled(&self, property: BuildProperty) -> bool {
        self.property(property) != 0
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self::new("main")
    }
}
