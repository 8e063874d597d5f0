//! Execution bounds for compiled templates.

use serde::{Deserialize, Serialize};

/// Bounds applied to every render and to the compiled-template cache.
///
/// Externally supplied templates can loop or recurse without end; `fuel`
/// caps the number of instructions a single render may execute and
/// `max_output_bytes` caps the size of the text it produces.
///
/// ```rust
/// use ctrconf_template::Limits;
///
/// let limits = Limits::default().with_fuel(Some(10_000)).with_max_output_bytes(None);
/// assert_eq!(limits.fuel, Some(10_000));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Instruction budget per render. `None` disables the bound.
    pub fuel: Option<u64>,
    /// Maximum rendered size in bytes. `None` disables the bound.
    pub max_output_bytes: Option<usize>,
    /// Number of compiled templates kept by a
    /// [`TemplateCompiler`](crate::TemplateCompiler). Zero disables caching.
    pub cache_capacity: usize,
}

impl Limits {
    pub const DEFAULT_FUEL: u64 = 1_000_000;
    pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 4 * 1024 * 1024;
    pub const DEFAULT_CACHE_CAPACITY: usize = 64;

    /// No execution or output bounds. Caching keeps the default capacity.
    pub fn unbounded() -> Self {
        Self {
            fuel: None,
            max_output_bytes: None,
            cache_capacity: Self::DEFAULT_CACHE_CAPACITY,
        }
    }

    pub fn with_fuel(mut self, fuel: Option<u64>) -> Self {
        self.fuel = fuel;
        self
    }

    pub fn with_max_output_bytes(mut self, max: Option<usize>) -> Self {
        self.max_output_bytes = max;
        self
    }

    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            fuel: Some(Self::DEFAULT_FUEL),
            max_output_bytes: Some(Self::DEFAULT_MAX_OUTPUT_BYTES),
            cache_capacity: Self::DEFAULT_CACHE_CAPACITY,
        }
    }
}
