//! # Storage Configuration
//!
//! Tunables for GPU-resident pools and the device buffer budget.
//! Loaded once at startup, usually from a TOML file:
//!
//! ```toml
//! device_budget_bytes = 268435456
//!
//! [gpu_pool]
//! initial_capacity = 512
//! growth_factor = 2
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EcsError, EcsResult};

/// Growth policy for GPU-resident component pools.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GpuPoolConfig {
    /// Element capacity of the first device buffer a pool allocates.
    pub initial_capacity: usize,
    /// Capacity multiplier applied when a full pool grows.
    pub growth_factor: usize,
}

impl Default for GpuPoolConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 256,
            growth_factor: 2,
        }
    }
}

impl GpuPoolConfig {
    /// Capacity to grow to when a pool holding `current` elements is full.
    ///
    /// Always greater than `current`, even for policies that
    /// [`EcsConfig::validate`] would reject.
    #[inline]
    #[must_use]
    pub fn next_capacity(&self, current: usize) -> usize {
        current
            .saturating_mul(self.growth_factor)
            .max(self.initial_capacity)
            .max(current.saturating_add(1))
    }
}

/// Top-level configuration consumed by [`Registry::new`](crate::Registry::new).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EcsConfig {
    /// Growth policy shared by every GPU-resident pool.
    pub gpu_pool: GpuPoolConfig,
    /// Total bytes the host buffer allocator may hand out.
    pub device_budget_bytes: u64,
}

impl Default for EcsConfig {
    fn default() -> Self {
        Self {
            gpu_pool: GpuPoolConfig::default(),
            // 256 MiB
            device_budget_bytes: 256 * 1024 * 1024,
        }
    }
}

impl EcsConfig {
    /// Parses and validates a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::InvalidConfig`] if the text is not valid TOML or a
    /// value is out of range.
    pub fn from_toml_str(text: &str) -> EcsResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| EcsError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::ConfigIo`] if the file cannot be read, otherwise the
    /// same errors as [`EcsConfig::from_toml_str`].
    pub fn from_toml_file(path: impl AsRef<Path>) -> EcsResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| EcsError::ConfigIo {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&text)
    }

    /// Checks that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> EcsResult<()> {
        if self.gpu_pool.initial_capacity == 0 {
            return Err(EcsError::InvalidConfig(
                "gpu_pool.initial_capacity must be greater than zero".into(),
            ));
        }
        if self.gpu_pool.growth_factor < 2 {
            return Err(EcsError::InvalidConfig(
                "gpu_pool.growth_factor must be at least 2".into(),
            ));
        }
        if self.device_budget_bytes == 0 {
            return Err(EcsError::InvalidConfig(
                "device_budget_bytes must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}
