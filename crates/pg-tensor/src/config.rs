use crate::error::{Result, TensorError};

/// Default edge length of a square matmul tile.
pub const DEFAULT_TILE_SIZE: usize = 16;
/// Default number of real threads cooperating on one tile.
pub const DEFAULT_GROUP_THREADS: usize = 4;

/// Configuration for [`ParallelBackend`](crate::ParallelBackend).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputeConfig {
    /// Edge length of the square tiles used by tiled matmul.
    pub tile_size: usize,
    /// Size of the backend's thread pool. `None` lets rayon decide.
    pub num_threads: Option<usize>,
    /// Real threads executing each worker group of the tiled kernel.
    pub group_threads: usize,
}

impl Default for ComputeConfig {
    fn default() -> Self {
        ComputeConfig {
            tile_size: DEFAULT_TILE_SIZE,
            num_threads: None,
            group_threads: DEFAULT_GROUP_THREADS,
        }
    }
}

impl ComputeConfig {
    pub fn with_tile_size(mut self, tile_size: usize) -> Self {
        self.tile_size = tile_size;
        self
    }

    pub fn with_num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = Some(num_threads);
        self
    }

    pub fn with_group_threads(mut self, group_threads: usize) -> Self {
        self.group_threads = group_threads;
        self
    }

    /// Build a configuration from the environment, falling back to the
    /// defaults for unset variables.
    ///
    /// Reads:
    /// - `PG_TILE_SIZE` -> tile_size
    /// - `PG_NUM_THREADS` -> num_threads
    /// - `PG_GROUP_THREADS` -> group_threads
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) with a custom variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ComputeConfig::default();
        let config = ComputeConfig {
            tile_size: parse_var(&lookup, "PG_TILE_SIZE")?.unwrap_or(defaults.tile_size),
            num_threads: parse_var(&lookup, "PG_NUM_THREADS")?.or(defaults.num_threads),
            group_threads: parse_var(&lookup, "PG_GROUP_THREADS")?
                .unwrap_or(defaults.group_threads),
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject zero sizes.
    pub fn validate(&self) -> Result<()> {
        if self.tile_size == 0 {
            return Err(TensorError::InvalidTileSize(self.tile_size));
        }
        if self.num_threads == Some(0) {
            return Err(TensorError::Config("num_threads must be > 0".to_string()));
        }
        if self.group_threads == 0 {
            return Err(TensorError::Config("group_threads must be > 0".to_string()));
        }
        Ok(())
    }
}

fn parse_var<F>(lookup: &F, key: &str) -> Result<Option<usize>>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<usize>()
            .map(Some)
            .map_err(|e| TensorError::Config(format!("{}={:?}: {}", key, raw, e))),
    }
}
