//! Buffer pool configuration.

/// Default LRU-K depth.
const DEFAULT_REPLACER_K: usize = 2;

/// Configuration for the buffer pool.
#[derive(Debug, Clone)]
pub struct BufferPoolConfig {
    /// Number of page frames in the pool.
    pub pool_size: usize,
    /// Number of historical accesses the replacer keeps per frame (the K in
    /// LRU-K). Must be at least 1.
    pub replacer_k: usize,
}

impl BufferPoolConfig {
    /// Creates a configuration with the given pool size and the default
    /// LRU-K depth.
    #[must_use]
    pub fn new(pool_size: usize) -> Self {
        Self {
            pool_size,
            replacer_k: DEFAULT_REPLACER_K,
        }
    }

    /// Sets the LRU-K depth.
    #[must_use]
    pub fn with_replacer_k(mut self, k: usize) -> Self {
        self.replacer_k = k;
        self
    }

    /// Returns the total memory used by the frame buffers.
    #[must_use]
    pub fn memory_usage(&self) -> usize {
        self.pool_size * silt_common::PAGE_SIZE
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.pool_size == 0 {
            return Err("pool_size must be > 0");
        }
        if self.replacer_k == 0 {
            return Err("replacer_k must be >= 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_new() {
        let config = BufferPoolConfig::new(100);
        assert_eq!(config.pool_size, 100);
        assert_eq!(config.replacer_k, DEFAULT_REPLACER_K);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = BufferPoolConfig::new(10).with_replacer_k(5);
        assert_eq!(config.replacer_k, 5);
    }

    #[test]
    fn test_memory_usage() {
        let config = BufferPoolConfig::new(8);
        assert_eq!(config.memory_usage(), 8 * silt_common::PAGE_SIZE);
    }

    #[test]
    fn test_validation() {
        assert!(BufferPoolConfig::new(0).validate().is_err());
        assert!(BufferPoolConfig::new(10).with_replacer_k(0).validate().is_err());
        assert!(BufferPoolConfig::new(10).validate().is_ok());
    }
}
