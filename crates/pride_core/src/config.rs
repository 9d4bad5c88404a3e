//! Database configuration.

/// Configuration for opening an archive database.
#[derive(Debug, Clone)]
pub struct Config {
    /// Whether to create the database directory if it doesn't exist.
    pub create_if_missing: bool,

    /// Whether to flush the mutation log after every write.
    pub sync_on_write: bool,

    /// Page size used when a caller does not ask for one.
    pub default_page_size: u64,

    /// Largest page size a caller may request.
    pub max_page_size: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            sync_on_write: true,
            default_page_size: 100,
            max_page_size: 1000,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether to create the database if missing.
    #[must_use]
    pub const fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    /// Sets whether to flush the log on every write.
    #[must_use]
    pub const fn sync_on_write(mut self, value: bool) -> Self {
        self.sync_on_write = value;
        self
    }

    /// Sets the default page size.
    #[must_use]
    pub const fn default_page_size(mut self, size: u64) -> Self {
        self.default_page_size = size;
        self
    }

    /// Sets the largest accepted page size.
    #[must_use]
    pub const fn max_page_size(mut self, size: u64) -> Self {
        self.max_page_size = size;
        self
    }
}
