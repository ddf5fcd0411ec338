//! Error types for drishti-mcl

use thiserror::Error;

/// Result type alias for engine-level operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Failures while loading or querying an occupancy map.
#[derive(Error, Debug)]
pub enum MapError {
    /// First header token was not the binary graymap magic.
    #[error("Bad map magic: expected \"P5\", found {found:?}")]
    BadMagic {
        /// Token actually read from the file.
        found: String,
    },

    /// Dimension or gray-level line could not be parsed.
    #[error("Bad map header: {0}")]
    BadHeader(String),

    /// Fewer pixel bytes than `width * height`.
    #[error("Truncated map data: expected {expected} bytes, got {actual}")]
    Truncated {
        /// Bytes implied by the header.
        expected: usize,
        /// Bytes actually available.
        actual: usize,
    },

    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Pixel data could not be decoded.
    #[error("Failed to decode map image: {0}")]
    Image(#[from] image::ImageError),

    /// A `.gz` map was requested but the crate was built without gzip support.
    #[error("Compressed maps are not supported in this build")]
    UnsupportedCompression,

    /// Requested sub-tile does not fit inside the grid.
    #[error("Tile {x},{y} {width}x{height} exceeds map bounds {map_width}x{map_height}")]
    TileOutOfBounds {
        /// Tile origin column.
        x: u32,
        /// Tile origin row.
        y: u32,
        /// Tile width in cells.
        width: u32,
        /// Tile height in cells.
        height: u32,
        /// Map width in cells.
        map_width: u32,
        /// Map height in cells.
        map_height: u32,
    },
}

/// Failures of the SIR cycle.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterError {
    /// Every particle received zero importance; the population must be reset.
    #[error("Particle filter collapsed: all importance weights are zero")]
    Collapsed,
}

/// Configuration errors, reported when the configuration is applied.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// TOML syntax or schema error (including unknown sensor types).
    #[error("Failed to parse config: {0}")]
    Parse(#[from] basic_toml::Error),

    /// A value is outside its permitted range.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level engine error.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Map error: {0}")]
    Map(#[from] MapError),

    #[error("Filter error: {0}")]
    Filter(#[from] FilterError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Scan does not cover the configured sensor geometry.
    #[error("Scan has {actual} ranges, sensor geometry needs {expected}")]
    ScanLength {
        /// Number of readings the sensor geometry requires.
        expected: usize,
        /// Number of readings supplied.
        actual: usize,
    },

    /// A previous tick collapsed and `reset` has not been called since.
    #[error("Filter collapsed on a previous tick; reset required")]
    ResetRequired,
}
