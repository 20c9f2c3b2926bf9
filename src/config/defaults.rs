//! Default configuration values

/// Build file read when none is given on the command line
pub const DEFAULT_BUILD_FILE: &str = "bake.toml";

/// Static archiver command
pub const ARCHIVER: &str = "ar";

/// Archiver flags: replace members, create archive, write symbol index
pub const ARCHIVER_FLAGS: &str = "rcs";

/// Suffix of translation units
pub const SOURCE_EXTENSION: &str = "c";

/// Suffix of compiled objects
pub const OBJECT_EXTENSION: &str = "o";

/// Default number of compile workers per project
pub const DEFAULT_BUILD_JOBS: usize = 1;

/// Minimum proptest iterations
pub const MIN_PROPTEST_ITERATIONS: u32 = 100;
