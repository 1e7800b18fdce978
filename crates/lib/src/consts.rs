/// Value written to the `tool` field of newly created manifests.
pub const TOOL_NAME: &str = "github.com/zpas-lab/vendo";

/// Default manifest file name, relative to the project root.
pub const MANIFEST_FILENAME: &str = "vendor.json";

/// Default vendor directory, relative to the project root.
pub const VENDOR_DIRNAME: &str = "_vendor";

/// Name of the single stray file allowed directly inside the vendor directory.
pub const IGNORE_FILENAME: &str = ".gitignore";

/// Environment variable overriding the manifest location.
pub const MANIFEST_ENV: &str = "VENDO_MANIFEST";

/// Environment variable overriding the vendor directory.
pub const VENDOR_DIR_ENV: &str = "VENDO_VENDOR_DIR";
