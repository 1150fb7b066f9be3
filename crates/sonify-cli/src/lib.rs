//! Library surface behind the `sonify` binary: CoreServices/JobStore
//! bootstrapping plus one module per subcommand.

pub mod cli_args;
pub mod commands;

use sonify_spec::config::{env_or, env_path_or};
use sonify_spec::CoreServices;
use sonify_store::{ArtifactStore, JobStore};

/// Resolves the process-wide services and job store from environment
/// variables, falling back to the `config/` and `var/` directory
/// conventions used in local development and the test fixtures.
pub fn bootstrap() -> JobStore {
    let palettes_path = env_path_or("SONIFY_PALETTES_PATH", "config/palettes.yaml");
    let rules_path = env_path_or("SONIFY_RULES_PATH", "config/rules.yaml");
    let catalog_dir = env_path_or("SONIFY_CATALOG_DIR", "config/catalogs");
    let artifacts_dir = env_path_or("SONIFY_ARTIFACTS_DIR", "var/artifacts");
    let tenant = env_or("SONIFY_TENANT", "default");

    let services = CoreServices::new(palettes_path, rules_path, catalog_dir);
    let artifacts = ArtifactStore::new(artifacts_dir);
    JobStore::new(tenant, artifacts, services)
}
