//! Environment source: PAGETYPE__STORAGE__PATH=... style overrides.

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::Environment;

/// Add `PAGETYPE__*` environment variables to builder (highest precedence).
pub fn add_to_builder(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix("PAGETYPE")
            .prefix_separator("__")
            .separator("__"),
    )
}
