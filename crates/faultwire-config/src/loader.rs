use std::path::Path;

use crate::Config;

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, expansion fails,
    /// TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        let config = Self::from_toml(&raw)?;

        tracing::debug!(
            config_path = %path.display(),
            mappings = config.mappings.len(),
            policies = config.policies.len(),
            "loaded faultwire configuration"
        );

        Ok(config)
    }

    /// Parse and validate configuration from a TOML string
    ///
    /// # Errors
    ///
    /// Returns an error if expansion, parsing, or validation fails
    pub fn from_toml(raw: &str) -> anyhow::Result<Self> {
        let expanded =
            crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error if a status is out of range, the depth ceiling is
    /// zero, or the default charset is unknown
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_cause_depth == 0 {
            anyhow::bail!("max_cause_depth must be at least 1");
        }

        validate_status("default_mapping.status", Some(self.default_mapping.status))?;

        for entry in &self.mappings {
            validate_status(&format!("mapping for '{}'", entry.pattern), entry.status)?;
        }

        for (name, entry) in self.metadata.types.iter().chain(&self.metadata.methods) {
            validate_status(&format!("metadata for '{name}'"), entry.status)?;
        }

        for key in self.metadata.methods.keys() {
            if key.split_once('#').is_none_or(|(ty, method)| ty.is_empty() || method.is_empty()) {
                anyhow::bail!("metadata method key '{key}' must have the form `Type#method`");
            }
        }

        if encoding_rs::Encoding::for_label(self.client.default_charset.as_bytes()).is_none() {
            anyhow::bail!("unknown client.default_charset '{}'", self.client.default_charset);
        }

        Ok(())
    }
}

fn validate_status(context: &str, status: Option<u16>) -> anyhow::Result<()> {
    match status {
        Some(status) if !(100..=599).contains(&status) => {
            anyhow::bail!("{context}: status {status} is outside 100..=599")
        }
        _ => Ok(()),
    }
}
