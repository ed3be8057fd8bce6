use serde::Deserialize;

/// Settings for decoding error responses from other services
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Charset for bodies that are neither JSON nor XML
    #[serde(default = "default_charset")]
    pub default_charset: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            default_charset: default_charset(),
        }
    }
}

fn default_charset() -> String {
    "utf-8".to_owned()
}
