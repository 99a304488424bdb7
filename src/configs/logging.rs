use serde::{Deserialize, Serialize};

/// `[logging]` table. `RUST_LOG` still overrides `level` and `filters` at startup.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct LoggingConfig {
    /// Base level, e.g. `info` or `debug`.
    pub level: Option<String>,
    /// Extra comma separated directives such as `reqwest=warn`.
    pub filters: Option<String>,
    /// Optional path of a plain-text log file, appended to.
    #[serde(default)]
    pub file: Option<String>,
}

impl LoggingConfig {
    /// Filter directive built from `level` (default `info`) and `filters`.
    pub fn directive(&self) -> String {
        let level = self.level.as_deref().unwrap_or("info");
        match self.filters.as_deref().filter(|f| !f.is_empty()) {
            Some(filters) => format!("{},{}", level, filters),
            None => level.to_string(),
        }
    }
}
