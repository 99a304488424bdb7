use serde::{Deserialize, Serialize};

/// Defaults applied to sessions created without explicit options.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SessionDefaults {
    #[serde(default = "default_volume")]
    pub volume: f64,
    #[serde(default)]
    pub self_mute: bool,
    #[serde(default)]
    pub self_deafen: bool,
    #[serde(default = "default_dynamic_repeat_interval_ms")]
    pub dynamic_repeat_interval_ms: u64,
}

impl Default for SessionDefaults {
    fn default() -> Self {
        Self {
            volume: default_volume(),
            self_mute: false,
            self_deafen: false,
            dynamic_repeat_interval_ms: default_dynamic_repeat_interval_ms(),
        }
    }
}

fn default_volume() -> f64 {
    100.0
}

fn default_dynamic_repeat_interval_ms() -> u64 {
    3000
}
