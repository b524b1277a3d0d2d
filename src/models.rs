use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Handle returned by `on`, used to unsubscribe
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubscriptionId(pub u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A change delivered to a listener
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StateChange {
    /// Path the listener subscribed at
    pub path: String,
    /// Exact path that was written
    pub origin: String,
    pub new_value: Value,
    /// Value at `path` before the write, `None` if it was unset
    pub old_value: Option<Value>,
    /// True when produced by `dispatch`
    pub forced: bool,
    pub at: DateTime<Utc>,
}

impl StateChange {
    /// True for the listener registered on the exact path that was written
    pub fn is_exact(&self) -> bool {
        self.path == self.origin
    }
}

/// Show configuration - stage definitions and state channels
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowConfig {
    /// Either a control scheme name or a `{type, ...}` table
    #[serde(default)]
    pub camera_controls: Option<Value>,
    #[serde(default)]
    pub ui: Option<String>,
    #[serde(default)]
    pub venue: Option<String>,
    #[serde(default)]
    pub program: Program,
    /// Media timelines and scripts, published as-is
    #[serde(default)]
    pub specs: Option<Value>,
}

/// Running order of a show
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    /// Length in seconds
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub stages: Vec<Stage>,
    /// State paths the show publishes on (`time`, `narrative`, ...)
    #[serde(default)]
    pub channels: Vec<String>,
    /// Spreadsheet feed the narrative is pulled from
    #[serde(default)]
    pub gss: Option<String>,
}

/// A named stage and the models selectable on it (id -> label)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub name: String,
    #[serde(default)]
    pub models: BTreeMap<String, String>,
}
