use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceShow {
    Away,
    Chat,
    Dnd,
    Xa,
}

impl Default for PresenceShow {
    fn default() -> Self {
        Self::Chat
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Presence {
    #[serde(default)]
    pub show: PresenceShow,
    #[serde(default)]
    pub status: String,
}
