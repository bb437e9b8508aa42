use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// The two kinds of boost a partner can buy. `EnVedette` puts the listing in the
/// featured carousel, `Visibilite` raises it on the map.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BoostType {
    EnVedette,
    Visibilite,
}

impl BoostType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoostType::EnVedette => "en_vedette",
            BoostType::Visibilite => "visibilite",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "en_vedette" => Some(BoostType::EnVedette),
            "visibilite" => Some(BoostType::Visibilite),
            _ => None,
        }
    }
}

impl Display for BoostType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_stored_values() {
        assert_eq!(BoostType::from_str("en_vedette"), Some(BoostType::EnVedette));
        assert_eq!(BoostType::from_str("visibilite"), Some(BoostType::Visibilite));
        assert_eq!(BoostType::from_str("featured"), None);
    }

    #[test]
    fn serializes_as_snake_case() {
        let json = serde_json::to_string(&BoostType::EnVedette).unwrap();
        assert_eq!(json, "\"en_vedette\"");
    }
}
