use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier assigned by the remote catalog. Stable across fetches.
pub type CharacterId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum CharacterStatus {
    Alive,
    Dead,
    // The API sends lowercase "unknown"; anything unrecognised lands here too.
    #[serde(rename = "unknown", other)]
    Unknown,
}

impl CharacterStatus {
    /// Value used for the `status` query parameter.
    pub fn as_query(&self) -> &'static str {
        match self {
            CharacterStatus::Alive => "alive",
            CharacterStatus::Dead => "dead",
            CharacterStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for CharacterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CharacterStatus::Alive => write!(f, "Alive"),
            CharacterStatus::Dead => write!(f, "Dead"),
            CharacterStatus::Unknown => write!(f, "Unknown"),
        }
    }
}

impl FromStr for CharacterStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "alive" => Ok(CharacterStatus::Alive),
            "dead" => Ok(CharacterStatus::Dead),
            "unknown" => Ok(CharacterStatus::Unknown),
            other => Err(format!("unknown character status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum Gender {
    Female,
    Male,
    Genderless,
    #[serde(rename = "unknown", other)]
    Unknown,
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Female => write!(f, "Female"),
            Gender::Male => write!(f, "Male"),
            Gender::Genderless => write!(f, "Genderless"),
            Gender::Unknown => write!(f, "Unknown"),
        }
    }
}

/// A named place plus the API locator for it. Either may be empty.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct LocationRef {
    pub name: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Character {
    pub id: CharacterId,
    pub name: String,
    pub status: CharacterStatus,
    pub species: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    pub gender: Gender,
    pub origin: LocationRef,
    pub location: LocationRef,
    pub image: String,
    /// Episode locators in narrative order.
    #[serde(rename = "episode", default)]
    pub episodes: Vec<String>,
    #[serde(default)]
    pub url: String,
    pub created: DateTime<Utc>,
}

impl Character {
    pub fn is_alive(&self) -> bool {
        self.status == CharacterStatus::Alive
    }

    /// "Human", or "Human (Parasite)" when a sub-type is present
    pub fn species_display(&self) -> String {
        if self.kind.is_empty() {
            self.species.clone()
        } else {
            format!("{} ({})", self.species, self.kind)
        }
    }
}

/// Criteria a feed is built from.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CharacterFilters {
    pub status: Option<CharacterStatus>,
    pub name: Option<String>,
}

impl CharacterFilters {
    pub fn with_status(status: CharacterStatus) -> Self {
        Self {
            status: Some(status),
            name: None,
        }
    }

    /// Name query with surrounding whitespace removed; `None` when blank.
    pub fn name_query(&self) -> Option<&str> {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.name_query().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RICK_JSON: &str = r#"{
        "id": 1,
        "name": "Rick Sanchez",
        "status": "Alive",
        "species": "Human",
        "type": "",
        "gender": "Male",
        "origin": {"name": "Earth (C-137)", "url": "https://rickandmortyapi.com/api/location/1"},
        "location": {"name": "Citadel of Ricks", "url": "https://rickandmortyapi.com/api/location/3"},
        "image": "https://rickandmortyapi.com/api/character/avatar/1.jpeg",
        "episode": [
            "https://rickandmortyapi.com/api/episode/1",
            "https://rickandmortyapi.com/api/episode/2"
        ],
        "url": "https://rickandmortyapi.com/api/character/1",
        "created": "2017-11-04T18:48:46.250Z"
    }"#;

    #[test]
    fn test_parse_character() {
        let rick: Character = serde_json::from_str(RICK_JSON).expect("valid character json");
        assert_eq!(rick.id, 1);
        assert_eq!(rick.status, CharacterStatus::Alive);
        assert_eq!(rick.gender, Gender::Male);
        assert_eq!(rick.origin.name, "Earth (C-137)");
        assert_eq!(rick.episodes.len(), 2);
        assert!(rick.episodes[0].ends_with("/episode/1"));
        assert_eq!(rick.species_display(), "Human");
    }

    #[test]
    fn test_unknown_status_and_gender_wire_values() {
        let json = RICK_JSON
            .replace("\"Alive\"", "\"unknown\"")
            .replace("\"Male\"", "\"unknown\"");
        let c: Character = serde_json::from_str(&json).expect("valid character json");
        assert_eq!(c.status, CharacterStatus::Unknown);
        assert_eq!(c.gender, Gender::Unknown);

        // Round trip keeps the API's lowercase spelling
        let out = serde_json::to_string(&c).expect("serializable");
        assert!(out.contains("\"status\":\"unknown\""));
    }

    #[test]
    fn test_status_from_str_case_insensitive() {
        assert_eq!("alive".parse::<CharacterStatus>(), Ok(CharacterStatus::Alive));
        assert_eq!("Dead".parse::<CharacterStatus>(), Ok(CharacterStatus::Dead));
        assert_eq!(" UNKNOWN ".parse::<CharacterStatus>(), Ok(CharacterStatus::Unknown));
        assert!("zombie".parse::<CharacterStatus>().is_err());
    }

    #[test]
    fn test_filters_name_query_blank() {
        let filters = CharacterFilters {
            status: None,
            name: Some("   ".to_string()),
        };
        assert_eq!(filters.name_query(), None);
        assert!(filters.is_empty());

        let filters = CharacterFilters {
            status: None,
            name: Some(" rick ".to_string()),
        };
        assert_eq!(filters.name_query(), Some("rick"));
        assert!(!filters.is_empty());
    }
}
