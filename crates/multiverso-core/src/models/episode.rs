use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Episode {
    pub id: u32,
    pub name: String,
    pub air_date: String,
    /// Season/episode code, e.g. "S01E01"
    #[serde(rename = "episode")]
    pub code: String,
    #[serde(default)]
    pub characters: Vec<String>,
    #[serde(default)]
    pub url: String,
    pub created: DateTime<Utc>,
}

impl Episode {
    pub fn title(&self) -> String {
        format!("{} - {}", self.code, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_episode() {
        let json = r#"{
            "id": 1,
            "name": "Pilot",
            "air_date": "December 2, 2013",
            "episode": "S01E01",
            "characters": ["https://rickandmortyapi.com/api/character/1"],
            "url": "https://rickandmortyapi.com/api/episode/1",
            "created": "2017-11-10T12:56:33.798Z"
        }"#;

        let ep: Episode = serde_json::from_str(json).expect("valid episode json");
        assert_eq!(ep.code, "S01E01");
        assert_eq!(ep.title(), "S01E01 - Pilot");
        assert_eq!(ep.characters.len(), 1);
    }
}
