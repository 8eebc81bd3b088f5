use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Error, Result};

pub const FREE_DICTIONARY_URL: &str = "https://api.dictionaryapi.dev/api/v2/entries/en";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Definition {
    pub part_of_speech: String,
    pub definition: String,
    pub example: Option<String>,
}

/// Read-only word lookup. An unknown word is an empty list, not an error.
pub trait Dictionary {
    fn lookup(&self, word: &str) -> Result<Vec<Definition>>;
}

#[derive(Deserialize)]
struct Entry {
    #[serde(default)]
    meanings: Vec<Meaning>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Meaning {
    #[serde(default)]
    part_of_speech: String,
    #[serde(default)]
    definitions: Vec<RawDefinition>,
}

#[derive(Deserialize)]
struct RawDefinition {
    definition: String,
    #[serde(default)]
    example: Option<String>,
}

/// dictionaryapi.dev client.
pub struct FreeDictionary {
    client: Client,
    base_url: String,
}

impl FreeDictionary {
    pub fn new() -> Result<Self> {
        Self::with_base_url(FREE_DICTIONARY_URL)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

impl Dictionary for FreeDictionary {
    fn lookup(&self, word: &str) -> Result<Vec<Definition>> {
        let word = word.trim();
        if word.is_empty() {
            return Ok(Vec::new());
        }
        let url = reqwest::Url::parse(&format!("{}/", self.base_url))
            .and_then(|base| base.join(word))
            .map_err(|e| Error::InvalidInput(format!("bad lookup url: {e}")))?;
        let response = self.client.get(url).send()?;
        match response.status() {
            StatusCode::NOT_FOUND => {
                log::debug!("no dictionary entry for {word:?}");
                Ok(Vec::new())
            }
            status if status.is_success() => Ok(flatten_entries(response.json()?)),
            status => Err(Error::Status {
                status: status.as_u16(),
                body: response.text().unwrap_or_default(),
            }),
        }
    }
}

fn flatten_entries(entries: Vec<Entry>) -> Vec<Definition> {
    entries
        .into_iter()
        .flat_map(|entry| entry.meanings)
        .flat_map(|meaning| {
            let part_of_speech = meaning.part_of_speech;
            meaning
                .definitions
                .into_iter()
                .map(move |d| Definition {
                    part_of_speech: part_of_speech.clone(),
                    definition: d.definition,
                    example: d.example,
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_flatten_in_order() {
        let json = r#"[{
            "word": "run",
            "meanings": [
                {"partOfSpeech": "verb", "definitions": [
                    {"definition": "To move swiftly.", "example": "I run every day."},
                    {"definition": "To manage."}
                ]},
                {"partOfSpeech": "noun", "definitions": [{"definition": "An act of running."}]}
            ]
        }]"#;
        let defs = flatten_entries(serde_json::from_str(json).unwrap());

        assert_eq!(defs.len(), 3);
        assert_eq!(defs[0].part_of_speech, "verb");
        assert_eq!(defs[0].example.as_deref(), Some("I run every day."));
        assert_eq!(defs[1].example, None);
        assert_eq!(defs[2].part_of_speech, "noun");
    }

    #[test]
    fn blank_word_skips_the_network() {
        let dict = FreeDictionary::with_base_url("http://127.0.0.1:9").unwrap();
        assert!(dict.lookup("   ").unwrap().is_empty());
    }
}
