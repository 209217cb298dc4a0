use anyhow::{Context, Result};
use async_trait::async_trait;
use cadence_llm::Tool;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::ToolHandler;

pub const MTG_API_BASE: &str = "https://api.magicthegathering.io/v1";

/// Query parameters accepted by the card search
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CardFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub set: Option<String>,
    /// Comma-separated list
    #[serde(skip_serializing_if = "Option::is_none")]
    pub types: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtypes: Option<String>,
    /// Comma-separated list
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colors: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rarity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cmc: Option<Cmc>,
    #[serde(rename = "manaCost", skip_serializing_if = "Option::is_none")]
    pub mana_cost: Option<String>,
}

/// Converted mana cost, as a number or free text such as "gt3"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cmc {
    Number(u32),
    Text(String),
}

impl CardFilter {
    /// Accepts either `{"params": {...}}` or the filter object itself
    pub fn from_arguments(arguments: Value) -> Result<Self> {
        let params = match arguments {
            Value::Object(mut map) if map.contains_key("params") => {
                map.remove("params").unwrap_or(Value::Null)
            }
            other => other,
        };
        if params.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(params).context("invalid card search parameters")
    }
}

#[derive(Debug, Default, Deserialize)]
struct CardsResponse {
    #[serde(default)]
    cards: Vec<Card>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Card {
    name: Option<String>,
    set_name: Option<String>,
    mana_cost: Option<String>,
    cmc: Option<Value>,
    #[serde(default)]
    colors: Vec<String>,
    #[serde(default)]
    types: Vec<String>,
    text: Option<String>,
    power: Option<String>,
    toughness: Option<String>,
    rarity: Option<String>,
    flavor: Option<String>,
}

impl Card {
    fn format(&self) -> String {
        let cmc = match &self.cmc {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => "N/A".to_string(),
            Some(other) => other.to_string(),
        };
        let list = |items: &[String]| {
            if items.is_empty() {
                "None".to_string()
            } else {
                items.join(", ")
            }
        };

        format!(
            "Name: {}\nSet: {}\nMana Cost: {}\nCMC: {}\nColors: {}\nTypes: {}\nText: {}\nPower/Toughness: {}/{}\nRarity: {}\nFlavor: {}\n",
            self.name.as_deref().unwrap_or("Unknown"),
            self.set_name.as_deref().unwrap_or("Unknown Set"),
            self.mana_cost.as_deref().unwrap_or("N/A"),
            cmc,
            list(&self.colors),
            list(&self.types),
            self.text.as_deref().unwrap_or("No text provided"),
            self.power.as_deref().unwrap_or("N/A"),
            self.toughness.as_deref().unwrap_or("N/A"),
            self.rarity.as_deref().unwrap_or("N/A"),
            self.flavor.as_deref().unwrap_or("No flavor text"),
        )
    }
}

fn format_cards(cards: &[Card]) -> String {
    if cards.is_empty() {
        return "No cards found.".to_string();
    }
    cards.iter().map(Card::format).collect::<Vec<_>>().join("\n")
}

/// `mtg_search`: Magic: The Gathering card lookup
pub struct CardSearchTool {
    http: reqwest::Client,
    base_url: String,
}

impl CardSearchTool {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: MTG_API_BASE.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub async fn search(&self, filter: &CardFilter) -> Result<String> {
        let url = format!("{}/cards", self.base_url);
        tracing::debug!("Searching cards: {} {:?}", url, filter);

        let response = self
            .http
            .get(&url)
            .query(filter)
            .send()
            .await
            .context("card search request failed")?
            .error_for_status()
            .context("card search returned an error status")?;

        let body: CardsResponse = response
            .json()
            .await
            .context("failed to parse card search response")?;

        Ok(format_cards(&body.cards))
    }
}

impl Default for CardSearchTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToolHandler for CardSearchTool {
    fn definition(&self) -> Tool {
        Tool::new(
            "mtg_search",
            "Searches for Magic: The Gathering cards using the magicthegathering.io API. \
             Returns the details of every matching card.",
            json!({
                "type": "object",
                "properties": {
                    "params": {
                        "type": "object",
                        "properties": {
                            "name": {"type": "string"},
                            "set": {"type": "string"},
                            "types": {"type": "string", "description": "Comma-separated list"},
                            "subtypes": {"type": "string"},
                            "colors": {"type": "string", "description": "Comma-separated list"},
                            "rarity": {"type": "string"},
                            "cmc": {"type": ["integer", "string"]},
                            "manaCost": {"type": "string"}
                        }
                    }
                },
                "required": ["params"]
            }),
        )
    }

    async fn call(&self, arguments: Value) -> Result<String> {
        let filter = CardFilter::from_arguments(arguments)?;
        self.search(&filter).await
    }
}
