//! Content items and the card payload they are decoded from.
//!
//! The cards API returns heterogeneous records (repos, papers, models,
//! articles). Only the fields that feed classification and windowing are
//! kept: an identifier, a creation timestamp and the text fields.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::AnalysisResult;

/// Card identifier as sent by the API (string or integer).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CardId {
    /// Numeric identifier.
    Number(i64),
    /// String identifier.
    Text(String),
}

impl std::fmt::Display for CardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// One record from `GET /api/v1/cards`.
///
/// Optional arrays may be absent or `null`; both decode as empty.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Card {
    /// Card identifier.
    pub id: CardId,
    /// ISO-8601 creation timestamp. Non-string values decode as `None`.
    #[serde(default, deserialize_with = "string_or_none")]
    pub created_at: Option<String>,
    /// Title.
    #[serde(default)]
    pub title: Option<String>,
    /// Summary text.
    #[serde(default)]
    pub summary: Option<String>,
    /// Technology stack tags.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tech_stack: Vec<String>,
    /// Localized tags.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub chinese_tags: Vec<String>,
    /// AI category tags.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub ai_category: Vec<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

fn string_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Some(s),
        _ => None,
    })
}

/// Response envelopes the cards endpoint has been seen to use.
#[derive(Deserialize)]
#[serde(untagged)]
enum CardsPayload {
    Bare(Vec<Card>),
    Data { data: Vec<Card> },
    Items { items: Vec<Card> },
}

/// Decode a cards response body.
///
/// Accepts a bare JSON array as well as `{"data": [...]}` and
/// `{"items": [...]}` envelopes.
pub fn parse_cards(body: &str) -> AnalysisResult<Vec<Card>> {
    let payload: CardsPayload = serde_json::from_str(body)?;
    Ok(match payload {
        CardsPayload::Bare(cards)
        | CardsPayload::Data { data: cards }
        | CardsPayload::Items { items: cards } => cards,
    })
}

/// One normalized piece of aggregated content.
///
/// Immutable for the duration of an analysis pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ContentItem {
    /// Unique identifier.
    pub id: String,
    /// Creation timestamp; `None` when the source value did not parse.
    #[schemars(with = "Option<String>")]
    pub created_at: Option<DateTime<Utc>>,
    /// Strings that contribute to keyword matching.
    pub text_fields: Vec<String>,
}

impl ContentItem {
    /// Create an item from already-normalized parts.
    pub fn new<I, S>(id: impl Into<String>, created_at: Option<DateTime<Utc>>, text: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            created_at,
            text_fields: text.into_iter().map(Into::into).collect(),
        }
    }

    /// Normalize a card: title, summary, then every tag array.
    pub fn from_card(card: Card) -> Self {
        let created_at = card.created_at.as_deref().and_then(parse_timestamp);
        let mut text_fields = Vec::with_capacity(
            2 + card.chinese_tags.len() + card.tech_stack.len() + card.ai_category.len(),
        );
        text_fields.extend(card.title);
        text_fields.extend(card.summary);
        text_fields.extend(card.chinese_tags);
        text_fields.extend(card.tech_stack);
        text_fields.extend(card.ai_category);

        Self {
            id: card.id.to_string(),
            created_at,
            text_fields,
        }
    }

    /// Lower-cased, space-joined concatenation of all text fields.
    pub fn match_text(&self) -> String {
        self.text_fields.join(" ").to_lowercase()
    }
}

/// Decode a cards response body straight into content items.
pub fn items_from_json(body: &str) -> AnalysisResult<Vec<ContentItem>> {
    Ok(parse_cards(body)?
        .into_iter()
        .map(ContentItem::from_card)
        .collect())
}

/// Parse a creation timestamp leniently.
///
/// Tries RFC 3339 first, then naive date-times (taken as UTC), then a bare
/// date at midnight UTC. Returns `None` for anything else.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
