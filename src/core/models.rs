use std::fmt;

use chrono::{
    DateTime,
    Utc,
};
use serde::{
    Deserialize,
    Serialize,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: String,
    pub term: String,
    pub definition: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabSet {
    pub id: String,
    pub name: String,
    pub cards: Vec<Card>,
}

impl VocabSet {
    pub fn card(&self, card_id: &str) -> Option<&Card> {
        self.cards.iter().find(|card| card.id == card_id)
    }

    pub fn card_count_label(&self) -> String {
        match self.cards.len() {
            1 => "1 card".to_string(),
            count => format!("{} cards", count),
        }
    }
}

/// Partial update for a set. Only the name is editable today.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl SetPatch {
    pub fn rename(name: impl Into<String>) -> Self {
        Self { name: Some(name.into()) }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
    }

    pub fn apply(&self, set: &mut VocabSet) {
        if let Some(name) = &self.name {
            set.name = name.clone();
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: UserId,
    #[serde(default)]
    pub email: Option<String>,
    pub access_token: String,
}

impl Session {
    pub fn display_name(&self) -> &str {
        self.email.as_deref().unwrap_or(&self.user_id.0)
    }
}

// Rows as the backend stores them

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardRow {
    pub id: String,
    pub set_id: String,
    pub term: String,
    pub definition: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetRow {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Present only when the select embeds the child table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cards: Option<Vec<CardRow>>,
}

impl From<CardRow> for Card {
    fn from(row: CardRow) -> Self {
        Card { id: row.id, term: row.term, definition: row.definition }
    }
}

impl From<SetRow> for VocabSet {
    fn from(row: SetRow) -> Self {
        VocabSet {
            id: row.id,
            name: row.name,
            cards: row.cards.unwrap_or_default().into_iter().map(Card::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Table {
    Sets,
    Cards,
}

impl Table {
    pub fn name(&self) -> &'static str {
        match self {
            Table::Sets => "sets",
            Table::Cards => "cards",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "sets" => Some(Table::Sets),
            "cards" => Some(Table::Cards),
            _ => None,
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Row {
    Set(SetRow),
    Card(CardRow),
}

/// One change notification from a table feed.
///
/// `record` is the new row for inserts and updates. Deletes usually only carry
/// the old primary key in `old_id`. Either may be missing when the backend
/// sends a trimmed payload.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub table: Table,
    pub kind: ChangeKind,
    pub record: Option<Row>,
    pub old_id: Option<String>,
    pub commit_timestamp: DateTime<Utc>,
}

impl ChangeEvent {
    pub fn id(&self) -> Option<&str> {
        match &self.record {
            Some(Row::Set(row)) => Some(row.id.as_str()),
            Some(Row::Card(row)) => Some(row.id.as_str()),
            None => self.old_id.as_deref(),
        }
    }
}
