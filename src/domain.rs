use serde::Deserialize;

// Domain data structures shared across modules.

const DEFAULT_SOURCE_BRANCH: &str = "main";
const UNKNOWN_FIELD: &str = "unknown";

/// One page of the activity stream as reported by the server.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PageResponse {
    #[serde(default)]
    pub events: Option<Vec<EventRecord>>,
    #[serde(default)]
    pub has_next: bool,
    #[serde(default)]
    pub total_count: Option<u64>,
    #[serde(default)]
    pub current_page: Option<u32>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct EventRecord {
    #[serde(default)]
    pub author: Option<String>,
    pub action: EventAction,
    #[serde(default)]
    pub from_branch: Option<String>,
    #[serde(default)]
    pub to_branch: Option<String>,
    #[serde(default)]
    pub timestamp: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum EventAction {
    Push,
    Merge,
    PullRequest,
    Other(String),
}

impl From<String> for EventAction {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "PUSH" => EventAction::Push,
            "MERGE" => EventAction::Merge,
            "PULL_REQUEST" => EventAction::PullRequest,
            _ => EventAction::Other(raw),
        }
    }
}

impl EventAction {
    pub fn label(&self) -> &str {
        match self {
            EventAction::Push => "PUSH",
            EventAction::Merge => "MERGE",
            EventAction::PullRequest => "PULL_REQUEST",
            EventAction::Other(raw) => raw,
        }
    }

    /// Lower-cased label with every underscore stripped, e.g. `pullrequest`.
    pub fn style_category(&self) -> String {
        self.label().to_lowercase().replace('_', "")
    }

    pub fn badge(&self) -> BadgeStyle {
        match self {
            EventAction::Push | EventAction::Merge => BadgeStyle::Primary,
            EventAction::PullRequest => BadgeStyle::Outline,
            EventAction::Other(_) => BadgeStyle::Outline,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BadgeStyle {
    Primary,
    Outline,
}

/// Display model for a single event card.
#[derive(Clone, Debug, PartialEq)]
pub struct EventCard {
    pub style_category: String,
    pub badge: BadgeStyle,
    pub author: String,
    pub action: String,
    pub from_branch: String,
    pub to_branch: String,
    pub timestamp: String,
}

impl EventCard {
    pub fn from_record(record: &EventRecord) -> Self {
        Self {
            style_category: record.action.style_category(),
            badge: record.action.badge(),
            author: present_or(record.author.as_deref(), UNKNOWN_FIELD),
            action: record.action.label().to_owned(),
            from_branch: present_or(record.from_branch.as_deref(), DEFAULT_SOURCE_BRANCH),
            to_branch: present_or(record.to_branch.as_deref(), UNKNOWN_FIELD),
            timestamp: record.timestamp.clone(),
        }
    }
}

fn present_or(value: Option<&str>, fallback: &str) -> String {
    match value {
        Some(text) if !text.is_empty() => text.to_owned(),
        _ => fallback.to_owned(),
    }
}

// -------------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------------
