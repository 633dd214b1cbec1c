use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const TITLE_WORDS: usize = 8;

/// One finished exchange: what the customer wrote and what was sent back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub persona: String,
    pub customer_message: String,
    pub final_response: String,
    pub title: String,
}

/// Session-scoped history, newest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResponseHistory {
    entries: Vec<HistoryEntry>,
}

impl ResponseHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, customer_message: &str, final_response: &str, persona: &str) -> &HistoryEntry {
        let entry = HistoryEntry {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            persona: persona.to_string(),
            customer_message: customer_message.trim().to_string(),
            final_response: final_response.trim().to_string(),
            title: history_title(customer_message),
        };
        self.entries.insert(0, entry);
        &self.entries[0]
    }

    pub fn list(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn get(&self, entry_id: &str) -> Option<&HistoryEntry> {
        self.entries.iter().find(|entry| entry.id == entry_id)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// First line of the trimmed message, cut to eight words with a trailing ellipsis.
pub fn history_title(customer_message: &str) -> String {
    let first_line = customer_message.trim().lines().next().unwrap_or_default();
    let words: Vec<&str> = first_line.split_whitespace().collect();
    if words.len() <= TITLE_WORDS {
        return first_line.to_string();
    }
    format!("{}…", words[..TITLE_WORDS].join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_title_truncates_long_first_line() {
        assert_eq!(
            history_title("  one two three four five six seven eight nine ten\nsecond line"),
            "one two three four five six seven eight…"
        );
        assert_eq!(history_title("Short question here\nmore"), "Short question here");
        assert_eq!(history_title(""), "");
    }

    #[test]
    fn test_newest_first_and_lookup() {
        let mut history = ResponseHistory::new();
        let first_id = history.add("first", "reply one", "support").id.clone();
        let second_id = history.add("  second  ", " reply two ", "support").id.clone();

        let listed: Vec<&str> = history.list().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(listed, vec![second_id.as_str(), first_id.as_str()]);

        let second = history.get(&second_id).unwrap();
        assert_eq!(second.customer_message, "second");
        assert_eq!(second.final_response, "reply two");
        assert!(history.get("missing").is_none());

        history.clear();
        assert!(history.is_empty());
    }
}
