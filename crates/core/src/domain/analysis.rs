use serde::Serialize;

use crate::domain::order::AttributeKey;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DetailEntry {
    pub key: AttributeKey,
    pub label: String,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FooterLink {
    pub label: String,
    pub url: String,
}

/// Ordered detail entries, unique by key. The first request for a key wins;
/// later requests for the same key are dropped even if their label differs.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DetailList {
    entries: Vec<DetailEntry>,
}

impl DetailList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blank values are skipped and do not claim the key.
    pub fn request(&mut self, key: AttributeKey, label: &str, value: &str) -> bool {
        if value.is_empty() || self.contains(key) {
            return false;
        }
        self.entries.push(DetailEntry { key, label: label.to_owned(), value: value.to_owned() });
        true
    }

    pub fn contains(&self, key: AttributeKey) -> bool {
        self.entries.iter().any(|entry| entry.key == key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<DetailEntry> {
        self.entries
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AnalysisResult {
    pub order_name: String,
    pub header: String,
    pub narrative: Vec<String>,
    pub details: Vec<DetailEntry>,
    pub footer_links: Vec<FooterLink>,
}

#[cfg(test)]
mod tests {
    use super::DetailList;
    use crate::domain::order::AttributeKey;

    #[test]
    fn first_writer_wins_for_repeated_keys() {
        let mut details = DetailList::new();

        assert!(details.request(AttributeKey::ArrangedWith, "Arranged With", "Acme Supply"));
        assert!(!details.request(AttributeKey::ArrangedWith, "Reserved From", "Acme Supply"));

        let entries = details.into_entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].label, "Arranged With");
    }

    #[test]
    fn blank_values_do_not_claim_the_key() {
        let mut details = DetailList::new();

        assert!(!details.request(AttributeKey::ReturnNotes, "Return Notes", ""));
        assert!(details.is_empty());
        assert!(details.request(AttributeKey::ReturnNotes, "Return Notes", "box damaged"));
        assert_eq!(details.len(), 1);
    }
}
