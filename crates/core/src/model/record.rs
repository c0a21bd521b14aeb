use serde::{Deserialize, Serialize};

use crate::model::AnswerAnalysis;

/// One answered question inside a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionEntry {
    /// Text of the question this answer responds to.
    pub question: String,
    pub answer: String,
    pub analysis: AnswerAnalysis,
}

/// Ordered response history for one interview session.
///
/// Entries are append-only; insertion order is question order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionRecord {
    entries: Vec<SessionEntry>,
}

impl SessionRecord {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, entry: SessionEntry) {
        self.entries.push(entry);
    }

    #[must_use]
    pub fn entries(&self) -> &[SessionEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn last(&self) -> Option<&SessionEntry> {
        self.entries.last()
    }

    pub fn scores(&self) -> impl Iterator<Item = u8> + '_ {
        self.entries.iter().map(|e| e.analysis.score)
    }
}

impl FromIterator<SessionEntry> for SessionRecord {
    fn from_iter<T: IntoIterator<Item = SessionEntry>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
