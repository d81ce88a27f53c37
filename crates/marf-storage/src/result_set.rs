use marf_core::SubjectId;
use rand::{Rng, seq::IndexedRandom};
use serde::{Deserialize, Serialize};

/// One scored candidate of a classification pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEntry {
    subject_id: SubjectId,
    outcome: f64,
    description: String,
}

impl ResultEntry {
    /// Creates an entry with the default `ID=<id>, outcome=<outcome>` description.
    #[must_use]
    pub fn new(subject_id: SubjectId, outcome: f64) -> Self {
        Self {
            subject_id,
            outcome,
            description: format!("ID={subject_id}, outcome={outcome}"),
        }
    }

    #[must_use]
    pub fn with_description(
        subject_id: SubjectId,
        outcome: f64,
        description: impl Into<String>,
    ) -> Self {
        Self {
            subject_id,
            outcome,
            description: description.into(),
        }
    }

    #[must_use]
    pub fn subject_id(&self) -> SubjectId {
        self.subject_id
    }

    /// Distance, similarity or probability, depending on the classifier.
    #[must_use]
    pub fn outcome(&self) -> f64 {
        self.outcome
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }
}

/// Every candidate scored during one classification pass, in evaluation order.
///
/// Which entry is "best" depends on the classifier: distance-style classifiers pick the
/// [`minimum()`](Self::minimum), similarity- and probability-style ones the
/// [`maximum()`](Self::maximum). Ties resolve to the earliest entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    entries: Vec<ResultEntry>,
}

impl ResultSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_result(&mut self, subject_id: SubjectId, outcome: f64) {
        self.entries.push(ResultEntry::new(subject_id, outcome));
    }

    pub fn add_result_with_description(
        &mut self,
        subject_id: SubjectId,
        outcome: f64,
        description: impl Into<String>,
    ) {
        self.entries
            .push(ResultEntry::with_description(subject_id, outcome, description));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
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
    pub fn entries(&self) -> &[ResultEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResultEntry> {
        self.entries.iter()
    }

    pub fn outcomes(&self) -> impl Iterator<Item = f64> + '_ {
        self.entries.iter().map(ResultEntry::outcome)
    }

    #[must_use]
    pub fn minimum(&self) -> Option<&ResultEntry> {
        self.entries
            .iter()
            .reduce(|best, e| if e.outcome < best.outcome { e } else { best })
    }

    #[must_use]
    pub fn maximum(&self) -> Option<&ResultEntry> {
        self.entries
            .iter()
            .reduce(|best, e| if e.outcome > best.outcome { e } else { best })
    }

    /// Runner-up by ascending outcome.
    #[must_use]
    pub fn second_minimum(&self) -> Option<&ResultEntry> {
        self.ascending().get(1).copied()
    }

    /// Runner-up by descending outcome.
    #[must_use]
    pub fn second_maximum(&self) -> Option<&ResultEntry> {
        self.descending().get(1).copied()
    }

    /// Middle entry by ascending outcome (upper middle for even sizes).
    #[must_use]
    pub fn average(&self) -> Option<&ResultEntry> {
        let sorted = self.ascending();
        sorted.get(sorted.len() / 2).copied()
    }

    /// Uniformly chosen entry.
    pub fn random<R>(&self, rng: &mut R) -> Option<&ResultEntry>
    where
        R: Rng + ?Sized,
    {
        self.entries.choose(rng)
    }

    /// Entries ordered by ascending outcome; ties keep evaluation order.
    #[must_use]
    pub fn ascending(&self) -> Vec<&ResultEntry> {
        let mut sorted = self.entries.iter().collect::<Vec<_>>();
        sorted.sort_by(|a, b| a.outcome.total_cmp(&b.outcome));
        sorted
    }

    /// Entries ordered by descending outcome; ties keep evaluation order.
    #[must_use]
    pub fn descending(&self) -> Vec<&ResultEntry> {
        let mut sorted = self.entries.iter().collect::<Vec<_>>();
        sorted.sort_by(|a, b| b.outcome.total_cmp(&a.outcome));
        sorted
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a ResultEntry;
    type IntoIter = std::slice::Iter<'a, ResultEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
