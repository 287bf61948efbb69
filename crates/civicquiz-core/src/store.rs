//! In-memory question store.
//!
//! Questions are read once from a JSON file at startup and never written
//! afterwards, so the store can be shared across request handlers without
//! locking.

use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::model::{Question, QuestionId};

/// Read-only collection of practice questions.
#[derive(Debug, Clone, Default)]
pub struct QuestionStore {
    questions: Vec<Question>,
}

impl QuestionStore {
    /// Load questions from a JSON file.
    ///
    /// A missing or malformed file yields an empty store; the problem is
    /// logged and startup continues.
    pub fn load(path: &Path) -> Self {
        match read_question_file(path) {
            Ok(questions) => {
                tracing::info!(
                    path = %path.display(),
                    count = questions.len(),
                    "loaded questions"
                );
                Self { questions }
            }
            Err(e) => {
                tracing::warn!("no questions loaded: {e:#}");
                Self::default()
            }
        }
    }

    /// Build a store from questions already in memory.
    pub fn from_questions(questions: Vec<Question>) -> Self {
        Self { questions }
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Draw up to `count` distinct questions at random, optionally restricted
    /// to one category. An empty category string means no filter.
    pub fn sample(&self, count: usize, category: Option<&str>) -> Vec<Question> {
        self.sample_with_rng(&mut rand::thread_rng(), count, category)
    }

    /// Like [`sample`](Self::sample) with a caller-supplied random source.
    pub fn sample_with_rng<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        count: usize,
        category: Option<&str>,
    ) -> Vec<Question> {
        let mut pool: Vec<&Question> = match category.filter(|c| !c.is_empty()) {
            Some(category) => self
                .questions
                .iter()
                .filter(|q| q.category == category)
                .collect(),
            None => self.questions.iter().collect(),
        };

        let (chosen, _) = pool.partial_shuffle(rng, count);
        chosen.iter().map(|q| (*q).clone()).collect()
    }

    /// Distinct categories, sorted lexicographically.
    pub fn categories(&self) -> Vec<String> {
        self.questions
            .iter()
            .map(|q| q.category.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Read and parse a question file, failing on any I/O or format error.
pub fn read_question_file(path: &Path) -> Result<Vec<Question>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read question file: {}", path.display()))?;

    parse_questions(&content)
        .with_context(|| format!("failed to parse question file: {}", path.display()))
}

/// Parse a JSON array of question records.
pub fn parse_questions(content: &str) -> Result<Vec<Question>> {
    let questions: Vec<Question> = serde_json::from_str(content)?;
    Ok(questions)
}

/// A warning from question set validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The question ID (if applicable).
    pub question_id: Option<QuestionId>,
    /// Warning message.
    pub message: String,
}

/// Check a question set for records that would grade poorly.
pub fn validate_questions(questions: &[Question]) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if questions.is_empty() {
        warnings.push(ValidationWarning {
            question_id: None,
            message: "question set is empty".into(),
        });
    }

    let mut seen_ids = HashSet::new();
    for q in questions {
        if !seen_ids.insert(&q.id) {
            warnings.push(ValidationWarning {
                question_id: Some(q.id.clone()),
                message: format!("duplicate question ID: {}", q.id),
            });
        }
    }

    for q in questions {
        if q.answer.is_empty() {
            warnings.push(ValidationWarning {
                question_id: Some(q.id.clone()),
                message: "no acceptable answers; every answer will be graded incorrect".into(),
            });
        } else if q.answer.iter().any(|a| a.trim().is_empty()) {
            // A blank acceptable answer is a substring of every user answer.
            warnings.push(ValidationWarning {
                question_id: Some(q.id.clone()),
                message: "blank acceptable answer matches any input".into(),
            });
        }
    }

    for q in questions {
        if q.question.trim().is_empty() {
            warnings.push(ValidationWarning {
                question_id: Some(q.id.clone()),
                message: "question text is empty".into(),
            });
        }
        if q.category.trim().is_empty() {
            warnings.push(ValidationWarning {
                question_id: Some(q.id.clone()),
                message: "category is empty".into(),
            });
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::io::Write;

    fn question(id: u64, category: &str) -> Question {
        Question::new(
            id,
            category,
            format!("Question {id}?"),
            vec![format!("answer {id}")],
        )
    }

    fn store() -> QuestionStore {
        QuestionStore::from_questions(vec![
            question(1, "History"),
            question(2, "Government"),
            question(3, "History"),
            question(4, "Geography"),
            question(5, "History"),
            question(6, "Government"),
        ])
    }

    #[test]
    fn sample_caps_at_available_in_category() {
        let store = store();
        let sampled = store.sample(5, Some("History"));
        assert_eq!(sampled.len(), 3);
        assert!(sampled.iter().all(|q| q.category == "History"));

        let mut ids: Vec<_> = sampled.iter().map(|q| q.id.to_string()).collect();
        ids.sort();
        assert_eq!(ids, vec!["1", "3", "5"]);
    }

    #[test]
    fn sample_respects_count() {
        let store = store();
        for count in 0..=6 {
            assert_eq!(store.sample(count, None).len(), count);
        }
        assert_eq!(store.sample(100, None).len(), 6);
    }

    #[test]
    fn sample_has_no_duplicates() {
        let store = store();
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..50 {
            let sampled = store.sample_with_rng(&mut rng, 4, None);
            let ids: HashSet<_> = sampled.iter().map(|q| q.id.clone()).collect();
            assert_eq!(ids.len(), sampled.len());
        }
    }

    #[test]
    fn sample_is_not_fixed_order() {
        let store = store();
        let mut rng = StdRng::seed_from_u64(7);
        let firsts: HashSet<_> = (0..50)
            .map(|_| store.sample_with_rng(&mut rng, 6, None)[0].id.clone())
            .collect();
        assert!(firsts.len() > 1, "shuffle should vary the first question");
    }

    #[test]
    fn empty_category_means_no_filter() {
        assert_eq!(store().sample(10, Some("")).len(), 6);
    }

    #[test]
    fn unknown_category_is_empty() {
        assert!(store().sample(10, Some("Economics")).is_empty());
    }

    #[test]
    fn categories_sorted_and_distinct() {
        assert_eq!(
            store().categories(),
            vec!["Geography", "Government", "History"]
        );
        assert!(QuestionStore::default().categories().is_empty());
    }

    #[test]
    fn load_valid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"id": 1, "category": "Civics", "question": "How many amendments?", "answer": ["27", "twenty-seven"]}}]"#
        )
        .unwrap();

        let store = QuestionStore::load(file.path());
        assert_eq!(store.len(), 1);
        assert_eq!(store.questions()[0].answer.len(), 2);
    }

    #[test]
    fn load_file_with_mixed_id_forms() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"id": 1, "category": "History", "question": "a?", "answer": ["a"]}},
                {{"id": -2, "category": "History", "question": "b?", "answer": ["b"]}},
                {{"id": 3.0, "category": "Geography", "question": "c?", "answer": ["c"]}},
                {{"id": "q-4", "category": "Geography", "question": "d?", "answer": ["d"]}}
            ]"#
        )
        .unwrap();

        let store = QuestionStore::load(file.path());
        assert_eq!(store.len(), 4);
        assert_eq!(store.categories(), vec!["Geography", "History"]);
    }

    #[test]
    fn load_missing_file_is_empty() {
        let store = QuestionStore::load(Path::new("/nonexistent/questions.json"));
        assert!(store.is_empty());
    }

    #[test]
    fn load_malformed_file_is_empty() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(QuestionStore::load(file.path()).is_empty());
    }

    #[test]
    fn read_question_file_reports_path() {
        let err = read_question_file(Path::new("missing-questions.json")).unwrap_err();
        assert!(format!("{err:#}").contains("missing-questions.json"));
    }

    #[test]
    fn validate_flags_problems() {
        let mut dup = question(1, "History");
        dup.answer.clear();
        let mut blank = question(2, " ");
        blank.question = String::new();

        let warnings = validate_questions(&[question(1, "History"), dup, blank]);
        let messages: Vec<_> = warnings.iter().map(|w| w.message.as_str()).collect();

        assert!(messages.iter().any(|m| m.contains("duplicate question ID: 1")));
        assert!(messages.iter().any(|m| m.contains("no acceptable answers")));
        assert!(messages.iter().any(|m| m.contains("question text is empty")));
        assert!(messages.iter().any(|m| m.contains("category is empty")));
    }

    #[test]
    fn validate_clean_set() {
        assert!(validate_questions(store().questions()).is_empty());
    }
}
