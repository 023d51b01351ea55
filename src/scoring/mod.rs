//! Scoring & classification engine.
//!
//! Answers flow through aggregation, classification, ranking, flag rules and
//! zone synthesis into one `Profile`, which the score store upserts keyed by
//! session id.

pub mod aggregate;
pub mod classify;
pub mod flags;
pub mod profile;
pub mod rank;
pub mod ruleset;
pub mod zones;

use tracing::{debug, info};

use crate::error::{ScoringError, StoreError};
use crate::models::{AnswerRecord, AssessmentScore};

use profile::{assemble, Profile};
use ruleset::Ruleset;

/// Read side of the response store.
pub trait AnswerSource {
    /// Every catalog item in presentation order, paired with the session's
    /// answer when one exists.
    fn get_answers(&self, session_id: &str) -> Result<Vec<AnswerRecord>, StoreError>;
}

/// Persistence for assessment scores, one row per session.
pub trait ScoreStore {
    /// Insert or fully overwrite the session's score.
    fn upsert_score(&self, session_id: &str, profile: &Profile)
        -> Result<AssessmentScore, StoreError>;

    fn get_score(&self, session_id: &str) -> Result<Option<AssessmentScore>, StoreError>;

    /// Run `compute` and upsert its profile as one unit of work.
    ///
    /// Stores sharing a connection with the answer source override this so
    /// the answers read inside `compute` and the write commit together.
    fn save_with<F>(&self, session_id: &str, compute: F) -> Result<AssessmentScore, ScoringError>
    where
        F: FnOnce() -> Result<Profile, ScoringError>,
    {
        let profile = compute()?;
        Ok(self.upsert_score(session_id, &profile)?)
    }
}

impl<T: AnswerSource + ?Sized> AnswerSource for &T {
    fn get_answers(&self, session_id: &str) -> Result<Vec<AnswerRecord>, StoreError> {
        (**self).get_answers(session_id)
    }
}

impl<T: ScoreStore + ?Sized> ScoreStore for &T {
    fn upsert_score(
        &self,
        session_id: &str,
        profile: &Profile,
    ) -> Result<AssessmentScore, StoreError> {
        (**self).upsert_score(session_id, profile)
    }

    fn get_score(&self, session_id: &str) -> Result<Option<AssessmentScore>, StoreError> {
        (**self).get_score(session_id)
    }

    fn save_with<F>(&self, session_id: &str, compute: F) -> Result<AssessmentScore, ScoringError>
    where
        F: FnOnce() -> Result<Profile, ScoringError>,
    {
        (**self).save_with(session_id, compute)
    }
}

pub struct ScoringService<A, S> {
    answers: A,
    scores: S,
    ruleset: Ruleset,
}

impl<A: AnswerSource, S: ScoreStore> ScoringService<A, S> {
    pub fn new(answers: A, scores: S, ruleset: Ruleset) -> Self {
        Self {
            answers,
            scores,
            ruleset,
        }
    }

    /// Score the session from its current answers without persisting.
    pub fn compute_profile(&self, session_id: &str) -> Result<Profile, ScoringError> {
        let answers = self.answers.get_answers(session_id)?;
        let answered = answers.iter().filter(|a| a.value.is_some()).count();
        if answered == 0 {
            return Err(ScoringError::NoAnswers(session_id.to_string()));
        }
        debug!(session_id, items = answers.len(), answered, "scoring session");
        Ok(assemble(&answers, &self.ruleset))
    }

    /// Recompute and persist. Never returns a cached score.
    pub fn calculate_and_save_scores(
        &self,
        session_id: &str,
    ) -> Result<AssessmentScore, ScoringError> {
        let record = self
            .scores
            .save_with(session_id, || self.compute_profile(session_id))?;
        info!(
            session_id,
            holland_code = record.holland_code.as_deref().unwrap_or("-"),
            riasec_complete = record.riasec_complete,
            big_five_complete = record.big_five_complete,
            behavioral_complete = record.behavioral_complete,
            ruleset = %self.ruleset.version,
            "scores saved"
        );
        Ok(record)
    }

    pub fn get_scores_for_response(
        &self,
        session_id: &str,
    ) -> Result<Option<AssessmentScore>, ScoringError> {
        Ok(self.scores.get_score(session_id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::codec;
    use crate::models::{Item, Module, RawValue, ScaleType};
    use std::cell::RefCell;
    use std::collections::{BTreeMap, HashMap};

    // Synthetic response store: a fixed catalog plus per-session answers
    struct FakeAnswers {
        items: Vec<Item>,
        answers: RefCell<HashMap<(String, String), RawValue>>,
    }

    impl FakeAnswers {
        fn new(items: Vec<Item>) -> Self {
            Self {
                items,
                answers: RefCell::new(HashMap::new()),
            }
        }

        fn answer(&self, session: &str, item_id: &str, value: RawValue) {
            self.answers
                .borrow_mut()
                .insert((session.to_string(), item_id.to_string()), value);
        }

        fn answer_all(&self, session: &str, module: Option<Module>, likert: f64) {
            for item in &self.items {
                if module.is_some_and(|m| m != item.module) {
                    continue;
                }
                self.answer(session, &item.item_id, default_value(item, likert));
            }
        }
    }

    fn default_value(item: &Item, likert: f64) -> RawValue {
        let values: Vec<String> = item.options.iter().map(|o| o.value.clone()).collect();
        match item.scale_type {
            ScaleType::Likert5 => RawValue::Scalar(likert),
            ScaleType::ForcedChoice => RawValue::Selected(values[..1].to_vec()),
            ScaleType::Ranking => RawValue::Ranked(values),
        }
    }

    impl AnswerSource for FakeAnswers {
        fn get_answers(&self, session_id: &str) -> Result<Vec<AnswerRecord>, StoreError> {
            let answers = self.answers.borrow();
            Ok(self
                .items
                .iter()
                .map(|item| AnswerRecord {
                    item: item.clone(),
                    value: answers
                        .get(&(session_id.to_string(), item.item_id.clone()))
                        .cloned(),
                })
                .collect())
        }
    }

    // Stores the encoded payload like the database does
    #[derive(Default)]
    struct FakeScores {
        rows: RefCell<BTreeMap<String, (AssessmentScore, String)>>,
        writes: RefCell<usize>,
    }

    impl ScoreStore for FakeScores {
        fn upsert_score(
            &self,
            session_id: &str,
            profile: &Profile,
        ) -> Result<AssessmentScore, StoreError> {
            *self.writes.borrow_mut() += 1;
            let payload = codec::encode(&profile.detail)?;
            let mut rows = self.rows.borrow_mut();
            let id = rows.get(session_id).map(|r| r.0.id).unwrap_or(rows.len() as i64 + 1);
            let record = AssessmentScore {
                id,
                session_id: session_id.to_string(),
                riasec: profile.riasec,
                holland_code: profile.holland_code.map(|c| c.to_string()),
                riasec_complete: profile.completion.riasec,
                big_five: profile.big_five,
                big_five_complete: profile.completion.big_five,
                behavioral: profile.behavioral,
                behavioral_complete: profile.completion.behavioral,
                detail: codec::decode(&payload)?,
                calculated_at: "t0".to_string(),
                last_updated: format!("t{}", self.writes.borrow()),
            };
            rows.insert(session_id.to_string(), (record.clone(), payload));
            Ok(record)
        }

        fn get_score(&self, session_id: &str) -> Result<Option<AssessmentScore>, StoreError> {
            Ok(self.rows.borrow().get(session_id).map(|r| r.0.clone()))
        }
    }

    fn service<'a>(
        source: &'a FakeAnswers,
        store: &'a FakeScores,
    ) -> ScoringService<&'a FakeAnswers, &'a FakeScores> {
        ScoringService::new(source, store, Ruleset::standard())
    }

    #[test]
    fn session_without_answers_is_rejected() {
        let source = FakeAnswers::new(catalog::standard_items());
        let store = FakeScores::default();
        let err = service(&source, &store)
            .calculate_and_save_scores("nobody")
            .unwrap_err();
        assert!(matches!(err, ScoringError::NoAnswers(ref s) if s == "nobody"));
        assert!(store.rows.borrow().is_empty());
    }

    #[test]
    fn lookup_does_not_compute() {
        let source = FakeAnswers::new(catalog::standard_items());
        source.answer_all("s1", None, 4.0);
        let store = FakeScores::default();
        let svc = service(&source, &store);

        assert!(svc.get_scores_for_response("s1").unwrap().is_none());
        assert_eq!(*store.writes.borrow(), 0);

        svc.calculate_and_save_scores("s1").unwrap();
        assert!(svc.get_scores_for_response("s1").unwrap().is_some());
        assert_eq!(*store.writes.borrow(), 1);
    }

    #[test]
    fn full_session_completes_every_module() {
        let source = FakeAnswers::new(catalog::standard_items());
        source.answer_all("s1", None, 4.0);
        let store = FakeScores::default();
        let record = service(&source, &store)
            .calculate_and_save_scores("s1")
            .unwrap();
        assert!(record.riasec_complete);
        assert!(record.big_five_complete);
        assert!(record.behavioral_complete);
        assert!(record.holland_code.is_some());
        assert!(record.detail.warnings.is_empty());
    }

    #[test]
    fn completion_flips_only_after_last_item() {
        let items = catalog::standard_items();
        let big_five: Vec<Item> = items
            .iter()
            .filter(|i| i.module == Module::BigFive)
            .cloned()
            .collect();
        let source = FakeAnswers::new(items);
        let store = FakeScores::default();
        let svc = service(&source, &store);

        for (n, item) in big_five.iter().enumerate() {
            source.answer("s1", &item.item_id, RawValue::Scalar(3.0));
            let record = svc.calculate_and_save_scores("s1").unwrap();
            let last = n + 1 == big_five.len();
            assert_eq!(record.big_five_complete, last, "after {} answers", n + 1);
            assert!(!record.riasec_complete);
            assert!(!record.behavioral_complete);
        }
        assert_eq!(store.rows.borrow().len(), 1);
    }

    #[test]
    fn missing_riasec_domain_withholds_code_but_scores_the_rest() {
        let items = catalog::standard_items();
        let source = FakeAnswers::new(items.clone());
        source.answer_all("s1", Some(Module::Riasec), 4.0);
        // drop every answer that feeds Social: its Likert items plus the
        // multi-domain items that carry a Social option
        let social: Vec<String> = items
            .iter()
            .filter(|i| {
                i.domain.as_deref() == Some("S") || i.options.iter().any(|o| o.domain == "S")
            })
            .map(|i| i.item_id.clone())
            .collect();
        source
            .answers
            .borrow_mut()
            .retain(|(_, item_id), _| !social.contains(item_id));

        let store = FakeScores::default();
        let record = service(&source, &store)
            .calculate_and_save_scores("s1")
            .unwrap();
        assert!(record.holland_code.is_none());
        assert!(!record.riasec_complete);
        assert!(record.riasec.social.is_none());
        assert!(record.riasec.realistic.is_some());
    }

    #[test]
    fn recomputation_is_idempotent() {
        let source = FakeAnswers::new(catalog::standard_items());
        source.answer_all("s1", None, 2.0);
        let store = FakeScores::default();
        let svc = service(&source, &store);

        let first = svc.calculate_and_save_scores("s1").unwrap();
        let first_payload = store.rows.borrow()["s1"].1.clone();
        let second = svc.calculate_and_save_scores("s1").unwrap();
        let second_payload = store.rows.borrow()["s1"].1.clone();

        assert_eq!(first_payload, second_payload);
        assert_eq!(first.id, second.id);
        assert_eq!(
            AssessmentScore {
                last_updated: String::new(),
                ..first
            },
            AssessmentScore {
                last_updated: String::new(),
                ..second
            }
        );
    }

    // Records the order of reads and writes around the unit of work
    #[derive(Default)]
    struct Journal(RefCell<Vec<&'static str>>);

    struct JournaledAnswers<'a> {
        inner: &'a FakeAnswers,
        log: &'a Journal,
    }

    impl AnswerSource for JournaledAnswers<'_> {
        fn get_answers(&self, session_id: &str) -> Result<Vec<AnswerRecord>, StoreError> {
            self.log.0.borrow_mut().push("read");
            self.inner.get_answers(session_id)
        }
    }

    struct JournaledScores<'a> {
        inner: &'a FakeScores,
        log: &'a Journal,
    }

    impl ScoreStore for JournaledScores<'_> {
        fn upsert_score(
            &self,
            session_id: &str,
            profile: &Profile,
        ) -> Result<AssessmentScore, StoreError> {
            self.log.0.borrow_mut().push("write");
            self.inner.upsert_score(session_id, profile)
        }

        fn get_score(&self, session_id: &str) -> Result<Option<AssessmentScore>, StoreError> {
            self.inner.get_score(session_id)
        }

        fn save_with<F>(
            &self,
            session_id: &str,
            compute: F,
        ) -> Result<AssessmentScore, ScoringError>
        where
            F: FnOnce() -> Result<Profile, ScoringError>,
        {
            self.log.0.borrow_mut().push("begin");
            let result = compute().and_then(|p| Ok(self.upsert_score(session_id, &p)?));
            self.log
                .0
                .borrow_mut()
                .push(if result.is_ok() { "commit" } else { "rollback" });
            result
        }
    }

    #[test]
    fn answers_are_read_inside_the_save_unit() {
        let source = FakeAnswers::new(catalog::standard_items());
        source.answer_all("s1", None, 3.0);
        let store = FakeScores::default();
        let log = Journal::default();
        let svc = ScoringService::new(
            JournaledAnswers {
                inner: &source,
                log: &log,
            },
            JournaledScores {
                inner: &store,
                log: &log,
            },
            Ruleset::standard(),
        );

        svc.calculate_and_save_scores("s1").unwrap();
        assert_eq!(*log.0.borrow(), ["begin", "read", "write", "commit"]);

        log.0.borrow_mut().clear();
        assert!(svc.calculate_and_save_scores("empty").is_err());
        assert_eq!(*log.0.borrow(), ["begin", "read", "rollback"]);
    }

    #[test]
    fn changed_answer_overwrites_whole_record() {
        let source = FakeAnswers::new(catalog::standard_items());
        source.answer_all("s1", None, 1.0);
        let store = FakeScores::default();
        let svc = service(&source, &store);
        let before = svc.calculate_and_save_scores("s1").unwrap();

        source.answer_all("s1", Some(Module::Behavioral), 5.0);
        let after = svc.calculate_and_save_scores("s1").unwrap();

        assert_eq!(before.id, after.id);
        assert_ne!(before.behavioral, after.behavioral);
        assert_eq!(before.riasec, after.riasec);
        assert_eq!(store.rows.borrow().len(), 1);
    }
}
