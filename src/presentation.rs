//! Turns quiz state into map calls and form contents.
//!
//! The presenter makes no decisions of its own; it is told what happened by
//! the app and mirrors it onto a [`MapSurface`] and a [`QuizForm`].

pub mod form;
pub mod map;

use std::sync::Arc;

use crate::feature::{Feature, FeatureId};
use crate::quiz::{AnswerOutcome, Question, QuizSession, QuizType};

pub use form::{Feedback, QuizForm};
pub use map::{MapSurface, Marker, TerminalMap};

use map::{DEFAULT_STREET_STYLE, HIGHLIGHT_STYLE, QUESTION_ZOOM, STREET_QUIZ_BASE_STYLE};

#[derive(Debug, Default)]
pub struct Presenter {
    highlighted: Option<FeatureId>,
}

impl Presenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every street becomes a visible, clickable shape.
    pub fn register_streets<M: MapSurface>(&self, map: &mut M, features: &[Arc<Feature>]) {
        for feature in features {
            map.add_shape(feature.clone(), DEFAULT_STREET_STYLE);
        }
    }

    pub fn highlighted(&self) -> Option<FeatureId> {
        self.highlighted
    }

    /// Removes the previous question's highlight, markers and popup.
    pub fn clear_question<M: MapSurface>(&mut self, map: &mut M) {
        if let Some(id) = self.highlighted.take() {
            map.reset_style(id);
        }
        map.remove_quiz_markers();
        map.close_popup();
    }

    pub fn show_session_start<M: MapSurface>(
        &mut self,
        map: &mut M,
        form: &mut QuizForm,
        session: &QuizSession,
    ) {
        self.clear_question(map);
        map.set_layer_style(if session.quiz_type().is_intersection() {
            DEFAULT_STREET_STYLE
        } else {
            STREET_QUIZ_BASE_STYLE
        });

        form.clear();
        form.title = session.title();
        form.total = session.total();
        form.submit_enabled = true;
    }

    pub fn show_question<M: MapSurface>(
        &mut self,
        map: &mut M,
        form: &mut QuizForm,
        quiz_type: QuizType,
        question: &Question,
        options: Vec<String>,
    ) {
        self.clear_question(map);
        let feature = &question.feature;

        match quiz_type {
            QuizType::StreetName => {
                map.set_style(feature.id, HIGHLIGHT_STYLE);
                self.highlighted = Some(feature.id);
                if let Some(bounds) = feature.bounds() {
                    map.fit_bounds(bounds, QUESTION_ZOOM);
                }
            }
            QuizType::IntersectionFromName => {
                if let Some(point) = feature.point() {
                    map.add_marker(Marker {
                        position: point,
                        quiz_marker: true,
                    });
                    map.set_view(point, QUESTION_ZOOM);
                }
            }
            QuizType::IntersectionFromStreets => {
                if let Some(point) = feature.point() {
                    map.set_view(point, QUESTION_ZOOM);
                }
            }
        }

        form.question = quiz_type.prompt(question.number, feature);
        form.set_options(options);
        form.feedback = None;
    }

    pub fn show_outcome(&self, form: &mut QuizForm, outcome: &AnswerOutcome, score: usize) {
        match outcome {
            AnswerOutcome::Ignored => return,
            AnswerOutcome::Correct => form.feedback = Some(Feedback::Correct),
            AnswerOutcome::Incorrect { expected } => {
                form.feedback = Some(Feedback::Incorrect {
                    expected: expected.clone(),
                })
            }
        }
        form.score = score;
    }

    pub fn show_result<M: MapSurface>(
        &mut self,
        map: &mut M,
        form: &mut QuizForm,
        session: &QuizSession,
    ) {
        self.clear_question(map);
        form.question = "Quiz finished!".to_string();
        form.set_options(Vec::new());
        form.result = Some(format!("Accuracy: {:.1}%", session.accuracy_percent()));
        form.submit_enabled = false;
        form.review_enabled = !session.wrong_answers().is_empty();
    }

    /// Back to the main menu: nothing of the last session stays visible.
    pub fn reset<M: MapSurface>(&mut self, map: &mut M, form: &mut QuizForm) {
        self.clear_question(map);
        map.set_layer_style(DEFAULT_STREET_STYLE);
        form.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::fixtures::{intersections, streets};
    use crate::quiz::{NextQuestion, QuestionCount};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn first_question(session: &mut QuizSession) -> Question {
        match session.next_question() {
            NextQuestion::Question(q) => q,
            NextQuestion::Finished => panic!("expected a question"),
        }
    }

    #[test]
    fn street_question_highlights_and_frames_the_street() {
        let pool = streets(&["A", "B", "C", "D"]);
        let mut map = TerminalMap::new();
        let mut form = QuizForm::default();
        let mut presenter = Presenter::new();
        presenter.register_streets(&mut map, &pool);

        let mut rng = StdRng::seed_from_u64(1);
        let mut session =
            QuizSession::start(&pool, QuizType::StreetName, QuestionCount::All, &mut rng).unwrap();
        presenter.show_session_start(&mut map, &mut form, &session);
        let q = first_question(&mut session);
        presenter.show_question(
            &mut map,
            &mut form,
            QuizType::StreetName,
            &q,
            vec!["A".into(), "B".into(), "C".into(), "D".into()],
        );

        assert_eq!(map.shape(q.feature.id).unwrap().style, HIGHLIGHT_STYLE);
        assert_eq!(presenter.highlighted(), Some(q.feature.id));
        let others = map.shapes().iter().filter(|s| s.feature.id != q.feature.id);
        assert!(others.into_iter().all(|s| s.style == STREET_QUIZ_BASE_STYLE));
        assert_eq!(form.question, "Question 1: Where is this street?");
        assert_eq!(form.selected, None);
        assert!(form.submit_enabled);

        presenter.clear_question(&mut map);
        assert_eq!(map.shape(q.feature.id).unwrap().style, STREET_QUIZ_BASE_STYLE);
    }

    #[test]
    fn intersection_marker_only_for_location_quiz() {
        let pool = intersections(4);
        let mut map = TerminalMap::new();
        let mut form = QuizForm::default();
        let mut presenter = Presenter::new();
        let mut rng = StdRng::seed_from_u64(1);

        for (quiz_type, markers) in [
            (QuizType::IntersectionFromName, 1),
            (QuizType::IntersectionFromStreets, 0),
        ] {
            let mut session = QuizSession::start(&pool, quiz_type, QuestionCount::All, &mut rng).unwrap();
            presenter.show_session_start(&mut map, &mut form, &session);
            let q = first_question(&mut session);
            presenter.show_question(&mut map, &mut form, quiz_type, &q, Vec::new());

            assert_eq!(map.markers().len(), markers);
            assert_eq!(map.viewport.center, q.feature.point().unwrap());
            assert_eq!(map.viewport.zoom, QUESTION_ZOOM);
            assert_eq!(map.layer_style(), DEFAULT_STREET_STYLE);
        }
    }

    #[test]
    fn result_enables_review_only_after_misses() {
        let pool = streets(&["A", "B", "C", "D"]);
        let mut map = TerminalMap::new();
        let mut form = QuizForm::default();
        let mut presenter = Presenter::new();
        let mut rng = StdRng::seed_from_u64(3);
        let mut session =
            QuizSession::start(&pool, QuizType::StreetName, QuestionCount::Fixed(1), &mut rng).unwrap();
        first_question(&mut session);
        let outcome = session.submit_answer("nope");
        presenter.show_outcome(&mut form, &outcome, session.score());
        assert!(matches!(form.feedback, Some(Feedback::Incorrect { .. })));

        session.next_question();
        presenter.show_result(&mut map, &mut form, &session);
        assert_eq!(form.result.as_deref(), Some("Accuracy: 0.0%"));
        assert!(!form.submit_enabled);
        assert!(form.review_enabled);
    }

    #[test]
    fn ignored_answer_leaves_form_alone() {
        let mut form = QuizForm {
            score: 3,
            ..QuizForm::default()
        };
        Presenter::new().show_outcome(&mut form, &AnswerOutcome::Ignored, 9);
        assert_eq!(form.score, 3);
        assert!(form.feedback.is_none());
    }
}
