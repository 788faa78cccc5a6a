//! The quiz engine: question sequencing, answer options, scoring and review.
//!
//! Nothing in here knows about the terminal or the map. Randomness is
//! injected so sessions are reproducible under a seeded rng.

use std::sync::Arc;

use itertools::Itertools;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::QuizError;
use crate::feature::Feature;

/// Number of answer choices offered per question.
pub const OPTION_COUNT: usize = 4;

/// Random draws per missing option before falling back to a pool scan.
const DRAWS_PER_OPTION: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum QuizType {
    /// Identify a highlighted street by name.
    #[strum(serialize = "street")]
    StreetName,
    /// Identify a marked intersection by name.
    #[strum(serialize = "cross_name")]
    IntersectionFromName,
    /// Name the intersection of two given streets.
    #[strum(serialize = "cross_street")]
    IntersectionFromStreets,
}

type NamingFn = fn(&Feature) -> Option<&str>;

/// Answer name per quiz type, in `QuizType` declaration order. Both
/// intersection quizzes are answered with the intersection's name.
const NAMING: [NamingFn; 3] = [
    Feature::street_name,
    Feature::crossing_name,
    Feature::crossing_name,
];

impl QuizType {
    pub const ALL: [QuizType; 3] = [
        QuizType::StreetName,
        QuizType::IntersectionFromName,
        QuizType::IntersectionFromStreets,
    ];

    fn index(self) -> usize {
        self as usize
    }

    /// The canonical answer for `feature` under this quiz type.
    pub fn answer_name(self, feature: &Feature) -> Option<&str> {
        NAMING[self.index()](feature)
    }

    pub fn is_intersection(self) -> bool {
        !matches!(self, QuizType::StreetName)
    }

    pub fn title(self) -> &'static str {
        match self {
            QuizType::StreetName => "Street quiz",
            QuizType::IntersectionFromName => "Intersection quiz (location to name)",
            QuizType::IntersectionFromStreets => "Intersection quiz (streets to name)",
        }
    }

    /// The question text for question number `number` (1-based).
    pub fn prompt(self, number: usize, feature: &Feature) -> String {
        match self {
            QuizType::StreetName => format!("Question {number}: Where is this street?"),
            QuizType::IntersectionFromName => {
                format!("Question {number}: Which intersection is this?")
            }
            QuizType::IntersectionFromStreets => {
                let (s1, s2) = feature.crossing_streets().unwrap_or(("?", "?"));
                format!("Question {number}: What is the intersection of «{s1}» and «{s2}»?")
            }
        }
    }
}

/// How many questions to ask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionCount {
    Fixed(usize),
    All,
}

impl QuestionCount {
    /// The choices offered on the count screen.
    pub const CHOICES: [QuestionCount; 3] = [
        QuestionCount::Fixed(30),
        QuestionCount::Fixed(50),
        QuestionCount::All,
    ];

    /// Whether this choice can be offered for a pool of `pool_size`.
    pub fn is_available(self, pool_size: usize) -> bool {
        match self {
            QuestionCount::Fixed(n) => n > 0 && n <= pool_size,
            QuestionCount::All => pool_size > 0,
        }
    }

    pub fn resolve(self, pool_size: usize) -> usize {
        match self {
            QuestionCount::Fixed(n) => n.min(pool_size),
            QuestionCount::All => pool_size,
        }
    }

    pub fn label(self) -> String {
        match self {
            QuestionCount::Fixed(n) => format!("{n} questions"),
            QuestionCount::All => "All questions".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct WrongAnswer {
    pub feature: Arc<Feature>,
    pub quiz_type: QuizType,
}

#[derive(Debug, Clone)]
pub struct Question {
    pub feature: Arc<Feature>,
    /// 1-based position within the session.
    pub number: usize,
}

#[derive(Debug, Clone)]
pub enum NextQuestion {
    Question(Question),
    Finished,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// No selection, no active question, or the question was already answered.
    Ignored,
    Correct,
    Incorrect { expected: String },
}

#[derive(Debug, Clone)]
pub struct QuizSession {
    quiz_type: QuizType,
    remaining: Vec<Arc<Feature>>,
    current: Option<Arc<Feature>>,
    current_answered: bool,
    score: usize,
    answered: usize,
    total: usize,
    wrong_answers: Vec<WrongAnswer>,
    is_review: bool,
}

impl QuizSession {
    /// Shuffles a copy of `pool` and keeps the first `count` questions.
    /// Returns `None` for an empty pool.
    pub fn start<R: Rng + ?Sized>(
        pool: &[Arc<Feature>],
        quiz_type: QuizType,
        count: QuestionCount,
        rng: &mut R,
    ) -> Option<Self> {
        if pool.is_empty() {
            return None;
        }

        let mut questions = pool.to_vec();
        questions.shuffle(rng);
        questions.truncate(count.resolve(pool.len()));

        Some(Self {
            quiz_type,
            total: questions.len(),
            remaining: questions,
            current: None,
            current_answered: false,
            score: 0,
            answered: 0,
            wrong_answers: Vec::new(),
            is_review: false,
        })
    }

    /// Moves to the next question, or reports that the session is over.
    pub fn next_question(&mut self) -> NextQuestion {
        match self.remaining.pop() {
            Some(feature) => {
                self.current = Some(feature.clone());
                self.current_answered = false;
                NextQuestion::Question(Question {
                    feature,
                    number: self.total - self.remaining.len(),
                })
            }
            None => {
                self.current = None;
                NextQuestion::Finished
            }
        }
    }

    pub fn submit_answer(&mut self, name: &str) -> AnswerOutcome {
        if name.is_empty() || self.current_answered {
            return AnswerOutcome::Ignored;
        }
        let Some(current) = self.current.clone() else {
            return AnswerOutcome::Ignored;
        };

        self.current_answered = true;
        self.answered += 1;

        let expected = self.quiz_type.answer_name(&current).unwrap_or_default();
        if name == expected {
            self.score += 1;
            AnswerOutcome::Correct
        } else {
            let expected = expected.to_string();
            self.wrong_answers.push(WrongAnswer {
                feature: current,
                quiz_type: self.quiz_type,
            });
            AnswerOutcome::Incorrect { expected }
        }
    }

    /// Restarts this session with every missed question, once each.
    /// Leaves the session untouched when nothing was missed.
    pub fn start_review<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<(), QuizError> {
        let first = self.wrong_answers.first().ok_or(QuizError::NoReviewMaterial)?;
        let quiz_type = first.quiz_type;
        let pool: Vec<Arc<Feature>> = self
            .wrong_answers
            .iter()
            .map(|wa| wa.feature.clone())
            .unique_by(|f| Arc::as_ptr(f))
            .collect();

        let mut review = Self::start(&pool, quiz_type, QuestionCount::All, rng)
            .ok_or(QuizError::NoReviewMaterial)?;
        review.is_review = true;
        *self = review;
        Ok(())
    }

    pub fn quiz_type(&self) -> QuizType {
        self.quiz_type
    }

    pub fn current(&self) -> Option<&Arc<Feature>> {
        self.current.as_ref()
    }

    pub fn score(&self) -> usize {
        self.score
    }

    pub fn answered(&self) -> usize {
        self.answered
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn remaining(&self) -> &[Arc<Feature>] {
        &self.remaining
    }

    pub fn wrong_answers(&self) -> &[WrongAnswer] {
        &self.wrong_answers
    }

    pub fn is_review(&self) -> bool {
        self.is_review
    }

    /// All questions asked and the last one answered or abandoned.
    pub fn is_finished(&self) -> bool {
        self.remaining.is_empty() && self.current.is_none()
    }

    pub fn accuracy_percent(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.score as f64 / self.total as f64 * 100.0
        }
    }

    pub fn title(&self) -> String {
        if self.is_review {
            format!("{} (review)", self.quiz_type.title())
        } else {
            self.quiz_type.title().to_string()
        }
    }
}

/// Four distinct answer names for `correct`, shuffled: the right one plus
/// three sampled from `pool`.
pub fn generate_options<R: Rng + ?Sized>(
    correct: &Feature,
    pool: &[Arc<Feature>],
    quiz_type: QuizType,
    rng: &mut R,
) -> Result<Vec<String>, QuizError> {
    let mut names: Vec<String> = Vec::with_capacity(OPTION_COUNT);
    if let Some(name) = quiz_type.answer_name(correct) {
        names.push(name.to_string());
    }

    let push_distinct = |names: &mut Vec<String>, feature: &Feature| {
        if let Some(name) = quiz_type.answer_name(feature) {
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
    };

    if !pool.is_empty() {
        let mut draws = DRAWS_PER_OPTION * OPTION_COUNT;
        while names.len() < OPTION_COUNT && draws > 0 {
            draws -= 1;
            let feature = &pool[rng.gen_range(0..pool.len())];
            push_distinct(&mut names, feature);
        }
    }

    if names.len() < OPTION_COUNT {
        let mut rest: Vec<&Arc<Feature>> = pool.iter().collect();
        rest.shuffle(rng);
        for feature in rest {
            if names.len() == OPTION_COUNT {
                break;
            }
            push_distinct(&mut names, feature);
        }
    }

    names.shuffle(rng);
    if names.len() < OPTION_COUNT {
        return Err(QuizError::OptionsExhausted { options: names });
    }
    Ok(names)
}
