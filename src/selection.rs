//! Menu navigation: which screen is showing and how the user got there.

use crate::quiz::{QuestionCount, QuizType};

/// Screen the count selection was entered from, so back returns there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountOrigin {
    Main,
    Sub,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    #[default]
    Main,
    /// Choosing between the two intersection quizzes.
    Sub,
    Count {
        quiz_type: QuizType,
        origin: CountOrigin,
    },
    Active {
        quiz_type: QuizType,
        count: QuestionCount,
    },
}

/// Outcome of a transition request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The screen changed.
    Moved,
    /// The request does not apply to the current screen, or its option is
    /// disabled. Nothing changed.
    Rejected,
    /// A running quiz was left; its session must be discarded.
    Abandoned,
}

/// Pool sizes the menus gate on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolSizes {
    pub streets: usize,
    pub intersections: usize,
}

impl PoolSizes {
    pub fn for_quiz(&self, quiz_type: QuizType) -> usize {
        if quiz_type.is_intersection() {
            self.intersections
        } else {
            self.streets
        }
    }
}

#[derive(Debug, Default)]
pub struct SelectionFlow {
    screen: Screen,
}

impl SelectionFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    /// The quiz type chosen so far, if any.
    pub fn quiz_type(&self) -> Option<QuizType> {
        match self.screen {
            Screen::Count { quiz_type, .. } | Screen::Active { quiz_type, .. } => Some(quiz_type),
            Screen::Main | Screen::Sub => None,
        }
    }

    pub fn choose_street(&mut self, pools: PoolSizes) -> Transition {
        if self.screen != Screen::Main || pools.streets == 0 {
            return Transition::Rejected;
        }
        self.screen = Screen::Count {
            quiz_type: QuizType::StreetName,
            origin: CountOrigin::Main,
        };
        Transition::Moved
    }

    pub fn choose_intersections(&mut self, pools: PoolSizes) -> Transition {
        if self.screen != Screen::Main || pools.intersections == 0 {
            return Transition::Rejected;
        }
        self.screen = Screen::Sub;
        Transition::Moved
    }

    pub fn choose_intersection_type(&mut self, quiz_type: QuizType) -> Transition {
        if self.screen != Screen::Sub || !quiz_type.is_intersection() {
            return Transition::Rejected;
        }
        self.screen = Screen::Count {
            quiz_type,
            origin: CountOrigin::Sub,
        };
        Transition::Moved
    }

    /// Starts the quiz, unless the count is disabled for the pool.
    pub fn choose_count(&mut self, count: QuestionCount, pools: PoolSizes) -> Transition {
        let Screen::Count { quiz_type, .. } = self.screen else {
            return Transition::Rejected;
        };
        if !count.is_available(pools.for_quiz(quiz_type)) {
            return Transition::Rejected;
        }
        self.screen = Screen::Active { quiz_type, count };
        Transition::Moved
    }

    pub fn back(&mut self) -> Transition {
        let (screen, transition) = match self.screen {
            Screen::Main => return Transition::Rejected,
            Screen::Sub => (Screen::Main, Transition::Moved),
            Screen::Count {
                origin: CountOrigin::Main,
                ..
            } => (Screen::Main, Transition::Moved),
            Screen::Count {
                origin: CountOrigin::Sub,
                ..
            } => (Screen::Sub, Transition::Moved),
            Screen::Active { .. } => (Screen::Main, Transition::Abandoned),
        };
        self.screen = screen;
        transition
    }

    /// Returns to the main menu from anywhere.
    pub fn reset(&mut self) -> Transition {
        let was_active = matches!(self.screen, Screen::Active { .. });
        self.screen = Screen::Main;
        if was_active {
            Transition::Abandoned
        } else {
            Transition::Moved
        }
    }

    /// A review replaces the running quiz with all of its misses.
    pub fn enter_review(&mut self, quiz_type: QuizType) -> Transition {
        if !matches!(self.screen, Screen::Active { .. }) {
            return Transition::Rejected;
        }
        self.screen = Screen::Active {
            quiz_type,
            count: QuestionCount::All,
        };
        Transition::Moved
    }
}
