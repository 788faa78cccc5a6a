//! Application state: datasets, menu flow, the running session and what the
//! screen shows. All of it is owned here and changed only from the event loop.

use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use rand::rngs::StdRng;
use rand::SeedableRng;
use ratatui::layout::Rect;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::dataset::{DatasetEvent, DatasetKind, DatasetStatus, QuestionPool};
use crate::error::QuizError;
use crate::feature::Position;
use crate::presentation::{Feedback, MapSurface, Presenter, QuizForm, TerminalMap};
use crate::quiz::{generate_options, AnswerOutcome, NextQuestion, QuestionCount, QuizSession, QuizType};
use crate::runtime::AdvanceTimer;
use crate::selection::{PoolSizes, Screen, SelectionFlow, Transition};
use crate::ui::map_canvas_area;

/// Map movement per key press, as a fraction of the visible width.
const PAN_STEP: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    ChooseStreetQuiz,
    ChooseIntersectionQuiz,
    ChooseIntersectionType(QuizType),
    ChooseCount(QuestionCount),
    Back,
    ReturnToMain,
    SelectNext,
    SelectPrevious,
    SelectOption(usize),
    Submit,
    Review,
    Pan(f64, f64),
    Zoom(f64),
    Quit,
}

/// Maps a key press to what it means on `screen`.
pub fn action_for_key(screen: Screen, key: KeyEvent) -> Option<Action> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Action::Quit);
    }

    let map_action = match key.code {
        KeyCode::Char('h') => Some(Action::Pan(-PAN_STEP, 0.0)),
        KeyCode::Char('l') => Some(Action::Pan(PAN_STEP, 0.0)),
        KeyCode::Char('k') => Some(Action::Pan(0.0, PAN_STEP)),
        KeyCode::Char('j') => Some(Action::Pan(0.0, -PAN_STEP)),
        KeyCode::Char('+') | KeyCode::Char('=') => Some(Action::Zoom(1.0)),
        KeyCode::Char('-') => Some(Action::Zoom(-1.0)),
        _ => None,
    };
    if map_action.is_some() {
        return map_action;
    }

    match (screen, key.code) {
        (Screen::Main, KeyCode::Esc | KeyCode::Char('q')) => Some(Action::Quit),
        (Screen::Main, KeyCode::Char('s')) => Some(Action::ChooseStreetQuiz),
        (Screen::Main, KeyCode::Char('i')) => Some(Action::ChooseIntersectionQuiz),

        (Screen::Sub, KeyCode::Char('n')) => {
            Some(Action::ChooseIntersectionType(QuizType::IntersectionFromName))
        }
        (Screen::Sub, KeyCode::Char('t')) => {
            Some(Action::ChooseIntersectionType(QuizType::IntersectionFromStreets))
        }

        (Screen::Count { .. }, KeyCode::Char('1')) => {
            Some(Action::ChooseCount(QuestionCount::CHOICES[0]))
        }
        (Screen::Count { .. }, KeyCode::Char('2')) => {
            Some(Action::ChooseCount(QuestionCount::CHOICES[1]))
        }
        (Screen::Count { .. }, KeyCode::Char('a')) => Some(Action::ChooseCount(QuestionCount::All)),

        (Screen::Active { .. }, KeyCode::Down | KeyCode::Tab) => Some(Action::SelectNext),
        (Screen::Active { .. }, KeyCode::Up | KeyCode::BackTab) => Some(Action::SelectPrevious),
        (Screen::Active { .. }, KeyCode::Char(c @ '1'..='4')) => {
            Some(Action::SelectOption(c as usize - '1' as usize))
        }
        (Screen::Active { .. }, KeyCode::Enter) => Some(Action::Submit),
        (Screen::Active { .. }, KeyCode::Char('r')) => Some(Action::Review),
        (Screen::Active { .. }, KeyCode::Char('m') | KeyCode::Esc) => Some(Action::ReturnToMain),

        (Screen::Sub | Screen::Count { .. }, KeyCode::Char('b') | KeyCode::Backspace | KeyCode::Esc) => {
            Some(Action::Back)
        }
        (_, KeyCode::Char('q')) => Some(Action::Quit),
        _ => None,
    }
}

#[derive(Debug)]
pub struct App {
    pub config: Config,
    pub streets: DatasetStatus,
    pub intersections: DatasetStatus,
    pub flow: SelectionFlow,
    pub session: Option<QuizSession>,
    pub form: QuizForm,
    pub map: TerminalMap,
    /// One-line message shown under the menus, cleared by the next action.
    pub notice: Option<String>,
    presenter: Presenter,
    advance: AdvanceTimer,
    rng: StdRng,
}

impl App {
    pub fn new(config: Config) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    pub fn with_rng(config: Config, rng: StdRng) -> Self {
        Self {
            config,
            streets: DatasetStatus::Loading,
            intersections: DatasetStatus::Loading,
            flow: SelectionFlow::new(),
            session: None,
            form: QuizForm::default(),
            map: TerminalMap::new(),
            notice: None,
            presenter: Presenter::new(),
            advance: AdvanceTimer::new(),
            rng,
        }
    }

    pub fn screen(&self) -> Screen {
        self.flow.screen()
    }

    pub fn on_dataset(&mut self, ev: DatasetEvent) {
        let status = match ev.result {
            Ok(dataset) => {
                if ev.kind == DatasetKind::Streets {
                    self.presenter.register_streets(&mut self.map, &dataset.features);
                }
                DatasetStatus::Ready(dataset)
            }
            Err(err) => DatasetStatus::Unavailable(err),
        };
        match ev.kind {
            DatasetKind::Streets => self.streets = status,
            DatasetKind::Intersections => self.intersections = status,
        }
    }

    pub fn pool_sizes(&self) -> PoolSizes {
        PoolSizes {
            streets: self.streets.pool().len(),
            intersections: self.intersections.pool().len(),
        }
    }

    pub fn pool_for(&self, quiz_type: QuizType) -> QuestionPool {
        if quiz_type.is_intersection() {
            self.intersections.pool()
        } else {
            self.streets.pool()
        }
    }

    pub fn menu_label(&self, kind: DatasetKind) -> String {
        let (name, status) = match kind {
            DatasetKind::Streets => ("Street quiz", &self.streets),
            DatasetKind::Intersections => ("Intersection quiz", &self.intersections),
        };
        match status {
            DatasetStatus::Loading => format!("{name} (loading...)"),
            DatasetStatus::Ready(dataset) => format!("{name} ({} questions)", dataset.pool.len()),
            DatasetStatus::Unavailable(err) => format!("{name} ({})", err.menu_label()),
        }
    }

    /// Applies one user action. `now` drives the answer delay.
    pub fn perform(&mut self, action: Action, now: Instant) {
        self.notice = None;
        let pools = self.pool_sizes();

        match action {
            Action::ChooseStreetQuiz => {
                self.flow.choose_street(pools);
            }
            Action::ChooseIntersectionQuiz => {
                self.flow.choose_intersections(pools);
            }
            Action::ChooseIntersectionType(quiz_type) => {
                self.flow.choose_intersection_type(quiz_type);
            }
            Action::ChooseCount(count) => {
                if self.flow.choose_count(count, pools) == Transition::Moved {
                    if let Screen::Active { quiz_type, count } = self.flow.screen() {
                        self.start_session(quiz_type, count);
                    }
                }
            }
            Action::Back => {
                self.flow.back();
                if self.flow.screen() == Screen::Main {
                    self.reset_session();
                }
            }
            Action::ReturnToMain => {
                self.flow.reset();
                self.reset_session();
            }
            Action::SelectNext => self.form.select_next(),
            Action::SelectPrevious => self.form.select_previous(),
            Action::SelectOption(idx) => self.form.select(idx),
            Action::Submit => self.submit(now),
            Action::Review => self.review(),
            Action::Pan(dx, dy) => self.map.viewport.pan(dx, dy),
            Action::Zoom(delta) => self.map.viewport.zoom_by(delta),
            Action::Quit => {}
        }
    }

    pub fn on_key(&mut self, key: KeyEvent, now: Instant) -> Option<Action> {
        let action = action_for_key(self.flow.screen(), key)?;
        self.perform(action, now);
        Some(action)
    }

    /// Moves on once the answer delay has passed.
    pub fn on_tick(&mut self, now: Instant) {
        if self.advance.poll(now) {
            self.show_next_question();
        }
    }

    /// Whether a question change is pending.
    pub fn is_advancing(&self) -> bool {
        self.advance.is_armed()
    }

    /// Left click on the map: shows a street's name during intersection quizzes.
    pub fn on_mouse(&mut self, mouse: MouseEvent, frame: Rect) {
        if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return;
        }
        let area = map_canvas_area(frame);
        let inside = mouse.column >= area.x
            && mouse.column < area.x + area.width
            && mouse.row >= area.y
            && mouse.row < area.y + area.height;
        if !inside {
            return;
        }

        let viewport = self.map.viewport;
        let position = viewport.position_at(
            area.width,
            area.height,
            mouse.column - area.x,
            mouse.row - area.y,
        );
        // one cell of slack either way
        let tolerance = viewport.lon_span() / area.width.max(1) as f64;
        self.click_map(position, tolerance);
    }

    pub fn click_map(&mut self, position: Position, tolerance: f64) {
        if !self.flow.quiz_type().is_some_and(QuizType::is_intersection) {
            return;
        }
        match self.map.shape_at(position, tolerance) {
            Some(id) => self.map.open_popup(id),
            None => self.map.close_popup(),
        }
    }

    fn start_session(&mut self, quiz_type: QuizType, count: QuestionCount) {
        self.advance.cancel();
        let pool = self.pool_for(quiz_type);
        let Some(session) = QuizSession::start(pool.features(), quiz_type, count, &mut self.rng)
        else {
            warn!(%quiz_type, "no questions available");
            self.flow.reset();
            self.reset_session();
            return;
        };
        info!(%quiz_type, total = session.total(), "quiz started");
        self.presenter
            .show_session_start(&mut self.map, &mut self.form, &session);
        self.session = Some(session);
        self.show_next_question();
    }

    fn show_next_question(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let quiz_type = session.quiz_type();

        match session.next_question() {
            NextQuestion::Question(question) => {
                let pool = if quiz_type.is_intersection() {
                    self.intersections.pool()
                } else {
                    self.streets.pool()
                };
                let (options, few) =
                    match generate_options(&question.feature, pool.features(), quiz_type, &mut self.rng) {
                        Ok(options) => (options, false),
                        Err(QuizError::OptionsExhausted { options }) => {
                            warn!(found = options.len(), "not enough distinct answer names");
                            (options, true)
                        }
                        Err(err) => {
                            warn!(error = %err, "option generation failed");
                            (Vec::new(), true)
                        }
                    };
                self.presenter.show_question(
                    &mut self.map,
                    &mut self.form,
                    quiz_type,
                    &question,
                    options,
                );
                if few {
                    self.form.feedback = Some(Feedback::FewOptions);
                }
            }
            NextQuestion::Finished => {
                info!(
                    score = session.score(),
                    total = session.total(),
                    missed = session.wrong_answers().len(),
                    "quiz finished"
                );
                self.presenter.show_result(&mut self.map, &mut self.form, session);
            }
        }
    }

    fn submit(&mut self, now: Instant) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let outcome = session.submit_answer(self.form.selected_answer());
        if outcome == AnswerOutcome::Ignored {
            return;
        }
        debug!(?outcome, score = session.score(), "answer submitted");
        self.presenter
            .show_outcome(&mut self.form, &outcome, session.score());
        self.advance.arm(now, self.config.answer_delay());
    }

    fn review(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if !session.is_finished() {
            return;
        }
        match session.start_review(&mut self.rng) {
            Ok(()) => {
                let quiz_type = session.quiz_type();
                info!(%quiz_type, total = session.total(), "review started");
                self.flow.enter_review(quiz_type);
                self.advance.cancel();
                if let Some(session) = self.session.as_ref() {
                    self.presenter
                        .show_session_start(&mut self.map, &mut self.form, session);
                }
                self.show_next_question();
            }
            Err(err) => self.notice = Some(err.to_string()),
        }
    }

    /// Drops the session and everything it put on screen.
    fn reset_session(&mut self) {
        self.advance.cancel();
        if self.session.take().is_some() {
            debug!("session discarded");
        }
        self.presenter.reset(&mut self.map, &mut self.form);
    }
}
