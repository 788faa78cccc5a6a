use unicode_width::UnicodeWidthStr;

pub const ANSWER_PLACEHOLDER: &str = "Select an answer";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feedback {
    Correct,
    Incorrect { expected: String },
    /// Fewer than four answer names exist for this question.
    FewOptions,
}

impl Feedback {
    pub fn text(&self) -> String {
        match self {
            Feedback::Correct => "Correct!".to_string(),
            Feedback::Incorrect { expected } => format!("Wrong! The answer is {expected}"),
            Feedback::FewOptions => "Not enough names for four choices".to_string(),
        }
    }
}

/// The quiz panel's controls, as plain data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuizForm {
    pub title: String,
    pub question: String,
    pub options: Vec<String>,
    /// `None` is the placeholder entry.
    pub selected: Option<usize>,
    pub feedback: Option<Feedback>,
    pub score: usize,
    pub total: usize,
    pub result: Option<String>,
    pub submit_enabled: bool,
    pub review_enabled: bool,
}

impl QuizForm {
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Replaces the dropdown entries and resets it to the placeholder.
    pub fn set_options(&mut self, options: Vec<String>) {
        self.options = options;
        self.selected = None;
    }

    /// The chosen answer, or an empty string for the placeholder.
    pub fn selected_answer(&self) -> &str {
        self.selected
            .and_then(|idx| self.options.get(idx))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn select(&mut self, idx: usize) {
        if idx < self.options.len() {
            self.selected = Some(idx);
        }
    }

    /// Moves the dropdown selection down, wrapping through the placeholder.
    pub fn select_next(&mut self) {
        self.selected = match self.selected {
            None if !self.options.is_empty() => Some(0),
            Some(idx) if idx + 1 < self.options.len() => Some(idx + 1),
            _ => None,
        };
    }

    pub fn select_previous(&mut self) {
        self.selected = match self.selected {
            None => self.options.len().checked_sub(1),
            Some(0) => None,
            Some(idx) => Some(idx - 1),
        };
    }

    /// Widest entry in terminal columns, placeholder included.
    pub fn dropdown_width(&self) -> usize {
        self.options
            .iter()
            .map(|o| o.width())
            .chain(std::iter::once(ANSWER_PLACEHOLDER.width()))
            .max()
            .unwrap_or(0)
    }
}
