use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::{
    dataset::DatasetKind,
    presentation::form::ANSWER_PLACEHOLDER,
    quiz::{QuestionCount, QuizType},
    selection::Screen,
    App,
};

/// A ui panel boundary: renders one menu screen or the quiz form
pub trait Panel {
    fn render(&self, app: &App, f: &mut Frame, area: Rect);
    /// Key hints shown in the footer.
    fn legend(&self) -> &'static str;
}

fn button<'a>(hotkey: char, label: String, enabled: bool) -> ListItem<'a> {
    let style = if enabled {
        Style::default().add_modifier(Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::DIM | Modifier::CROSSED_OUT)
    };
    ListItem::new(Line::from(vec![
        Span::styled(format!("({hotkey}) "), Style::default().fg(Color::Cyan)),
        Span::styled(label, style),
    ]))
}

fn menu(title: &str, items: Vec<ListItem<'static>>) -> List<'static> {
    List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title.to_string()),
    )
}

/// Main menu: the two quiz categories
pub struct MainPanel;

impl Panel for MainPanel {
    fn render(&self, app: &App, f: &mut Frame, area: Rect) {
        let pools = app.pool_sizes();
        let items = vec![
            button(
                's',
                app.menu_label(DatasetKind::Streets),
                pools.streets > 0,
            ),
            button(
                'i',
                app.menu_label(DatasetKind::Intersections),
                pools.intersections > 0,
            ),
        ];
        f.render_widget(menu("Choose a quiz", items), area);
    }

    fn legend(&self) -> &'static str {
        "(s)treets / (i)ntersections / h j k l + - map / (q)uit"
    }
}

/// Intersection quiz type choice
pub struct SubPanel;

impl Panel for SubPanel {
    fn render(&self, _app: &App, f: &mut Frame, area: Rect) {
        let items = QuizType::ALL
            .iter()
            .filter(|quiz_type| quiz_type.is_intersection())
            .zip(['n', 't'])
            .map(|(quiz_type, key)| button(key, quiz_type.title().to_string(), true))
            .collect();
        f.render_widget(menu("Intersection quiz", items), area);
    }

    fn legend(&self) -> &'static str {
        "(n)ame from location / (t)wo streets / (b)ack / (q)uit"
    }
}

/// Question count choice, with counts above the pool size disabled
pub struct CountPanel {
    pub quiz_type: QuizType,
}

impl Panel for CountPanel {
    fn render(&self, app: &App, f: &mut Frame, area: Rect) {
        let available = app.pool_for(self.quiz_type).len();
        let hotkeys = ['1', '2', 'a'];
        let items = QuestionCount::CHOICES
            .iter()
            .zip(hotkeys)
            .map(|(count, key)| button(key, count.label(), count.is_available(available)))
            .collect();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)])
            .split(area);

        let header = Paragraph::new(format!("{available} questions available"))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(self.quiz_type.title()),
            );
        f.render_widget(header, chunks[0]);
        f.render_widget(menu("How many questions?", items), chunks[1]);
    }

    fn legend(&self) -> &'static str {
        "(1) 30 / (2) 50 / (a)ll / (b)ack / (q)uit"
    }
}

/// The running quiz: question, answer dropdown, feedback and score
pub struct QuizPanel;

impl Panel for QuizPanel {
    fn render(&self, app: &App, f: &mut Frame, area: Rect) {
        let form = &app.form;
        let bold_style = Style::default().add_modifier(Modifier::BOLD);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4), // question
                Constraint::Length(form.options.len() as u16 + 3), // dropdown
                Constraint::Length(3), // feedback
                Constraint::Length(3), // score and result
                Constraint::Min(0),
            ])
            .split(area);

        let question = Paragraph::new(Span::styled(form.question.clone(), bold_style))
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(form.title.clone()),
            );
        f.render_widget(question, chunks[0]);

        let width = form.dropdown_width();
        let mut items = vec![dropdown_item(
            ANSWER_PLACEHOLDER,
            width,
            form.selected.is_none(),
            true,
        )];
        items.extend(
            form.options
                .iter()
                .enumerate()
                .map(|(idx, opt)| dropdown_item(opt, width, form.selected == Some(idx), false)),
        );
        let dropdown_title = if form.submit_enabled {
            "Answer (enter to submit)"
        } else {
            "Answer"
        };
        f.render_widget(
            List::new(items).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(dropdown_title),
            ),
            chunks[1],
        );

        let feedback_style = match &form.feedback {
            Some(crate::presentation::Feedback::Correct) => {
                Style::default().patch(bold_style).fg(Color::Green)
            }
            Some(_) => Style::default().patch(bold_style).fg(Color::Red),
            None => Style::default(),
        };
        let feedback = Paragraph::new(Span::styled(
            form.feedback.as_ref().map(|fb| fb.text()).unwrap_or_default(),
            feedback_style,
        ))
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL));
        f.render_widget(feedback, chunks[2]);

        let mut score = format!("Score: {} / {}", form.score, form.total);
        if let Some(result) = &form.result {
            score.push_str("   ");
            score.push_str(result);
        }
        f.render_widget(
            Paragraph::new(Span::styled(score, bold_style)).block(Block::default().borders(Borders::ALL)),
            chunks[3],
        );
    }

    fn legend(&self) -> &'static str {
        "↑/↓ or 1-4 choose / enter submit / (r)eview / (m)enu / h j k l + - map"
    }
}

fn dropdown_item(text: &str, width: usize, selected: bool, placeholder: bool) -> ListItem<'static> {
    let pad = width.saturating_sub(text.width());
    let cursor = if selected { "▶" } else { " " };
    let label = format!("{cursor} {text}{}", " ".repeat(pad));
    let mut style = Style::default();
    if placeholder {
        style = style.add_modifier(Modifier::ITALIC | Modifier::DIM);
    }
    if selected {
        style = style.bg(Color::DarkGray).add_modifier(Modifier::BOLD);
    }
    ListItem::new(Span::styled(label, style))
}

/// Helper to construct the appropriate panel for the current screen
pub fn current_panel(screen: &Screen) -> Box<dyn Panel> {
    match screen {
        Screen::Main => Box::new(MainPanel),
        Screen::Sub => Box::new(SubPanel),
        Screen::Count { quiz_type, .. } => Box::new(CountPanel {
            quiz_type: *quiz_type,
        }),
        Screen::Active { .. } => Box::new(QuizPanel),
    }
}
