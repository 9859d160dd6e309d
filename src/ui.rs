pub mod charting;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Axis, Chart, Dataset, GraphType, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;
use wordrush::{cheat::CheatField, typing_policy::Outcome};

use crate::{App, AppState};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.state {
            AppState::Typing => render_typing(self, area, buf),
            AppState::CheatEntry => render_cheat_form(self, area, buf),
            AppState::Results => render_results(self, area, buf),
        }
    }
}

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim_bold() -> Style {
    bold().add_modifier(Modifier::DIM)
}

fn render_typing(app: &App, area: Rect, buf: &mut Buffer) {
    let round = &app.round;
    let green_bold_style = bold().fg(Color::Green);
    let red_bold_style = bold().fg(Color::Red);
    let word_style = if round.flash_active() {
        green_bold_style
    } else {
        dim_bold()
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(1), // status
            Constraint::Length(1),
            Constraint::Length(1), // current word
            Constraint::Length(1), // next word
            Constraint::Length(1),
            Constraint::Length(1), // input
            Constraint::Length(1), // notice
            Constraint::Min(0),
            Constraint::Length(1), // debug
        ])
        .split(area);

    let state = round.clock_state();
    let config = round.config();
    let resource = match state.energy_remaining {
        Some(energy) => format!("energy {energy}"),
        None => format!("time {}", charting::format_clock(state.elapsed_ms)),
    };
    let target = if config.is_zen() {
        config.word_goal()
    } else {
        config.goal_progress().ceil() as u32
    };
    let status = format!(
        "{}   {}   {}/{}",
        config.mode(),
        resource,
        round.words_completed(),
        target
    );
    Paragraph::new(Span::styled(status, bold()))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    let word = round.current_word();
    let typed = if round.in_command_mode() {
        ""
    } else {
        app.buffer.as_str()
    };
    let mut spans = Vec::with_capacity(word.chars().count());
    let mut expected = word.chars();
    let mut extra = typed.chars().skip(word.chars().count());
    for outcome in round.feedback(typed) {
        let span = match (outcome, expected.next()) {
            (Outcome::Correct, Some(c)) => Span::styled(c.to_string(), green_bold_style),
            (Outcome::Incorrect, Some(c)) => Span::styled(c.to_string(), red_bold_style),
            (Outcome::Pending, Some(c)) => Span::styled(c.to_string(), word_style),
            // typed past the end of the word
            (_, None) => Span::styled(
                extra.next().map(String::from).unwrap_or_default(),
                red_bold_style.add_modifier(Modifier::UNDERLINED),
            ),
        };
        spans.push(span);
    }
    Paragraph::new(Line::from(spans))
        .alignment(Alignment::Center)
        .render(chunks[3], buf);

    Paragraph::new(Span::styled(
        round.next_word().to_string(),
        Style::default().add_modifier(Modifier::DIM),
    ))
    .alignment(Alignment::Center)
    .render(chunks[4], buf);

    let max_width = chunks[6].width.saturating_sub(2) as usize;
    let input = if app.buffer.width() > max_width {
        let skip = app.buffer.chars().count().saturating_sub(max_width);
        app.buffer.chars().skip(skip).collect::<String>()
    } else {
        app.buffer.clone()
    };
    let input_style = if round.in_command_mode() {
        Style::default().fg(Color::Yellow)
    } else {
        bold()
    };
    Paragraph::new(Line::from(vec![
        Span::styled("> ", dim_bold()),
        Span::styled(input, input_style),
    ]))
    .alignment(Alignment::Center)
    .render(chunks[6], buf);

    let notice = if round.in_command_mode() {
        Some(Span::styled(
            "paused - enter runs the command, empty the line to resume",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::ITALIC),
        ))
    } else {
        app.notice.as_ref().map(|n| {
            Span::styled(
                n.clone(),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
            )
        })
    };
    if let Some(notice) = notice {
        Paragraph::new(notice)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(chunks[7], buf);
    }

    if round.debug_enabled() {
        let debug = format!(
            "energy={:?} elapsed_ms={} progress={:.1} started={} command={} keys={}/{}",
            state.energy_remaining,
            state.elapsed_ms,
            state.total_progress,
            state.started,
            state.in_command_mode,
            round.correct_keystrokes(),
            round.total_keystrokes(),
        );
        Paragraph::new(Span::styled(debug, Style::default().fg(Color::DarkGray)))
            .render(chunks[9], buf);
    }
}

fn render_cheat_form(app: &App, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(2),
            Constraint::Length(2),
            Constraint::Length(2),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(area);

    Paragraph::new(Span::styled("enter your figures", bold()))
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

    let fields = [
        (CheatField::Wpm, "wpm (0-300)", &app.cheat_form.wpm),
        (CheatField::Accuracy, "accuracy % (0-100)", &app.cheat_form.accuracy),
        (CheatField::Time, "time (mm:ss)", &app.cheat_form.time),
    ];
    for (i, (field, label, value)) in fields.into_iter().enumerate() {
        let label_style = if field == app.cheat_field {
            bold().fg(Color::Yellow)
        } else {
            dim_bold()
        };
        let mut lines = vec![Line::from(vec![
            Span::styled(format!("{label}: "), label_style),
            Span::styled(value.clone(), bold()),
        ])];
        if let Some(err) = app.cheat_errors.for_field(field) {
            lines.push(Line::from(Span::styled(
                err.message.clone(),
                Style::default().fg(Color::Red),
            )));
        }
        Paragraph::new(lines).render(chunks[i + 1], buf);
    }

    Paragraph::new(Span::styled(
        "(tab) next field / (enter) submit / (esc) give up",
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .render(chunks[4], buf);
}

fn render_results(app: &App, area: Rect, buf: &mut Buffer) {
    let Some(ref summary) = app.summary else {
        return;
    };
    let magenta_style = Style::default().fg(Color::Magenta);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Min(1),    // chart
            Constraint::Length(1), // stats
            Constraint::Length(1), // message
            Constraint::Length(1), // recorded
            Constraint::Length(1), // padding
            Constraint::Length(1), // legend
        ])
        .split(area);

    let series = app.round.wpm_series();
    let (overall_duration, highest_wpm) =
        charting::compute_chart_params(series.points(), summary.elapsed.as_secs_f64());
    let tuples = series.as_tuples();
    let datasets = vec![Dataset::default()
        .marker(ratatui::symbols::Marker::Braille)
        .style(magenta_style)
        .graph_type(GraphType::Line)
        .data(&tuples)];

    Chart::new(datasets)
        .x_axis(
            Axis::default()
                .title("seconds")
                .bounds([1.0, overall_duration])
                .labels(vec![
                    Span::styled("1", bold()),
                    Span::styled(charting::format_label(overall_duration), bold()),
                ]),
        )
        .y_axis(
            Axis::default()
                .title("wpm")
                .bounds([0.0, highest_wpm])
                .labels(vec![
                    Span::styled("0", bold()),
                    Span::styled(charting::format_label(highest_wpm), bold()),
                ]),
        )
        .render(chunks[0], buf);

    let stats = format!(
        "{} wpm   {:.1}% acc   {} pts   x{:.2}   {} words   {}",
        summary.wpm,
        summary.accuracy_percent,
        summary.score,
        app.round.multiplier(),
        summary.words_completed,
        charting::format_clock(summary.elapsed.as_millis() as u64),
    );
    Paragraph::new(Span::styled(stats, bold()))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    Paragraph::new(Span::styled(
        summary.message.clone(),
        Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center)
    .render(chunks[2], buf);

    let recorded = if summary.result.is_some() {
        Span::styled("saved to history", Style::default().fg(Color::Green))
    } else {
        Span::styled("not recorded", Style::default().add_modifier(Modifier::DIM))
    };
    Paragraph::new(recorded)
        .alignment(Alignment::Center)
        .render(chunks[3], buf);

    Paragraph::new(Span::styled(
        "(r)etry / (esc)ape",
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .render(chunks[5], buf);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;
    use wordrush::{
        cheat::CheatErrors, game_result::ResultPublisher, EngineConfig, EngineError, Round,
        RoundSetup,
    };

    fn create_test_app(words: &[&str]) -> App {
        let config = EngineConfig::classic();
        let mut setup = RoundSetup::new(config, words.iter().map(|w| w.to_string()).collect());
        setup.seed = Some(7);
        let mut round = Round::new(setup).unwrap();
        round.start(config).unwrap();
        App::new(round, ResultPublisher::new(), None)
    }

    fn render(app: &App, area: Rect) -> String {
        let mut buffer = Buffer::empty(area);
        app.render(area, &mut buffer);
        buffer.content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn test_ui_typing_screen() {
        let app = create_test_app(&["hello"]);
        let rendered = render(&app, Rect::new(0, 0, 80, 24));
        assert!(rendered.contains("hello"));
        assert!(rendered.contains("classic"));
        assert!(rendered.contains("energy 10"));
        assert!(rendered.contains("0/30"));
    }

    #[test]
    fn test_ui_progress_uses_win_threshold() {
        let params = wordrush::mode::ModeParams::new(30, 3, 10, 50);
        let config = EngineConfig::survival(params).unwrap();
        let mut setup = RoundSetup::new(config, vec!["hello".to_string()]);
        setup.seed = Some(7);
        let mut round = Round::new(setup).unwrap();
        round.start(config).unwrap();
        let app = App::new(round, ResultPublisher::new(), None);

        let rendered = render(&app, Rect::new(0, 0, 80, 24));
        assert!(rendered.contains("0/15"));
        assert!(!rendered.contains("0/30"));
    }

    #[test]
    fn test_ui_shows_extra_characters() {
        let mut app = create_test_app(&["hi"]);
        app.buffer = "hix".to_string();
        app.round.on_input(&app.buffer.clone(), Instant::now());
        let rendered = render(&app, Rect::new(0, 0, 80, 24));
        // once in the word line, once in the input line
        assert_eq!(rendered.matches("hix").count(), 2);
    }

    #[test]
    fn test_ui_debug_line() {
        let mut app = create_test_app(&["hello"]);
        app.round.on_input("!debug", Instant::now());
        let rendered = render(&app, Rect::new(0, 0, 100, 24));
        assert!(rendered.contains("elapsed_ms="));
    }

    #[test]
    fn test_ui_command_mode_notice() {
        let mut app = create_test_app(&["hello"]);
        app.buffer = "/he".to_string();
        app.round.on_input("/", Instant::now());
        let rendered = render(&app, Rect::new(0, 0, 80, 24));
        assert!(rendered.contains("paused"));
        assert!(rendered.contains("/he"));
    }

    #[test]
    fn test_ui_cheat_form_shows_errors() {
        let mut app = create_test_app(&["hello"]);
        let now = Instant::now();
        app.round.on_input("!godmode", now);
        app.state = AppState::CheatEntry;
        app.cheat_form = wordrush::cheat::CheatForm::new("900", "50", "1:00");
        match app.round.submit_cheat(&app.cheat_form, now) {
            Err(EngineError::CheatRejected(errors)) => app.cheat_errors = errors,
            other => panic!("expected rejection, got {other:?}"),
        }
        assert_ne!(app.cheat_errors, CheatErrors::default());

        let rendered = render(&app, Rect::new(0, 0, 80, 24));
        assert!(rendered.contains("wpm (0-300): 900"));
        assert!(rendered.contains("time (mm:ss)"));
    }

    #[test]
    fn test_ui_results_screen() {
        let mut app = create_test_app(&["hello"]);
        let summary = app.round.abort(Instant::now()).unwrap();
        app.summary = Some(summary);
        app.state = AppState::Results;

        let rendered = render(&app, Rect::new(0, 0, 80, 24));
        assert!(rendered.contains("Round aborted"));
        assert!(rendered.contains("not recorded"));
        assert!(rendered.contains("(r)etry"));
    }

    #[test]
    fn test_ui_widget_extreme_sizes() {
        let app = create_test_app(&["test"]);
        for area in [
            Rect::new(0, 0, 10, 5),
            Rect::new(0, 0, 1000, 1000),
            Rect::new(0, 0, 80, 24),
        ] {
            let mut buffer = Buffer::empty(area);
            (&app).render(area, &mut buffer);
            assert!(*buffer.area() == area);
        }
    }

    #[test]
    fn test_ui_constants() {
        assert_eq!(HORIZONTAL_MARGIN, 5);
        assert_eq!(VERTICAL_MARGIN, 2);
    }
}
