use std::sync::mpsc::{self, Receiver, TryRecvError};

use anyhow::Result;
use crossterm::event::KeyEvent;
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::text::{Line, Text};
use ratatui::widgets::Paragraph;

use crate::keymap;
use crate::theme;
use crate::ui::loading::LoadingState;
use crate::ui::text::{focus_line, key_hint_paragraph};

pub(crate) type LogSink<'a> = &'a (dyn Fn(String) + Sync);
pub(crate) type Job = Box<dyn for<'a> FnOnce(LogSink<'a>) -> Result<()> + Send>;

#[derive(Debug)]
pub(crate) enum JobEvent {
    Line(String),
    Finished(Result<(), String>),
}

/// Runs a destructive job away from the UI thread, streaming its log lines.
pub(crate) trait JobSpawner {
    fn spawn(&self, job: Job) -> Receiver<JobEvent>;
}

#[derive(Debug, Default)]
pub(crate) struct ThreadJobSpawner;

impl JobSpawner for ThreadJobSpawner {
    fn spawn(&self, job: Job) -> Receiver<JobEvent> {
        let (sender, receiver) = mpsc::channel();
        std::thread::spawn(move || run_job(job, &sender));
        receiver
    }
}

pub(crate) fn run_job(job: Job, sender: &mpsc::Sender<JobEvent>) {
    let log = |line: String| {
        let _ = sender.send(JobEvent::Line(line));
    };
    let result = job(&log).map_err(|error| format!("{error:#}"));
    let _ = sender.send(JobEvent::Finished(result));
}

/// Streamed log of one job. It only closes once the job has finished.
pub(crate) struct LogView {
    title: String,
    lines: Vec<String>,
    receiver: Option<Receiver<JobEvent>>,
    finished: bool,
    scroll_back: usize,
    loading: LoadingState,
}

impl LogView {
    pub(crate) fn start(
        title: impl Into<String>,
        header: Vec<String>,
        spawner: &dyn JobSpawner,
        job: Job,
    ) -> Self {
        Self {
            title: title.into(),
            lines: header,
            receiver: Some(spawner.spawn(job)),
            finished: false,
            scroll_back: 0,
            loading: LoadingState::default(),
        }
    }

    #[cfg(test)]
    pub(crate) fn lines(&self) -> &[String] {
        &self.lines
    }

    #[cfg(test)]
    pub(crate) fn is_finished(&self) -> bool {
        self.finished
    }

    pub(crate) fn on_tick(&mut self) {
        if self.finished {
            return;
        }
        self.loading.next_frame();

        let mut disconnected = false;
        if let Some(receiver) = &self.receiver {
            loop {
                match receiver.try_recv() {
                    Ok(JobEvent::Line(line)) => self.lines.push(line),
                    Ok(JobEvent::Finished(result)) => {
                        if let Err(error) = result {
                            self.lines.push(format!("Error: {error}"));
                        }
                        self.finished = true;
                        break;
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        disconnected = true;
                        break;
                    }
                }
            }
        }

        if disconnected && !self.finished {
            self.lines
                .push("Error: job worker ended unexpectedly".to_string());
            self.finished = true;
        }
        if self.finished {
            self.receiver = None;
        }
    }

    /// Returns true when the view should close.
    pub(crate) fn on_key(&mut self, key: KeyEvent) -> bool {
        if keymap::is_up(key) {
            if self.scroll_back + 1 < self.lines.len() {
                self.scroll_back += 1;
            }
            return false;
        }
        if keymap::is_down(key) {
            self.scroll_back = self.scroll_back.saturating_sub(1);
            return false;
        }
        if keymap::is_last(key) {
            self.scroll_back = 0;
            return false;
        }
        self.finished && (keymap::is_close(key) || keymap::is_confirm(key))
    }

    pub(crate) fn render(&self, frame: &mut Frame<'_>) {
        let area = frame.area();
        let [body, footer] = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(3)])
            .areas(area);

        let height = body.height.saturating_sub(2) as usize;
        let end = self.lines.len().saturating_sub(self.scroll_back);
        let start = end.saturating_sub(height);
        let visible: Vec<Line<'_>> = self.lines[start..end]
            .iter()
            .map(|line| Line::from(line.as_str()))
            .collect();
        frame.render_widget(
            Paragraph::new(Text::from(visible))
                .block(theme::chrome(focus_line(self.title.clone()))),
            body,
        );

        let status = if self.finished {
            "Done.    Enter/q/Esc: close    j/k: scroll".to_string()
        } else {
            format!("{} Running...    j/k: scroll", self.loading.current_frame())
        };
        frame.render_widget(key_hint_paragraph(status).block(theme::key_block()), footer);
    }
}
