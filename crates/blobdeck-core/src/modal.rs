use std::fmt;

pub const MODAL_PAGE_STEP: usize = 10;

/// Title of a text frame opened from inside another frame.
pub const DETAIL_TITLE: &str = "Details";

/// What a line activation produced.
pub enum Detail {
    Frame(ModalFrame),
    Text(String),
}

impl Detail {
    /// Wraps plain text in a frame titled `title`.
    pub fn into_frame(self, title: &str) -> ModalFrame {
        match self {
            Self::Frame(frame) => frame,
            Self::Text(text) => ModalFrame::from_text(title, &text),
        }
    }
}

/// Handler invoked when a line of a frame is activated.
pub trait LineActivation {
    fn activate(&mut self, line: usize) -> Option<Detail>;
}

impl<F> LineActivation for F
where
    F: FnMut(usize) -> Option<Detail>,
{
    fn activate(&mut self, line: usize) -> Option<Detail> {
        self(line)
    }
}

pub struct ModalFrame {
    title: String,
    lines: Vec<String>,
    selected: usize,
    handler: Option<Box<dyn LineActivation>>,
}

impl ModalFrame {
    pub fn new(title: impl Into<String>, lines: Vec<String>) -> Self {
        let mut lines = lines;
        if lines.is_empty() {
            lines.push(String::new());
        }
        Self {
            title: title.into(),
            lines,
            selected: 0,
            handler: None,
        }
    }

    pub fn from_text(title: impl Into<String>, text: &str) -> Self {
        Self::new(title, text.lines().map(str::to_string).collect())
    }

    pub fn with_handler(mut self, handler: impl LineActivation + 'static) -> Self {
        self.handler = Some(Box::new(handler));
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn has_handler(&self) -> bool {
        self.handler.is_some()
    }

    pub fn selected_line(&self) -> &str {
        self.lines
            .get(self.selected)
            .map(String::as_str)
            .unwrap_or_default()
    }

    pub fn all_text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn hint(&self) -> String {
        format!("line {}/{}", self.selected + 1, self.lines.len())
    }

    pub fn select(&mut self, line: usize) {
        self.selected = line.min(self.lines.len().saturating_sub(1));
    }

    pub fn move_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        self.select(self.selected + 1);
    }

    pub fn page_up(&mut self) {
        self.selected = self.selected.saturating_sub(MODAL_PAGE_STEP);
    }

    pub fn page_down(&mut self) {
        self.select(self.selected + MODAL_PAGE_STEP);
    }

    pub fn first(&mut self) {
        self.selected = 0;
    }

    pub fn last(&mut self) {
        self.select(self.lines.len());
    }

    fn activate_selected(&mut self) -> Option<Detail> {
        let line = self.selected;
        self.handler.as_mut()?.activate(line)
    }
}

impl fmt::Debug for ModalFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModalFrame")
            .field("title", &self.title)
            .field("lines", &self.lines.len())
            .field("selected", &self.selected)
            .field("handler", &self.handler.is_some())
            .finish()
    }
}

/// Interactive element that had focus when a frame was pushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Table { selection: usize },
    Frame { depth: usize, line: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Pushed,
    Popped(Focus),
    Empty,
}

/// LIFO of detail frames. Only the top frame receives input.
#[derive(Debug, Default)]
pub struct ModalStack {
    frames: Vec<(ModalFrame, Focus)>,
}

impl ModalStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_active(&self) -> bool {
        !self.frames.is_empty()
    }

    pub fn push(&mut self, frame: ModalFrame, focus: Focus) {
        self.frames.push((frame, focus));
    }

    /// Removes the top frame and returns the focus captured when it was pushed.
    pub fn pop(&mut self) -> Option<Focus> {
        let (_, focus) = self.frames.pop()?;
        if let Focus::Frame { depth, line } = focus
            && let Some((parent, _)) = self.frames.get_mut(depth.saturating_sub(1))
        {
            parent.select(line);
        }
        Some(focus)
    }

    pub fn top(&self) -> Option<&ModalFrame> {
        self.frames.last().map(|(frame, _)| frame)
    }

    pub fn top_mut(&mut self) -> Option<&mut ModalFrame> {
        self.frames.last_mut().map(|(frame, _)| frame)
    }

    pub fn titles(&self) -> Vec<&str> {
        self.frames.iter().map(|(frame, _)| frame.title()).collect()
    }

    /// Runs the top frame's handler on its selected line.
    ///
    /// A produced detail is pushed as a child frame; no handler or no detail
    /// closes the top frame.
    pub fn activate_current(&mut self) -> Activation {
        let depth = self.depth();
        let Some(top) = self.top_mut() else {
            return Activation::Empty;
        };

        let line = top.selected();
        match top.activate_selected() {
            Some(detail) => {
                self.push(
                    detail.into_frame(DETAIL_TITLE),
                    Focus::Frame { depth, line },
                );
                Activation::Pushed
            }
            None => match self.pop() {
                Some(focus) => Activation::Popped(focus),
                None => Activation::Empty,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    fn lines(count: usize) -> Vec<String> {
        (0..count).map(|index| format!("line {index}")).collect()
    }

    #[test]
    fn frame_movement_is_bounded() {
        let mut frame = ModalFrame::new("t", lines(25));
        frame.move_up();
        assert_eq!(frame.selected(), 0);
        frame.page_down();
        assert_eq!(frame.selected(), 10);
        frame.page_down();
        frame.page_down();
        assert_eq!(frame.selected(), 24);
        frame.page_up();
        assert_eq!(frame.selected(), 14);
        frame.first();
        assert_eq!(frame.selected(), 0);
        frame.last();
        assert_eq!(frame.selected(), 24);
        assert_eq!(frame.hint(), "line 25/25");
        assert_eq!(frame.selected_line(), "line 24");
    }

    #[test]
    fn empty_frame_still_has_one_line() {
        let frame = ModalFrame::new("empty", Vec::new());
        assert_eq!(frame.lines().len(), 1);
        assert_eq!(frame.hint(), "line 1/1");
    }

    #[test]
    fn push_then_pop_restores_focus() {
        let mut stack = ModalStack::new();
        stack.push(
            ModalFrame::new("a", lines(3)),
            Focus::Table { selection: 4 },
        );
        assert!(stack.is_active());

        assert_eq!(stack.pop(), Some(Focus::Table { selection: 4 }));
        assert_eq!(stack.depth(), 0);
        assert_eq!(stack.pop(), None);
    }

    #[test]
    fn activation_pushes_nested_frames_and_pop_restores_parent_line() {
        let opened = Rc::new(RefCell::new(Vec::new()));
        let record = Rc::clone(&opened);
        let inner = |line: usize| Some(Detail::Text(format!("field {line}")));
        let frame = ModalFrame::new("upload", lines(5)).with_handler(move |line: usize| {
            record.borrow_mut().push(line);
            Some(Detail::Frame(
                ModalFrame::new(format!("shard {line}"), lines(2)).with_handler(inner),
            ))
        });

        let mut stack = ModalStack::new();
        stack.push(frame, Focus::Table { selection: 2 });
        stack.top_mut().expect("top").select(3);

        assert_eq!(stack.activate_current(), Activation::Pushed);
        assert_eq!(stack.depth(), 2);
        assert_eq!(stack.top().expect("top").title(), "shard 3");
        assert_eq!(stack.top().expect("top").selected(), 0);

        stack.top_mut().expect("top").move_down();
        assert_eq!(stack.activate_current(), Activation::Pushed);
        assert_eq!(stack.titles(), vec!["upload", "shard 3", DETAIL_TITLE]);
        assert_eq!(stack.top().expect("top").lines(), &["field 1".to_string()]);

        assert_eq!(stack.pop(), Some(Focus::Frame { depth: 2, line: 1 }));
        assert_eq!(stack.top().expect("top").selected(), 1);
        assert_eq!(stack.pop(), Some(Focus::Frame { depth: 1, line: 3 }));
        assert_eq!(stack.top().expect("top").selected(), 3);
        assert_eq!(stack.pop(), Some(Focus::Table { selection: 2 }));
        assert_eq!(*opened.borrow(), vec![3]);
    }

    #[test]
    fn activation_without_detail_pops_top_frame() {
        let mut stack = ModalStack::new();
        stack.push(
            ModalFrame::new("plain", lines(2)),
            Focus::Table { selection: 1 },
        );
        assert_eq!(
            stack.activate_current(),
            Activation::Popped(Focus::Table { selection: 1 })
        );

        stack.push(
            ModalFrame::new("declines", lines(2)).with_handler(|_: usize| None),
            Focus::Table { selection: 5 },
        );
        assert_eq!(
            stack.activate_current(),
            Activation::Popped(Focus::Table { selection: 5 })
        );
        assert_eq!(stack.activate_current(), Activation::Empty);
    }

    #[test]
    fn all_text_joins_lines() {
        let frame = ModalFrame::from_text("t", "a\nb");
        assert_eq!(frame.all_text(), "a\nb");
    }

    #[test]
    fn text_detail_from_a_frame_is_titled_details() {
        let frame = ModalFrame::new("Upload Details", lines(3))
            .with_handler(|line: usize| Some(Detail::Text(format!("shard {line}"))));
        let mut stack = ModalStack::new();
        stack.push(frame, Focus::Table { selection: 0 });
        stack.top_mut().expect("top").select(2);

        assert_eq!(stack.activate_current(), Activation::Pushed);
        assert_eq!(stack.titles(), vec!["Upload Details", "Details"]);
        assert_eq!(stack.top().expect("top").all_text(), "shard 2");
    }
}
