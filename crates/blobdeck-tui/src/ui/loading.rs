use std::sync::Arc;
use std::sync::mpsc::{self, Receiver};

use blobdeck_core::nav::FetchRequest;
use blobdeck_core::page::{Page, PageSource, RemoteError};

const FRAMES: [&str; 8] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧"];

#[derive(Debug, Clone, Default)]
pub(crate) struct LoadingState {
    frame_index: usize,
}

impl LoadingState {
    pub(crate) fn next_frame(&mut self) {
        self.frame_index = (self.frame_index + 1) % FRAMES.len();
    }

    pub(crate) fn current_frame(&self) -> &'static str {
        FRAMES[self.frame_index]
    }
}

pub(crate) type PageResult<T> = Result<Page<T>, RemoteError>;

/// Runs one page fetch off the UI thread and reports through a channel.
pub(crate) trait PageLoader<T> {
    fn spawn_fetch(&self, request: FetchRequest) -> Receiver<PageResult<T>>;
}

pub(crate) struct ThreadPageLoader<T> {
    source: Arc<dyn PageSource<T>>,
}

impl<T> ThreadPageLoader<T> {
    pub(crate) fn new(source: Arc<dyn PageSource<T>>) -> Self {
        Self { source }
    }
}

impl<T> PageLoader<T> for ThreadPageLoader<T>
where
    T: Send + 'static,
{
    fn spawn_fetch(&self, request: FetchRequest) -> Receiver<PageResult<T>> {
        let (sender, receiver) = mpsc::channel();
        let source = Arc::clone(&self.source);
        std::thread::spawn(move || {
            let result = source.fetch(request.cursor.as_ref(), request.page_size);
            let _ = sender.send(result);
        });
        receiver
    }
}
