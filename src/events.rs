use crate::model::Pipeline;
use crossterm::event::{self, Event as CrosstermEvent, KeyEvent};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::mpsc;

/// How often the input thread wakes to check the stop flag.
const INPUT_POLL_PERIOD: Duration = Duration::from_millis(50);

/// Everything that can re-enter the event loop: key presses, the tick
/// cadence, and completions of background operations. Completions that
/// belong to a log session carry the generation they were issued under.
#[derive(Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Tick,
    PipelineResult(Result<Pipeline, String>),
    LogResult {
        generation: u64,
        result: Result<String, String>,
    },
    ActionOutcome {
        label: &'static str,
        result: Result<(), String>,
    },
}

/// Funnels key presses and the tick cadence into one channel. Keys come
/// from a dedicated thread (crossterm reads block); ticks come from an
/// interval task on the runtime. Both end when the handler is dropped.
pub struct EventHandler {
    tx: mpsc::UnboundedSender<AppEvent>,
    rx: mpsc::UnboundedReceiver<AppEvent>,
    stop_input: Arc<AtomicBool>,
    input_thread: Option<JoinHandle<()>>,
}

impl EventHandler {
    /// Must be called from within a tokio runtime.
    pub fn new(tick_period: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let stop_input = Arc::new(AtomicBool::new(false));

        let ticker_tx = tx.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(tick_period);
            loop {
                ticker.tick().await;
                if ticker_tx.send(AppEvent::Tick).is_err() {
                    return;
                }
            }
        });

        let key_tx = tx.clone();
        let stop = stop_input.clone();
        let input_thread = std::thread::spawn(move || forward_keys(&key_tx, &stop));

        Self {
            tx,
            rx,
            stop_input,
            input_thread: Some(input_thread),
        }
    }

    /// A sender background tasks use to report completions.
    pub fn sender(&self) -> mpsc::UnboundedSender<AppEvent> {
        self.tx.clone()
    }

    pub async fn next(&mut self) -> Option<AppEvent> {
        self.rx.recv().await
    }

    pub fn stop(&mut self) {
        self.stop_input.store(true, Ordering::Relaxed);
        if let Some(thread) = self.input_thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for EventHandler {
    fn drop(&mut self) {
        self.stop();
    }
}

fn forward_keys(tx: &mpsc::UnboundedSender<AppEvent>, stop: &AtomicBool) {
    while !stop.load(Ordering::Relaxed) {
        match event::poll(INPUT_POLL_PERIOD) {
            Ok(true) => {
                if let Ok(CrosstermEvent::Key(key)) = event::read() {
                    if tx.send(AppEvent::Key(key)).is_err() {
                        return;
                    }
                }
            }
            Ok(false) => {}
            Err(_) => return,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ticks_flow_through_the_channel() {
        let mut events = EventHandler::new(Duration::from_millis(5));
        let ev = events.next().await.expect("event");
        assert!(matches!(ev, AppEvent::Tick));
        events.stop();
    }

    #[tokio::test]
    async fn external_completions_share_the_channel() {
        let mut events = EventHandler::new(Duration::from_secs(60));
        let tx = events.sender();
        tx.send(AppEvent::LogResult {
            generation: 3,
            result: Ok("done".to_string()),
        })
        .expect("send");

        // the interval task emits an immediate first tick; skip past it
        loop {
            match events.next().await.expect("event") {
                AppEvent::LogResult { generation, result } => {
                    assert_eq!(generation, 3);
                    assert_eq!(result.as_deref(), Ok("done"));
                    break;
                }
                _ => {}
            }
        }
        events.stop();
    }
}
