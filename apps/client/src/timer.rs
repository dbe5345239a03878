//! Once-per-second quiz countdown.

use std::sync::Arc;
use std::time::Duration;

use mathlearn_core::{QuizResult, QuizSession};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

const TICK: Duration = Duration::from_secs(1);

/// Handle to a running countdown. Dropping it stops the countdown.
#[derive(Debug)]
pub struct TimerHandle {
    task: JoinHandle<()>,
}

impl TimerHandle {
    /// Whether the countdown task has ended (expired, submitted or untimed).
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Drive `session`'s countdown, calling `on_expire` once if time runs out.
///
/// The session must already be started. The task ends on its own when the
/// quiz is submitted by other means or has no time limit.
pub fn spawn_countdown<F>(session: Arc<Mutex<QuizSession>>, on_expire: F) -> TimerHandle
where
    F: FnOnce(QuizResult) + Send + 'static,
{
    let task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(TICK);
        // First tick completes immediately.
        interval.tick().await;

        loop {
            interval.tick().await;

            let expired = {
                let mut quiz = session.lock().await;
                if !quiz.is_in_progress() || quiz.time_left_secs().is_none() {
                    return;
                }
                quiz.tick(1)
            };

            if let Some(result) = expired {
                tracing::info!(score = result.score, total = result.total, "quiz time expired");
                on_expire(result);
                return;
            }
        }
    });

    TimerHandle { task }
}
