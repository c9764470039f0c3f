use async_stream::stream;
use futures_util::{Stream, StreamExt};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, MissedTickBehavior, interval_at};

/// 自動リフレッシュまでの秒数
pub const COUNTDOWN_SECONDS: u32 = 30;

const TICK_PERIOD: Duration = Duration::from_secs(1);

/// One elapsed second of an armed countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    /// Identifies the timer that produced this tick.
    pub generation: u64,
    pub remaining: u32,
}

/// Yields `from - 1, from - 2, ..., 0`, one value per second.
fn remaining_seconds(from: u32) -> impl Stream<Item = u32> {
    stream! {
        let mut ticker = interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut remaining = from;
        while remaining > 0 {
            ticker.tick().await;
            remaining -= 1;
            yield remaining;
        }
    }
}

/// Handle to a running countdown.
///
/// The ticking task lives exactly as long as this handle: dropping it (disarm, re-arm, or the
/// owning session going away) aborts the task so no further ticks are sent.
#[derive(Debug)]
pub struct CountdownTimer {
    generation: u64,
    task: JoinHandle<()>,
}

impl CountdownTimer {
    pub fn arm(generation: u64, seconds: u32, ticks: UnboundedSender<Tick>) -> Self {
        tracing::debug!(generation, seconds, "Arming countdown");
        let task = tokio::spawn(async move {
            let stream = remaining_seconds(seconds);
            tokio::pin!(stream);
            while let Some(remaining) = stream.next().await {
                if ticks.send(Tick { generation, remaining }).is_err() {
                    break;
                }
            }
        });

        Self { generation, task }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Drop for CountdownTimer {
    fn drop(&mut self) {
        tracing::debug!(generation = self.generation, "Disarming countdown");
        self.task.abort();
    }
}
