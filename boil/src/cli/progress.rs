//! Terminal rendering of progress events

use boil_core::{ProgressEvent, ProgressReceiver, StageId};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressMode {
    Bars,
    Json,
}

/// Background task turning progress events into bars or JSON lines.
///
/// Runs are registered after submission, so events may arrive for a run the
/// view does not know yet; those are held until the run is registered.
pub struct ProgressView {
    registrations: mpsc::UnboundedSender<(Uuid, String)>,
    done: CancellationToken,
    task: JoinHandle<()>,
}

impl ProgressView {
    pub fn spawn(receiver: ProgressReceiver, mode: ProgressMode) -> Self {
        let (registrations, registration_rx) = mpsc::unbounded_channel();
        let done = CancellationToken::new();
        let task = tokio::spawn(render(receiver, registration_rx, done.clone(), mode));
        Self { registrations, done, task }
    }

    pub fn register(&self, run_id: Uuid, project_name: &str) {
        if self.registrations.send((run_id, project_name.to_string())).is_err() {
            warn!("Progress view stopped before {} was registered", project_name);
        }
    }

    /// Render whatever is still queued and stop
    pub async fn finish(self) {
        self.done.cancel();
        if let Err(e) = self.task.await {
            warn!("Progress view failed: {}", e);
        }
    }
}

async fn render(
    mut receiver: ProgressReceiver,
    mut registrations: mpsc::UnboundedReceiver<(Uuid, String)>,
    done: CancellationToken,
    mode: ProgressMode,
) {
    let mut bars = Bars::new(mode);

    loop {
        tokio::select! {
            biased;
            Some((run_id, name)) = registrations.recv() => bars.register(run_id, &name),
            Some(event) = receiver.recv() => bars.apply(event),
            _ = done.cancelled() => break,
        }
    }

    while let Ok((run_id, name)) = registrations.try_recv() {
        bars.register(run_id, &name);
    }
    while let Ok(event) = receiver.steps.try_recv() {
        bars.apply(event);
    }
    while let Ok(event) = receiver.errors.try_recv() {
        bars.apply(event);
    }
    bars.abandon_unfinished();
}

struct Bars {
    mode: ProgressMode,
    multi: MultiProgress,
    bars: HashMap<Uuid, ProgressBar>,
    pending: HashMap<Uuid, Vec<ProgressEvent>>,
}

impl Bars {
    fn new(mode: ProgressMode) -> Self {
        Self { mode, multi: MultiProgress::new(), bars: HashMap::new(), pending: HashMap::new() }
    }

    fn register(&mut self, run_id: Uuid, name: &str) {
        if self.mode == ProgressMode::Json {
            return;
        }

        let style = ProgressStyle::with_template(
            "{spinner:.green} {prefix:.bold} [{bar:24.cyan/blue}] {pos}/{len} {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");

        let bar = self.multi.add(ProgressBar::new(StageId::ALL.len() as u64));
        bar.set_style(style);
        bar.set_prefix(name.to_string());
        bar.set_message(StageId::GenerateProjectDetails.label());
        bar.enable_steady_tick(Duration::from_millis(120));
        self.bars.insert(run_id, bar);

        for event in self.pending.remove(&run_id).unwrap_or_default() {
            self.apply(event);
        }
    }

    fn apply(&mut self, event: ProgressEvent) {
        if self.mode == ProgressMode::Json {
            match serde_json::to_string(&event) {
                Ok(line) => println!("{}", line),
                Err(e) => warn!("Failed to serialize progress event: {}", e),
            }
            return;
        }

        let Some(bar) = self.bars.get(&event.run_id()) else {
            self.pending.entry(event.run_id()).or_default().push(event);
            return;
        };

        match event {
            ProgressEvent::Completed { stage: StageId::Done, .. } => {
                bar.inc(1);
                bar.finish_with_message("done");
            }
            ProgressEvent::Completed { stage, .. } => {
                bar.inc(1);
                if let Some(next) = stage.next() {
                    bar.set_message(next.label());
                }
            }
            ProgressEvent::Failed { stage, message, .. } => {
                bar.abandon_with_message(format!("{} failed: {}", stage, message));
            }
        }
    }

    fn abandon_unfinished(&self) {
        for bar in self.bars.values() {
            if !bar.is_finished() {
                bar.abandon();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_before_registration_are_replayed() {
        let mut bars = Bars::new(ProgressMode::Bars);
        bars.multi.set_draw_target(indicatif::ProgressDrawTarget::hidden());
        let run_id = Uuid::new_v4();

        bars.apply(ProgressEvent::Completed { run_id, stage: StageId::GenerateProjectDetails });
        assert_eq!(bars.pending.get(&run_id).map(Vec::len), Some(1));

        bars.register(run_id, "demo");
        assert!(bars.pending.is_empty());
        assert_eq!(bars.bars[&run_id].position(), 1);
    }

    #[test]
    fn test_done_finishes_bar() {
        let mut bars = Bars::new(ProgressMode::Bars);
        bars.multi.set_draw_target(indicatif::ProgressDrawTarget::hidden());
        let run_id = Uuid::new_v4();
        bars.register(run_id, "demo");

        for stage in StageId::ALL {
            bars.apply(ProgressEvent::Completed { run_id, stage });
        }
        assert!(bars.bars[&run_id].is_finished());
        assert_eq!(bars.bars[&run_id].position(), StageId::ALL.len() as u64);
    }
}
