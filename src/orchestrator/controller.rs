//! Load lifecycle controller.
//!
//! Owns initial load, reload and date-rollover detection, and emits events for
//! presentation layers.

use crate::engine::{self, DashboardEngine};
use crate::model::{Dashboard, DashboardConfig, DashboardEvent, InfoEvent};
use anyhow::Result;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::{debug, info};

/// How often the local calendar date is checked for a rollover.
const DATE_CHECK_INTERVAL: Duration = Duration::from_secs(30);

/// Commands emitted by UI layers to control loading.
#[derive(Debug, Clone)]
pub(crate) enum UiCommand {
    Reload,
    Quit,
}

/// Spawn a load on the blocking pool; the pipeline itself is synchronous.
fn start_load(
    cfg: &DashboardConfig,
    event_tx: &UnboundedSender<DashboardEvent>,
) -> JoinHandle<Result<Dashboard>> {
    let _ = event_tx.send(DashboardEvent::Info(InfoEvent::Loading {
        path: cfg.input.clone(),
    }));
    let engine = DashboardEngine::new(cfg.clone());
    tokio::task::spawn_blocking(move || engine.run())
}

/// Orchestrate loads based on UI commands and emit events back to presentation layers.
pub(crate) async fn run_controller(
    cfg: &DashboardConfig,
    event_tx: UnboundedSender<DashboardEvent>,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
) -> Result<()> {
    let mut load = Some(start_load(cfg, &event_tx));
    let mut reload_pending = false;
    // A fixed --today never rolls over.
    let mut last_today = cfg.reference_date.is_none().then(engine::local_today);
    let mut date_check = tokio::time::interval(DATE_CHECK_INTERVAL);

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UiCommand::Reload) => {
                        // Serialized: never more than one load in flight.
                        if load.is_some() {
                            reload_pending = true;
                        } else {
                            load = Some(start_load(cfg, &event_tx));
                        }
                    }
                    Some(UiCommand::Quit) | None => {
                        debug!("controller shutting down");
                        break Ok(());
                    }
                }
            }
            // Do not take the JoinHandle before this branch wins; otherwise it can be dropped
            // if another select branch is chosen, and we'll never observe completion.
            maybe_done = async {
                if let Some(h) = load.as_mut() {
                    return Some(h.await);
                }
                futures::future::pending().await
            } => {
                if let Some(join_res) = maybe_done {
                    load = None;
                    match join_res {
                        Ok(Ok(dashboard)) => {
                            let _ = event_tx.send(DashboardEvent::Loaded {
                                dashboard: Box::new(dashboard),
                            });
                        }
                        Ok(Err(e)) => {
                            let _ = event_tx.send(DashboardEvent::Info(InfoEvent::LoadFailed {
                                reason: format!("{e:#}"),
                            }));
                        }
                        Err(e) => {
                            let _ = event_tx.send(DashboardEvent::Info(InfoEvent::Message(format!(
                                "Load task failed: {e}"
                            ))));
                        }
                    }
                    if reload_pending {
                        reload_pending = false;
                        load = Some(start_load(cfg, &event_tx));
                    }
                }
            }
            _ = date_check.tick() => {
                if let Some(prev) = last_today {
                    let today = engine::local_today();
                    if today != prev {
                        info!(from = %prev, to = %today, "calendar date rolled over");
                        last_today = Some(today);
                        let _ = event_tx.send(DashboardEvent::DateRolled { today });
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StatusFilter;
    use std::path::PathBuf;
    use time::macros::date;
    use tokio::sync::mpsc;

    fn config(input: PathBuf) -> DashboardConfig {
        DashboardConfig {
            input,
            deadline_column: "Last Date".into(),
            reference_date: Some(date!(2024 - 03 - 10)),
            urgent_window_days: 7,
            filter: StatusFilter::All,
        }
    }

    async fn next_non_info(rx: &mut UnboundedReceiver<DashboardEvent>) -> DashboardEvent {
        loop {
            match rx.recv().await.expect("controller closed the channel") {
                DashboardEvent::Info(InfoEvent::Loading { .. }) => continue,
                other => return other,
            }
        }
    }

    #[tokio::test]
    async fn loads_then_reloads_then_quits() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("tasks.csv");
        std::fs::write(&input, "Task,Last Date\na,Open\n").unwrap();

        let cfg = config(input.clone());
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let controller = tokio::spawn(async move { run_controller(&cfg, event_tx, cmd_rx).await });

        match next_non_info(&mut event_rx).await {
            DashboardEvent::Loaded { dashboard } => assert_eq!(dashboard.summary.open, 1),
            other => panic!("unexpected event: {other:?}"),
        }

        std::fs::write(&input, "Task,Last Date\na,Open\nb,01.01.2024\n").unwrap();
        cmd_tx.send(UiCommand::Reload).unwrap();
        match next_non_info(&mut event_rx).await {
            DashboardEvent::Loaded { dashboard } => assert_eq!(dashboard.summary.total, 2),
            other => panic!("unexpected event: {other:?}"),
        }

        cmd_tx.send(UiCommand::Quit).unwrap();
        controller.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn failed_load_is_reported_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("tasks.csv");
        std::fs::write(&input, "Task,Deadline\na,Open\n").unwrap();

        let cfg = config(input);
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let controller = tokio::spawn(async move { run_controller(&cfg, event_tx, cmd_rx).await });

        match next_non_info(&mut event_rx).await {
            DashboardEvent::Info(InfoEvent::LoadFailed { reason }) => {
                assert!(reason.contains("Last Date"))
            }
            other => panic!("unexpected event: {other:?}"),
        }

        drop(cmd_tx);
        controller.await.unwrap().unwrap();
    }
}
