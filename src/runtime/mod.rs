//! Async driver that owns a [`Session`]
//!
//! One task holds the session and is the only place it is mutated. Front
//! ends talk to it through a cloneable [`SimulatorHandle`]: events go in
//! over `mpsc`, the latest [`SessionView`] comes out on a `watch` channel and
//! notifications are fanned out on `broadcast`. The task stops, dropping its
//! timer, once every handle is gone.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::time::{sleep, Instant};
use tracing::{info, warn};

use crate::planner::{PlanData, PlanRequest, Planner, PlannerError};
use crate::session::{Effect, Notification, Session, SessionError, SessionEvent, SessionView};

const EVENT_QUEUE: usize = 64;
const NOTIFICATION_QUEUE: usize = 32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("simulator task has stopped")]
    Stopped,

    #[error(transparent)]
    Session(#[from] SessionError),
}

struct Command {
    event: SessionEvent,
    reply: oneshot::Sender<Result<(), SessionError>>,
}

/// Cloneable handle to a running simulator
#[derive(Clone)]
pub struct SimulatorHandle {
    events: mpsc::Sender<Command>,
    view: watch::Receiver<SessionView>,
    notifications: broadcast::Sender<Notification>,
    planner: Arc<dyn Planner>,
}

impl SimulatorHandle {
    /// Apply an event and wait until the session has accepted or refused it
    pub async fn send(&self, event: SessionEvent) -> Result<(), RuntimeError> {
        let (reply, response) = oneshot::channel();
        self.events
            .send(Command { event, reply })
            .await
            .map_err(|_| RuntimeError::Stopped)?;
        Ok(response.await.map_err(|_| RuntimeError::Stopped)??)
    }

    /// Latest snapshot
    pub fn view(&self) -> SessionView {
        self.view.borrow().clone()
    }

    pub fn watch_view(&self) -> watch::Receiver<SessionView> {
        self.view.clone()
    }

    pub fn notifications(&self) -> broadcast::Receiver<Notification> {
        self.notifications.subscribe()
    }

    pub async fn planner_status(&self) -> Result<(), PlannerError> {
        self.planner.status().await
    }
}

/// Start the driver task for `session`
///
/// Must be called from within a tokio runtime.
pub fn spawn_simulator(session: Session, planner: Arc<dyn Planner>) -> SimulatorHandle {
    let (events, rx) = mpsc::channel(EVENT_QUEUE);
    let (view_tx, view) = watch::channel(session.view());
    let (notifications, _) = broadcast::channel(NOTIFICATION_QUEUE);

    let driver = Driver {
        session,
        planner: planner.clone(),
        notifications: notifications.clone(),
        timer_armed: false,
        rearm_at: None,
    };
    tokio::spawn(driver.run(rx, view_tx));

    SimulatorHandle {
        events,
        view,
        notifications,
        planner,
    }
}

struct Driver {
    session: Session,
    planner: Arc<dyn Planner>,
    notifications: broadcast::Sender<Notification>,
    timer_armed: bool,
    rearm_at: Option<Instant>,
}

impl Driver {
    async fn run(mut self, mut events: mpsc::Receiver<Command>, view: watch::Sender<SessionView>) {
        let (plan_tx, mut plan_rx) = mpsc::channel(1);
        let timer = sleep(Duration::ZERO);
        tokio::pin!(timer);
        info!("simulator started");

        loop {
            if let Some(deadline) = self.rearm_at.take() {
                timer.as_mut().reset(deadline);
            }

            let mut answer = None;
            tokio::select! {
                command = events.recv() => {
                    let Some(Command { event, reply }) = command else {
                        break;
                    };
                    answer = Some((reply, self.apply(event, &plan_tx)));
                }
                () = &mut timer, if self.timer_armed => {
                    self.timer_armed = false;
                    if let Err(err) = self.apply(SessionEvent::Tick, &plan_tx) {
                        warn!(error = %err, "tick refused");
                    }
                }
                Some(result) = plan_rx.recv() => {
                    let event = match result {
                        Ok(data) => SessionEvent::PlanSucceeded(data),
                        Err(err) => SessionEvent::PlanFailed(err.to_string()),
                    };
                    if let Err(err) = self.apply(event, &plan_tx) {
                        warn!(error = %err, "plan result dropped");
                    }
                }
            }

            // Publish before replying so callers see their own change.
            view.send_replace(self.session.view());
            if let Some((reply, result)) = answer {
                let _ = reply.send(result);
            }
        }

        info!("simulator stopped");
    }

    fn apply(
        &mut self,
        event: SessionEvent,
        plan_tx: &mpsc::Sender<Result<PlanData, PlannerError>>,
    ) -> Result<(), SessionError> {
        for effect in self.session.apply(event)? {
            match effect {
                Effect::SendPlanRequest(request) => self.spawn_plan(request, plan_tx.clone()),
                Effect::ArmTimer(delay) => {
                    self.timer_armed = true;
                    self.rearm_at = Some(Instant::now() + delay);
                }
                Effect::CancelTimer => {
                    self.timer_armed = false;
                    self.rearm_at = None;
                }
                Effect::Notify(notification) => {
                    // No subscribers is fine.
                    let _ = self.notifications.send(notification);
                }
            }
        }
        Ok(())
    }

    fn spawn_plan(
        &self,
        request: PlanRequest,
        results: mpsc::Sender<Result<PlanData, PlannerError>>,
    ) {
        let planner = self.planner.clone();
        tokio::spawn(async move {
            let result = planner.plan(&request).await;
            let _ = results.send(result).await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{Direction, Position};
    use crate::grid::GridLayout;
    use crate::planner::ReplayPlanner;
    use crate::playback::PlaybackState;

    fn replay(steps: i32) -> Arc<dyn Planner> {
        Arc::new(ReplayPlanner::with_data(PlanData {
            path: (0..steps)
                .map(|i| Position::new(1, 1 + i, Direction::North))
                .collect(),
            commands: vec!["T50|0|10".to_string(), "FIN".to_string()],
            motions: None,
            distance: 3.0,
            runtime: 0.1,
        }))
    }

    #[tokio::test(start_paused = true)]
    async fn run_then_autoplay_to_the_last_step() {
        let session = Session::new(GridLayout::default(), Duration::from_millis(100));
        let handle = spawn_simulator(session, replay(4));
        let mut view = handle.watch_view();

        handle.send(SessionEvent::RunRequested).await.unwrap();
        view.wait_for(|v| v.step == Some(0)).await.unwrap();

        handle.send(SessionEvent::Play).await.unwrap();
        let done = view
            .wait_for(|v| v.state == PlaybackState::Ready && v.step == Some(3))
            .await
            .unwrap()
            .clone();
        assert_eq!(done.pose.y, 4);
    }

    #[tokio::test]
    async fn refused_events_come_back_as_errors() {
        let session = Session::new(GridLayout::default(), Duration::from_millis(100));
        let handle = spawn_simulator(session, replay(2));
        assert_eq!(
            handle.send(SessionEvent::Play).await,
            Err(RuntimeError::Session(SessionError::Playback(
                crate::playback::PlaybackError::NoPath
            )))
        );
    }
}
