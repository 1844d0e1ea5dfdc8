use std::sync::Arc;
use std::time::Duration;
use tokio::{
    sync::Mutex,
    task::JoinHandle,
    time::{interval_at, Instant, MissedTickBehavior},
};
use super::api::TaskSource;
use super::dashboard::DashboardState;
use super::session::Session;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Reload the dashboard list every `period` without showing a loading
/// indicator. Stops once the server rejects the session; the state is
/// marked expired and the session is ended.
pub fn spawn_background_refresh<T>(
    source: Arc<T>,
    session: Session,
    state: Arc<Mutex<DashboardState>>,
    period: Duration,
) -> JoinHandle<()>
where
    T: TaskSource + 'static,
{
    tokio::spawn(async move {
        // The dashboard already did a foreground load, so wait one period first.
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let result = source.dashboard_tasks(&session).await;
            let keep_going = state.lock().await.apply_background(result);
            if !keep_going {
                tracing::info!("Stopping background refresh: session rejected");
                session.end();
                break;
            }
        }
    })
}
