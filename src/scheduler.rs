use std::time::Duration;

use tokio::sync::watch;

use crate::db;
use crate::state::SharedState;

/// Periodic housekeeping: publish due announcements, purge expired tokens,
/// prune rate-limiter entries. Runs until `shutdown` flips to true.
pub async fn run(state: SharedState, mut shutdown: watch::Receiver<bool>) {
    let interval = Duration::from_secs(state.config.scheduler_interval_secs.max(1));
    tracing::info!("Scheduler started (every {}s)", interval.as_secs());

    loop {
        if *shutdown.borrow() {
            break;
        }

        tick(&state).await;

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = shutdown.changed() => {}
        }
    }

    tracing::info!("Scheduler stopped");
}

pub async fn tick(state: &SharedState) {
    match db::announcements::publish_due(&state.pool).await {
        Ok(published) => {
            for a in &published {
                tracing::info!(announcement_id = %a.id, "Published scheduled announcement '{}'", a.title);
            }
        }
        Err(e) => tracing::error!("Failed to publish scheduled announcements: {e}"),
    }

    match db::tokens::purge_expired(&state.pool).await {
        Ok(0) => {}
        Ok(n) => tracing::debug!("Purged {n} expired tokens"),
        Err(e) => tracing::error!("Failed to purge expired tokens: {e}"),
    }

    state.chat_limiter.cleanup();
    state.login_limiter.cleanup();
}
