use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::insights::generator::refresh_all;
use crate::llm_client::TextGenerator;

/// Spawns the periodic insight refresh. The first run happens one full
/// `period` after startup.
pub fn spawn_refresher(
    pool: PgPool,
    generator: Arc<dyn TextGenerator>,
    period: Duration,
) -> JoinHandle<()> {
    info!("Insight refresher scheduled every {period:?}");
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately.
        interval.tick().await;
        loop {
            interval.tick().await;
            if let Err(e) = refresh_all(&pool, generator.as_ref()).await {
                error!("Scheduled insight refresh failed: {e}");
            }
        }
    })
}
