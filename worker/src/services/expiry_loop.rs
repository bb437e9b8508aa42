use anyhow::Result;
use std::{sync::Arc, time::Duration};
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use crate::usecases::expire_boosts::ExpireBoostsUseCase;

pub async fn run(usecase: Arc<ExpireBoostsUseCase>, interval_secs: u64) -> Result<()> {
    info!(interval_secs, "Starting boost expiry loop");

    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        if let Err(e) = usecase.run().await {
            error!(error = ?e, "expiry_loop: sweep failed, retrying next tick");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crates::domain::{
        repositories::boost_expiry::MockBoostExpiryRepository,
        value_objects::boosts::ExpiredBoostCounts,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn sweeps_immediately_and_keeps_ticking_after_a_failure() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let mut repository = MockBoostExpiryRepository::new();
        repository.expect_expire_old_boosts().returning(move |_, _| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(anyhow::anyhow!("connection reset"))
            } else {
                Ok(ExpiredBoostCounts::default())
            }
        });
        let usecase = Arc::new(ExpireBoostsUseCase::new(Arc::new(repository)));

        let sweeper = tokio::spawn(run(usecase, 1800));

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(2 * 1800)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(!sweeper.is_finished());

        sweeper.abort();
    }
}
