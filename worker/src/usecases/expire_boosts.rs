use anyhow::Result;
use chrono::{DateTime, Utc};
use crates::domain::{
    repositories::boost_expiry::BoostExpiryRepository,
    value_objects::boosts::{ExpiredBoostCounts, boost_duration},
};
use std::sync::Arc;
use tracing::{debug, info};

/// Housekeeping for stored boost flags. Reads already treat stale boosts as expired, so a
/// late or skipped run changes nothing user-visible.
pub struct ExpireBoostsUseCase {
    repository: Arc<dyn BoostExpiryRepository + Send + Sync>,
}

impl ExpireBoostsUseCase {
    pub fn new(repository: Arc<dyn BoostExpiryRepository + Send + Sync>) -> Self {
        Self { repository }
    }

    pub async fn run(&self) -> Result<ExpiredBoostCounts> {
        self.run_at(Utc::now()).await
    }

    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<ExpiredBoostCounts> {
        let cutoff = now - boost_duration();
        let today = now.date_naive();

        let counts = self.repository.expire_old_boosts(cutoff, today).await?;

        if counts.total() == 0 {
            debug!(%cutoff, "expire_boosts: nothing to clear");
        } else {
            info!(
                %cutoff,
                commerces = counts.commerces,
                offers = counts.offers,
                events = counts.events,
                deactivated_offers = counts.deactivated_offers,
                deactivated_events = counts.deactivated_events,
                "expire_boosts: sweep complete"
            );
        }

        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, TimeZone};
    use crates::domain::repositories::boost_expiry::MockBoostExpiryRepository;
    use mockall::predicate::eq;

    #[tokio::test]
    async fn sweeps_with_72h_cutoff_and_todays_date() {
        let now = Utc.with_ymd_and_hms(2025, 6, 10, 12, 0, 0).unwrap();
        let mut repository = MockBoostExpiryRepository::new();
        repository
            .expect_expire_old_boosts()
            .with(
                eq(now - Duration::hours(72)),
                eq(NaiveDate::from_ymd_opt(2025, 6, 10).unwrap()),
            )
            .times(1)
            .returning(|_, _| {
                Ok(ExpiredBoostCounts {
                    commerces: 1,
                    offers: 2,
                    events: 0,
                    deactivated_offers: 1,
                    deactivated_events: 0,
                })
            });

        let counts = ExpireBoostsUseCase::new(Arc::new(repository))
            .run_at(now)
            .await
            .unwrap();

        assert_eq!(counts.total(), 4);
    }

    #[tokio::test]
    async fn empty_sweep_is_ok() {
        let mut repository = MockBoostExpiryRepository::new();
        repository
            .expect_expire_old_boosts()
            .returning(|_, _| Ok(ExpiredBoostCounts::default()));

        let counts = ExpireBoostsUseCase::new(Arc::new(repository))
            .run()
            .await
            .unwrap();

        assert_eq!(counts, ExpiredBoostCounts::default());
    }

    #[tokio::test]
    async fn repository_error_propagates() {
        let mut repository = MockBoostExpiryRepository::new();
        repository
            .expect_expire_old_boosts()
            .returning(|_, _| Err(anyhow::anyhow!("deadlock detected")));

        assert!(
            ExpireBoostsUseCase::new(Arc::new(repository))
                .run()
                .await
                .is_err()
        );
    }
}
