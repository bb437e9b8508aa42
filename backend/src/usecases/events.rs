use std::{collections::HashMap, sync::Arc};

use chrono::Utc;
use crates::domain::{
    entities::events::EventEntity,
    repositories::{
        commerces::CommerceRepository, dashboard::DashboardRepository, events::EventRepository,
        subscriptions::SubscriptionRepository,
    },
    value_objects::{
        boosts::Locale,
        events::{EventDto, EventForm},
        plans::plan_limit,
    },
};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::usecases::{
    content::{ContentError, UseCaseResult, ensure_commerces_owned},
    plan_resolver::PlanResolver,
};

pub struct EventUseCase<E, C, S, D>
where
    E: EventRepository + Send + Sync + 'static,
    C: CommerceRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    D: DashboardRepository + Send + Sync + 'static,
{
    event_repo: Arc<E>,
    commerce_repo: Arc<C>,
    plan_resolver: Arc<PlanResolver<S, D>>,
}

impl<E, C, S, D> EventUseCase<E, C, S, D>
where
    E: EventRepository + Send + Sync + 'static,
    C: CommerceRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    D: DashboardRepository + Send + Sync + 'static,
{
    pub fn new(
        event_repo: Arc<E>,
        commerce_repo: Arc<C>,
        plan_resolver: Arc<PlanResolver<S, D>>,
    ) -> Self {
        Self {
            event_repo,
            commerce_repo,
            plan_resolver,
        }
    }

    pub async fn list(&self, user_id: Uuid, locale: Locale) -> UseCaseResult<Vec<EventDto>> {
        let events = self.event_repo.list_by_user(user_id).await.map_err(|err| {
            error!(%user_id, db_error = ?err, "events: failed to list");
            ContentError::Internal(err)
        })?;

        if events.is_empty() {
            return Ok(Vec::new());
        }

        let event_ids = events.iter().map(|event| event.id).collect();
        let links = self
            .event_repo
            .list_event_commerces(event_ids)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "events: failed to load additional commerces");
                ContentError::Internal(err)
            })?;

        let mut additional: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for link in links {
            additional
                .entry(link.event_id)
                .or_default()
                .push(link.commerce_id);
        }

        let now = Utc::now();
        Ok(events
            .into_iter()
            .map(|event| {
                let commerce_ids = additional.remove(&event.id).unwrap_or_default();
                EventDto::from_entity(event, commerce_ids, locale, now)
            })
            .collect())
    }

    /// Primary and additional commerces must all belong to the user.
    pub async fn create(
        &self,
        user_id: Uuid,
        form: EventForm,
        locale: Locale,
    ) -> UseCaseResult<EventDto> {
        let event = form.validate()?;
        ensure_commerces_owned(self.commerce_repo.as_ref(), user_id, event.all_commerce_ids())
            .await?;

        let plan_type = self
            .plan_resolver
            .resolve_plan_type(user_id)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "events: failed to resolve plan");
                ContentError::Internal(err)
            })?;
        let limit = plan_limit(plan_type);

        let created = self
            .event_repo
            .create_within_limit(
                event.to_insert(user_id),
                event.additional_commerce_ids.clone(),
                limit,
            )
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "events: failed to create");
                ContentError::Internal(err)
            })?;

        let Some(created) = created else {
            warn!(%user_id, %plan_type, limit, "events: content limit reached");
            return Err(ContentError::ContentLimitReached { limit });
        };

        info!(%user_id, event_id = %created.id, "events: created");
        Ok(to_dto(created, event.additional_commerce_ids, locale))
    }

    pub async fn update(
        &self,
        user_id: Uuid,
        event_id: Uuid,
        form: EventForm,
        locale: Locale,
    ) -> UseCaseResult<EventDto> {
        let event = form.validate()?;
        ensure_commerces_owned(self.commerce_repo.as_ref(), user_id, event.all_commerce_ids())
            .await?;

        let updated = self
            .event_repo
            .update(
                user_id,
                event_id,
                event.to_update(Utc::now()),
                event.additional_commerce_ids.clone(),
            )
            .await
            .map_err(|err| {
                error!(%user_id, %event_id, db_error = ?err, "events: failed to update");
                ContentError::Internal(err)
            })?
            .ok_or(ContentError::NotFound("event"))?;

        info!(%user_id, %event_id, "events: updated");
        Ok(to_dto(updated, event.additional_commerce_ids, locale))
    }

    pub async fn delete(&self, user_id: Uuid, event_id: Uuid) -> UseCaseResult<()> {
        let deleted = self
            .event_repo
            .delete(user_id, event_id)
            .await
            .map_err(|err| {
                error!(%user_id, %event_id, db_error = ?err, "events: failed to delete");
                ContentError::Internal(err)
            })?;

        if !deleted {
            return Err(ContentError::NotFound("event"));
        }

        info!(%user_id, %event_id, "events: deleted");
        Ok(())
    }
}

fn to_dto(entity: EventEntity, additional_commerce_ids: Vec<Uuid>, locale: Locale) -> EventDto {
    EventDto::from_entity(entity, additional_commerce_ids, locale, Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::plan_resolver::test_support::profile;
    use chrono::{Duration, NaiveDate};
    use crates::domain::{
        entities::events::EventCommerceEntity,
        repositories::{
            commerces::MockCommerceRepository, dashboard::MockDashboardRepository,
            events::MockEventRepository, subscriptions::MockSubscriptionRepository,
        },
    };

    fn form(commerce_id: Uuid, additional: Vec<Uuid>) -> EventForm {
        EventForm {
            commerce_id: Some(commerce_id),
            category_events_id: None,
            title: "Soirée jazz".to_string(),
            description: "Musique live".to_string(),
            start_date: NaiveDate::from_ymd_opt(2025, 7, 4),
            end_date: NaiveDate::from_ymd_opt(2025, 7, 4),
            is_active: true,
            image_url: None,
            additional_commerce_ids: additional,
        }
    }

    fn event(user_id: Uuid, commerce_id: Uuid, boosted_hours_ago: Option<i64>) -> EventEntity {
        let now = Utc::now();
        let boosted_at = boosted_hours_ago.map(|hours| now - Duration::hours(hours));
        EventEntity {
            id: Uuid::new_v4(),
            commerce_id,
            user_id,
            category_events_id: None,
            title: "Soirée jazz".to_string(),
            description: "Musique live".to_string(),
            start_date: now.date_naive(),
            end_date: now.date_naive() + Duration::days(1),
            is_active: true,
            image_url: None,
            boosted: boosted_at.is_some(),
            boost_type: boosted_at.map(|_| "visibilite".to_string()),
            boosted_at,
            created_at: now,
            updated_at: now,
        }
    }

    fn free_plan() -> MockSubscriptionRepository {
        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_find_current_subscription()
            .returning(|_| Ok(None));
        subscription_repo
            .expect_find_profile()
            .returning(|user_id| Ok(Some(profile(user_id, false, None))));
        subscription_repo
    }

    fn usecase(
        event_repo: MockEventRepository,
        commerce_repo: MockCommerceRepository,
        subscription_repo: MockSubscriptionRepository,
    ) -> EventUseCase<
        MockEventRepository,
        MockCommerceRepository,
        MockSubscriptionRepository,
        MockDashboardRepository,
    > {
        let plan_resolver = PlanResolver::new(
            Arc::new(subscription_repo),
            Arc::new(MockDashboardRepository::new()),
        );
        EventUseCase::new(
            Arc::new(event_repo),
            Arc::new(commerce_repo),
            Arc::new(plan_resolver),
        )
    }

    #[tokio::test]
    async fn list_attaches_additional_commerces() {
        let user_id = Uuid::new_v4();
        let primary = Uuid::new_v4();
        let extra = Uuid::new_v4();
        let first = event(user_id, primary, Some(80));
        let second = event(user_id, primary, Some(2));
        let first_id = first.id;

        let mut event_repo = MockEventRepository::new();
        event_repo
            .expect_list_by_user()
            .returning(move |_| Ok(vec![first.clone(), second.clone()]));
        event_repo
            .expect_list_event_commerces()
            .withf(|ids| ids.len() == 2)
            .returning(move |_| {
                Ok(vec![EventCommerceEntity {
                    event_id: first_id,
                    commerce_id: extra,
                }])
            });

        let dtos = usecase(
            event_repo,
            MockCommerceRepository::new(),
            MockSubscriptionRepository::new(),
        )
        .list(user_id, Locale::Fr)
        .await
        .unwrap();

        assert_eq!(dtos[0].additional_commerce_ids, vec![extra]);
        assert!(!dtos[0].boost.boosted);
        assert!(dtos[1].additional_commerce_ids.is_empty());
        assert!(dtos[1].boost.boosted);
    }

    #[tokio::test]
    async fn create_checks_every_commerce_and_dedupes_primary() {
        let user_id = Uuid::new_v4();
        let primary = Uuid::new_v4();
        let extra = Uuid::new_v4();

        let mut commerce_repo = MockCommerceRepository::new();
        commerce_repo
            .expect_count_owned()
            .withf(move |uid, ids| *uid == user_id && *ids == vec![primary, extra])
            .returning(|_, _| Ok(2));
        let mut event_repo = MockEventRepository::new();
        event_repo
            .expect_create_within_limit()
            .withf(move |_, additional, limit| *additional == vec![extra] && *limit == 2)
            .returning(move |insert, _, _| Ok(Some(event(insert.user_id, insert.commerce_id, None))));

        let dto = usecase(event_repo, commerce_repo, free_plan())
            .create(user_id, form(primary, vec![primary, extra, extra]), Locale::Fr)
            .await
            .unwrap();

        assert_eq!(dto.additional_commerce_ids, vec![extra]);
    }

    #[tokio::test]
    async fn one_foreign_additional_commerce_rejects_the_event() {
        let mut commerce_repo = MockCommerceRepository::new();
        commerce_repo
            .expect_count_owned()
            .returning(|_, _| Ok(1));
        let mut event_repo = MockEventRepository::new();
        event_repo.expect_create_within_limit().never();

        let err = usecase(event_repo, commerce_repo, MockSubscriptionRepository::new())
            .create(
                Uuid::new_v4(),
                form(Uuid::new_v4(), vec![Uuid::new_v4()]),
                Locale::Fr,
            )
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), axum::http::StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn limit_reached_surfaces_the_plan_limit() {
        let mut commerce_repo = MockCommerceRepository::new();
        commerce_repo
            .expect_count_owned()
            .returning(|_, _| Ok(1));
        let mut event_repo = MockEventRepository::new();
        event_repo
            .expect_create_within_limit()
            .returning(|_, _, _| Ok(None));

        let err = usecase(event_repo, commerce_repo, free_plan())
            .create(Uuid::new_v4(), form(Uuid::new_v4(), vec![]), Locale::Fr)
            .await
            .unwrap_err();

        assert!(matches!(err, ContentError::ContentLimitReached { limit: 2 }));
    }

    #[tokio::test]
    async fn update_of_missing_event_is_not_found() {
        let mut commerce_repo = MockCommerceRepository::new();
        commerce_repo
            .expect_count_owned()
            .returning(|_, _| Ok(1));
        let mut event_repo = MockEventRepository::new();
        event_repo
            .expect_update()
            .returning(|_, _, _, _| Ok(None));

        let err = usecase(event_repo, commerce_repo, MockSubscriptionRepository::new())
            .update(
                Uuid::new_v4(),
                Uuid::new_v4(),
                form(Uuid::new_v4(), vec![]),
                Locale::Fr,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ContentError::NotFound("event")));
    }
}
