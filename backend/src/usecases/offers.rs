use std::{collections::HashMap, sync::Arc};

use chrono::Utc;
use crates::domain::{
    entities::offers::OfferEntity,
    repositories::{
        commerces::CommerceRepository, dashboard::DashboardRepository, offers::OfferRepository,
        subscriptions::SubscriptionRepository,
    },
    value_objects::{
        boosts::Locale,
        offers::{OfferDto, OfferForm},
        plans::plan_limit,
    },
};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::usecases::{
    content::{ContentError, UseCaseResult, ensure_commerces_owned},
    plan_resolver::PlanResolver,
};

pub struct OfferUseCase<O, C, S, D>
where
    O: OfferRepository + Send + Sync + 'static,
    C: CommerceRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    D: DashboardRepository + Send + Sync + 'static,
{
    offer_repo: Arc<O>,
    commerce_repo: Arc<C>,
    plan_resolver: Arc<PlanResolver<S, D>>,
}

impl<O, C, S, D> OfferUseCase<O, C, S, D>
where
    O: OfferRepository + Send + Sync + 'static,
    C: CommerceRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    D: DashboardRepository + Send + Sync + 'static,
{
    pub fn new(
        offer_repo: Arc<O>,
        commerce_repo: Arc<C>,
        plan_resolver: Arc<PlanResolver<S, D>>,
    ) -> Self {
        Self {
            offer_repo,
            commerce_repo,
            plan_resolver,
        }
    }

    pub async fn list(&self, user_id: Uuid, locale: Locale) -> UseCaseResult<Vec<OfferDto>> {
        let offers = self.offer_repo.list_by_user(user_id).await.map_err(|err| {
            error!(%user_id, db_error = ?err, "offers: failed to list");
            ContentError::Internal(err)
        })?;

        if offers.is_empty() {
            return Ok(Vec::new());
        }

        let offer_ids = offers.iter().map(|offer| offer.id).collect();
        let links = self
            .offer_repo
            .list_offer_commerces(offer_ids)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "offers: failed to load additional commerces");
                ContentError::Internal(err)
            })?;

        let mut additional: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for link in links {
            additional
                .entry(link.offer_id)
                .or_default()
                .push(link.commerce_id);
        }

        let now = Utc::now();
        Ok(offers
            .into_iter()
            .map(|offer| {
                let commerce_ids = additional.remove(&offer.id).unwrap_or_default();
                OfferDto::from_entity(offer, commerce_ids, locale, now)
            })
            .collect())
    }

    pub async fn create(
        &self,
        user_id: Uuid,
        form: OfferForm,
        locale: Locale,
    ) -> UseCaseResult<OfferDto> {
        let offer = form.validate()?;
        ensure_commerces_owned(self.commerce_repo.as_ref(), user_id, offer.all_commerce_ids())
            .await?;

        let plan_type = self
            .plan_resolver
            .resolve_plan_type(user_id)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "offers: failed to resolve plan");
                ContentError::Internal(err)
            })?;
        let limit = plan_limit(plan_type);

        let created = self
            .offer_repo
            .create_within_limit(
                offer.to_insert(user_id),
                offer.additional_commerce_ids.clone(),
                limit,
            )
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "offers: failed to create");
                ContentError::Internal(err)
            })?;

        let Some(created) = created else {
            warn!(%user_id, %plan_type, limit, "offers: content limit reached");
            return Err(ContentError::ContentLimitReached { limit });
        };

        info!(%user_id, offer_id = %created.id, "offers: created");
        Ok(to_dto(created, offer.additional_commerce_ids, locale))
    }

    pub async fn update(
        &self,
        user_id: Uuid,
        offer_id: Uuid,
        form: OfferForm,
        locale: Locale,
    ) -> UseCaseResult<OfferDto> {
        let offer = form.validate()?;
        ensure_commerces_owned(self.commerce_repo.as_ref(), user_id, offer.all_commerce_ids())
            .await?;

        let updated = self
            .offer_repo
            .update(
                user_id,
                offer_id,
                offer.to_update(Utc::now()),
                offer.additional_commerce_ids.clone(),
            )
            .await
            .map_err(|err| {
                error!(%user_id, %offer_id, db_error = ?err, "offers: failed to update");
                ContentError::Internal(err)
            })?
            .ok_or(ContentError::NotFound("offer"))?;

        info!(%user_id, %offer_id, "offers: updated");
        Ok(to_dto(updated, offer.additional_commerce_ids, locale))
    }

    pub async fn delete(&self, user_id: Uuid, offer_id: Uuid) -> UseCaseResult<()> {
        let deleted = self
            .offer_repo
            .delete(user_id, offer_id)
            .await
            .map_err(|err| {
                error!(%user_id, %offer_id, db_error = ?err, "offers: failed to delete");
                ContentError::Internal(err)
            })?;

        if !deleted {
            return Err(ContentError::NotFound("offer"));
        }

        info!(%user_id, %offer_id, "offers: deleted");
        Ok(())
    }
}

fn to_dto(entity: OfferEntity, additional_commerce_ids: Vec<Uuid>, locale: Locale) -> OfferDto {
    OfferDto::from_entity(entity, additional_commerce_ids, locale, Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::plan_resolver::test_support::{profile, subscription};
    use chrono::{Duration, NaiveDate};
    use crates::domain::{
        entities::offers::OfferCommerceEntity,
        repositories::{
            commerces::MockCommerceRepository, dashboard::MockDashboardRepository,
            offers::MockOfferRepository, subscriptions::MockSubscriptionRepository,
        },
        value_objects::enums::offer_types::OfferType,
    };
    use mockall::predicate::eq;

    fn form(commerce_id: Option<Uuid>) -> OfferForm {
        OfferForm {
            commerce_id,
            title: "2 pour 1".to_string(),
            description: "Sur tous les cafés".to_string(),
            offer_type: OfferType::InStore,
            start_date: NaiveDate::from_ymd_opt(2025, 6, 1),
            end_date: NaiveDate::from_ymd_opt(2025, 6, 30),
            is_active: true,
            image_url: None,
            additional_commerce_ids: Vec::new(),
        }
    }

    fn offer(user_id: Uuid, commerce_id: Uuid) -> OfferEntity {
        let now = Utc::now();
        OfferEntity {
            id: Uuid::new_v4(),
            commerce_id,
            user_id,
            title: "2 pour 1".to_string(),
            description: "Sur tous les cafés".to_string(),
            offer_type: "in_store".to_string(),
            start_date: now.date_naive() - Duration::days(1),
            end_date: now.date_naive() + Duration::days(10),
            is_active: true,
            image_url: None,
            boosted: false,
            boost_type: None,
            boosted_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn owns_commerce(commerce_repo: &mut MockCommerceRepository, owned: i64) {
        commerce_repo
            .expect_count_owned()
            .returning(move |_, _| Ok(owned));
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
        offer_repo: MockOfferRepository,
        commerce_repo: MockCommerceRepository,
        subscription_repo: MockSubscriptionRepository,
    ) -> OfferUseCase<
        MockOfferRepository,
        MockCommerceRepository,
        MockSubscriptionRepository,
        MockDashboardRepository,
    > {
        let plan_resolver = PlanResolver::new(
            Arc::new(subscription_repo),
            Arc::new(MockDashboardRepository::new()),
        );
        OfferUseCase::new(
            Arc::new(offer_repo),
            Arc::new(commerce_repo),
            Arc::new(plan_resolver),
        )
    }

    #[tokio::test]
    async fn free_plan_passes_limit_of_two() {
        let user_id = Uuid::new_v4();
        let commerce_id = Uuid::new_v4();
        let mut commerce_repo = MockCommerceRepository::new();
        owns_commerce(&mut commerce_repo, 1);
        let mut offer_repo = MockOfferRepository::new();
        offer_repo
            .expect_create_within_limit()
            .withf(move |insert, additional, limit| {
                insert.user_id == user_id && additional.is_empty() && *limit == 2
            })
            .times(1)
            .returning(move |insert, _, _| Ok(Some(offer(insert.user_id, insert.commerce_id))));

        let dto = usecase(offer_repo, commerce_repo, free_plan())
            .create(user_id, form(Some(commerce_id)), Locale::Fr)
            .await
            .unwrap();

        assert_eq!(dto.commerce_id, commerce_id);
        assert!(!dto.boost.boosted);
    }

    #[tokio::test]
    async fn pro_plan_passes_limit_of_ten() {
        let user_id = Uuid::new_v4();
        let mut commerce_repo = MockCommerceRepository::new();
        owns_commerce(&mut commerce_repo, 1);
        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_find_current_subscription()
            .returning(|user_id| Ok(Some(subscription(user_id, "pro", "active"))));
        let mut offer_repo = MockOfferRepository::new();
        offer_repo
            .expect_create_within_limit()
            .withf(|_, _, limit| *limit == 10)
            .returning(move |insert, _, _| Ok(Some(offer(insert.user_id, insert.commerce_id))));

        usecase(offer_repo, commerce_repo, subscription_repo)
            .create(user_id, form(Some(Uuid::new_v4())), Locale::Fr)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn third_offer_on_free_plan_is_refused() {
        let mut commerce_repo = MockCommerceRepository::new();
        owns_commerce(&mut commerce_repo, 1);
        let mut offer_repo = MockOfferRepository::new();
        offer_repo
            .expect_create_within_limit()
            .returning(|_, _, _| Ok(None));

        let err = usecase(offer_repo, commerce_repo, free_plan())
            .create(Uuid::new_v4(), form(Some(Uuid::new_v4())), Locale::Fr)
            .await
            .unwrap_err();

        assert!(matches!(err, ContentError::ContentLimitReached { limit: 2 }));
        assert_eq!(err.status_code(), axum::http::StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn foreign_commerce_is_a_validation_error() {
        let mut commerce_repo = MockCommerceRepository::new();
        owns_commerce(&mut commerce_repo, 0);
        let mut offer_repo = MockOfferRepository::new();
        offer_repo.expect_create_within_limit().never();

        let err = usecase(offer_repo, commerce_repo, MockSubscriptionRepository::new())
            .create(Uuid::new_v4(), form(Some(Uuid::new_v4())), Locale::Fr)
            .await
            .unwrap_err();

        assert!(matches!(err, ContentError::Validation(_)));
    }

    #[tokio::test]
    async fn missing_fields_are_reported_together() {
        let mut commerce_repo = MockCommerceRepository::new();
        commerce_repo.expect_count_owned().never();

        let mut invalid = form(None);
        invalid.title = " ".to_string();

        let err = usecase(
            MockOfferRepository::new(),
            commerce_repo,
            MockSubscriptionRepository::new(),
        )
        .create(Uuid::new_v4(), invalid, Locale::Fr)
        .await
        .unwrap_err();

        match err {
            ContentError::Validation(errors) => assert_eq!(
                errors.errors(),
                ["commerce_id is required", "title is required"]
            ),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn delete_of_foreign_offer_is_not_found() {
        let user_id = Uuid::new_v4();
        let offer_id = Uuid::new_v4();
        let mut offer_repo = MockOfferRepository::new();
        offer_repo
            .expect_delete()
            .with(eq(user_id), eq(offer_id))
            .returning(|_, _| Ok(false));

        let err = usecase(
            offer_repo,
            MockCommerceRepository::new(),
            MockSubscriptionRepository::new(),
        )
        .delete(user_id, offer_id)
        .await
        .unwrap_err();

        assert!(matches!(err, ContentError::NotFound("offer")));
    }

    #[tokio::test]
    async fn update_keeps_ownership_scope() {
        let user_id = Uuid::new_v4();
        let offer_id = Uuid::new_v4();
        let commerce_id = Uuid::new_v4();
        let mut commerce_repo = MockCommerceRepository::new();
        owns_commerce(&mut commerce_repo, 1);
        let mut offer_repo = MockOfferRepository::new();
        offer_repo
            .expect_update()
            .withf(move |uid, oid, update, additional| {
                *uid == user_id
                    && *oid == offer_id
                    && update.commerce_id == commerce_id
                    && additional.is_empty()
            })
            .returning(move |uid, _, update, _| Ok(Some(offer(uid, update.commerce_id))));

        let dto = usecase(offer_repo, commerce_repo, MockSubscriptionRepository::new())
            .update(user_id, offer_id, form(Some(commerce_id)), Locale::En)
            .await
            .unwrap();

        assert!(dto.is_active);
    }

    #[tokio::test]
    async fn create_writes_additional_commerces_after_checking_all() {
        let user_id = Uuid::new_v4();
        let primary = Uuid::new_v4();
        let extra = Uuid::new_v4();

        let mut commerce_repo = MockCommerceRepository::new();
        commerce_repo
            .expect_count_owned()
            .withf(move |uid, ids| *uid == user_id && *ids == vec![primary, extra])
            .returning(|_, _| Ok(2));
        let mut offer_repo = MockOfferRepository::new();
        offer_repo
            .expect_create_within_limit()
            .withf(move |_, additional, _| *additional == vec![extra])
            .times(1)
            .returning(move |insert, _, _| Ok(Some(offer(insert.user_id, insert.commerce_id))));

        let mut with_extra = form(Some(primary));
        with_extra.additional_commerce_ids = vec![extra, primary, extra];

        let dto = usecase(offer_repo, commerce_repo, free_plan())
            .create(user_id, with_extra, Locale::Fr)
            .await
            .unwrap();

        assert_eq!(dto.additional_commerce_ids, vec![extra]);
    }

    #[tokio::test]
    async fn foreign_additional_commerce_rejects_the_offer() {
        let mut commerce_repo = MockCommerceRepository::new();
        commerce_repo
            .expect_count_owned()
            .withf(|_, ids| ids.len() == 2)
            .returning(|_, _| Ok(1));
        let mut offer_repo = MockOfferRepository::new();
        offer_repo.expect_create_within_limit().never();

        let mut with_extra = form(Some(Uuid::new_v4()));
        with_extra.additional_commerce_ids = vec![Uuid::new_v4()];

        let err = usecase(offer_repo, commerce_repo, MockSubscriptionRepository::new())
            .create(Uuid::new_v4(), with_extra, Locale::Fr)
            .await
            .unwrap_err();

        assert!(matches!(err, ContentError::Validation(_)));
    }

    #[tokio::test]
    async fn list_attaches_additional_commerces() {
        let user_id = Uuid::new_v4();
        let primary = Uuid::new_v4();
        let extra = Uuid::new_v4();
        let first = offer(user_id, primary);
        let second = offer(user_id, primary);
        let first_id = first.id;

        let mut offer_repo = MockOfferRepository::new();
        offer_repo
            .expect_list_by_user()
            .returning(move |_| Ok(vec![first.clone(), second.clone()]));
        offer_repo
            .expect_list_offer_commerces()
            .withf(|ids| ids.len() == 2)
            .returning(move |_| {
                Ok(vec![OfferCommerceEntity {
                    offer_id: first_id,
                    commerce_id: extra,
                }])
            });

        let dtos = usecase(
            offer_repo,
            MockCommerceRepository::new(),
            MockSubscriptionRepository::new(),
        )
        .list(user_id, Locale::Fr)
        .await
        .unwrap();

        assert_eq!(dtos[0].additional_commerce_ids, vec![extra]);
        assert!(dtos[1].additional_commerce_ids.is_empty());
    }
}
