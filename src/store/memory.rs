//! In-memory store with the same constraints as the PostgreSQL schema.
//! Units of work are serialized and operate on a copy that `commit` publishes.

use crate::error::{AppError, ConstraintKind};
use crate::model::{Entity, Offer, Order, User, MAX_AGE_EXCLUSIVE};
use crate::store::{Repository, Store, UnitOfWork};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Clone, Default)]
pub struct Tables {
    pub users: BTreeMap<i32, User>,
    pub orders: BTreeMap<i32, Order>,
    pub offers: BTreeMap<i32, Offer>,
    /// Last id handed out per table; never reused, like a SERIAL sequence.
    pub user_seq: i32,
    pub order_seq: i32,
    pub offer_seq: i32,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    offline: Arc<std::sync::atomic::AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn snapshot(&self) -> Tables {
        self.tables.lock().await.clone()
    }

    /// Make `ping` fail, as an unreachable database would.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, std::sync::atomic::Ordering::SeqCst);
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, AppError> {
        let guard = Arc::clone(&self.tables).lock_owned().await;
        let work = guard.clone();
        Ok(Box::new(MemoryUnitOfWork { guard, work }))
    }

    async fn ping(&self) -> Result<(), AppError> {
        if self.offline.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(AppError::Db(sqlx::Error::PoolClosed));
        }
        Ok(())
    }
}

pub struct MemoryUnitOfWork {
    guard: OwnedMutexGuard<Tables>,
    work: Tables,
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    fn users(&mut self) -> &mut dyn Repository<User> {
        self
    }

    fn orders(&mut self) -> &mut dyn Repository<Order> {
        self
    }

    fn offers(&mut self) -> &mut dyn Repository<Offer> {
        self
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        let MemoryUnitOfWork { mut guard, work } = *self;
        *guard = work;
        Ok(())
    }
}

/// Table access and constraint checks per entity.
pub trait MemoryEntity: Entity {
    fn table(tables: &mut Tables) -> &mut BTreeMap<i32, Self>;

    fn sequence(tables: &mut Tables) -> &mut i32;

    /// Validate `self` against every other row, as the store would on write.
    fn check(&self, tables: &Tables) -> Result<(), AppError>;

    /// Apply the referential action for deleting row `id`.
    fn on_delete(id: i32, tables: &mut Tables);
}

fn violation(kind: ConstraintKind) -> AppError {
    AppError::Constraint(kind)
}

fn user_exists(tables: &Tables, id: Option<i32>) -> bool {
    id.map_or(true, |id| tables.users.contains_key(&id))
}

impl MemoryEntity for User {
    fn table(tables: &mut Tables) -> &mut BTreeMap<i32, Self> {
        &mut tables.users
    }

    fn sequence(tables: &mut Tables) -> &mut i32 {
        &mut tables.user_seq
    }

    fn check(&self, tables: &Tables) -> Result<(), AppError> {
        let f = &self.fields;
        if f.age.is_some_and(|age| age >= MAX_AGE_EXCLUSIVE) {
            return Err(violation(ConstraintKind::Check));
        }
        let clash = tables.users.values().filter(|u| u.id != self.id).any(|u| {
            u.fields.email == f.email || (f.phone.is_some() && u.fields.phone == f.phone)
        });
        if clash {
            return Err(violation(ConstraintKind::Unique));
        }
        Ok(())
    }

    fn on_delete(id: i32, tables: &mut Tables) {
        for order in tables.orders.values_mut() {
            if order.fields.customer_id == Some(id) {
                order.fields.customer_id = None;
            }
            if order.fields.executor_id == Some(id) {
                order.fields.executor_id = None;
            }
        }
        for offer in tables.offers.values_mut() {
            if offer.fields.executor_id == Some(id) {
                offer.fields.executor_id = None;
            }
        }
    }
}

impl MemoryEntity for Order {
    fn table(tables: &mut Tables) -> &mut BTreeMap<i32, Self> {
        &mut tables.orders
    }

    fn sequence(tables: &mut Tables) -> &mut i32 {
        &mut tables.order_seq
    }

    /// Customer and executor ids are not foreign keys; unknown users read as `0`.
    fn check(&self, _tables: &Tables) -> Result<(), AppError> {
        Ok(())
    }

    fn on_delete(id: i32, tables: &mut Tables) {
        tables.offers.retain(|_, offer| offer.fields.order_id != Some(id));
    }
}

impl MemoryEntity for Offer {
    fn table(tables: &mut Tables) -> &mut BTreeMap<i32, Self> {
        &mut tables.offers
    }

    fn sequence(tables: &mut Tables) -> &mut i32 {
        &mut tables.offer_seq
    }

    fn check(&self, tables: &Tables) -> Result<(), AppError> {
        let order_ok = self
            .fields
            .order_id
            .map_or(true, |id| tables.orders.contains_key(&id));
        if !order_ok || !user_exists(tables, self.fields.executor_id) {
            return Err(violation(ConstraintKind::ForeignKey));
        }
        Ok(())
    }

    fn on_delete(_id: i32, _tables: &mut Tables) {}
}

impl MemoryUnitOfWork {
    fn put<E: MemoryEntity>(&mut self, entity: E) -> Result<(), AppError> {
        entity.check(&self.work)?;
        E::table(&mut self.work).insert(entity.id(), entity);
        Ok(())
    }
}

#[async_trait]
impl<E: MemoryEntity> Repository<E> for MemoryUnitOfWork {
    async fn find_all(&mut self) -> Result<Vec<E>, AppError> {
        Ok(E::table(&mut self.work).values().cloned().collect())
    }

    async fn find_by_id(&mut self, id: i32) -> Result<Option<E>, AppError> {
        Ok(E::table(&mut self.work).get(&id).cloned())
    }

    async fn insert(&mut self, fields: E::Fields) -> Result<E, AppError> {
        let seq = E::sequence(&mut self.work);
        *seq += 1;
        let id = *seq;
        let entity = E::from_parts(id, fields);
        self.put(entity.clone())?;
        Ok(entity)
    }

    async fn insert_many(&mut self, entities: Vec<E>) -> Result<(), AppError> {
        for entity in entities {
            if E::table(&mut self.work).contains_key(&entity.id()) {
                return Err(violation(ConstraintKind::Unique));
            }
            let id = entity.id();
            self.put(entity)?;
            let seq = E::sequence(&mut self.work);
            *seq = (*seq).max(id);
        }
        Ok(())
    }

    async fn update(&mut self, entity: &E) -> Result<(), AppError> {
        if !E::table(&mut self.work).contains_key(&entity.id()) {
            return Err(AppError::NotFound {
                entity: E::NAME,
                id: entity.id(),
            });
        }
        self.put(entity.clone())
    }

    async fn delete(&mut self, entity: &E) -> Result<(), AppError> {
        let id = entity.id();
        if E::table(&mut self.work).remove(&id).is_none() {
            return Err(AppError::NotFound { entity: E::NAME, id });
        }
        E::on_delete(id, &mut self.work);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{OrderFields, UserFields};
    use rstest::rstest;

    fn user(email: &str, phone: Option<&str>, age: Option<i32>) -> UserFields {
        UserFields {
            first_name: "Ivan".into(),
            last_name: "Ivanov".into(),
            age,
            email: email.into(),
            role: Some("customer".into()),
            phone: phone.map(String::from),
            sex: None,
        }
    }

    #[rstest]
    #[case(Some(119), true)]
    #[case(Some(120), false)]
    #[case(Some(150), false)]
    #[case(None, true)]
    #[tokio::test]
    async fn age_must_be_below_120(#[case] age: Option<i32>, #[case] accepted: bool) {
        let store = MemoryStore::new();
        let mut uow = store.begin().await.unwrap();
        let result = uow.users().insert(user("a@example.com", None, age)).await;
        assert_eq!(result.is_ok(), accepted);
        if !accepted {
            assert!(matches!(result, Err(AppError::Constraint(ConstraintKind::Check))));
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let store = MemoryStore::new();
        let mut uow = store.begin().await.unwrap();
        uow.users().insert(user("same@example.com", Some("1"), None)).await.unwrap();
        let err = uow
            .users()
            .insert(user("same@example.com", Some("2"), None))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Constraint(ConstraintKind::Unique)));
    }

    #[tokio::test]
    async fn duplicate_phone_is_rejected_but_null_phones_coexist() {
        let store = MemoryStore::new();
        let mut uow = store.begin().await.unwrap();
        uow.users().insert(user("a@example.com", None, None)).await.unwrap();
        uow.users().insert(user("b@example.com", None, None)).await.unwrap();
        uow.users().insert(user("c@example.com", Some("79990001122"), None)).await.unwrap();
        let err = uow
            .users()
            .insert(user("d@example.com", Some("79990001122"), None))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Constraint(ConstraintKind::Unique)));
    }

    #[tokio::test]
    async fn dropped_unit_of_work_rolls_back() {
        let store = MemoryStore::new();
        {
            let mut uow = store.begin().await.unwrap();
            uow.users().insert(user("a@example.com", None, None)).await.unwrap();
        }
        assert!(store.snapshot().await.users.is_empty());

        let mut uow = store.begin().await.unwrap();
        uow.users().insert(user("a@example.com", None, None)).await.unwrap();
        uow.commit().await.unwrap();
        assert_eq!(store.snapshot().await.users.len(), 1);
    }

    #[tokio::test]
    async fn update_of_missing_row_is_not_found() {
        let store = MemoryStore::new();
        let mut uow = store.begin().await.unwrap();
        let ghost = User::from_parts(9, user("ghost@example.com", None, None));
        assert!(matches!(
            uow.users().update(&ghost).await,
            Err(AppError::NotFound { entity: "user", id: 9 })
        ));
    }

    #[tokio::test]
    async fn deleted_ids_are_not_reused() {
        let store = MemoryStore::new();
        let mut uow = store.begin().await.unwrap();
        uow.users().insert(user("a@example.com", None, None)).await.unwrap();
        let last = uow.users().insert(user("b@example.com", None, None)).await.unwrap();
        uow.users().delete(&last).await.unwrap();
        let next = uow.users().insert(user("c@example.com", None, None)).await.unwrap();
        assert_eq!(next.id, 3);
    }

    #[tokio::test]
    async fn explicit_ids_advance_the_counter() {
        let store = MemoryStore::new();
        let mut uow = store.begin().await.unwrap();
        let high = User::from_parts(40, user("high@example.com", None, None));
        uow.users().insert_many(vec![high]).await.unwrap();
        let next = uow.users().insert(user("next@example.com", None, None)).await.unwrap();
        assert_eq!(next.id, 41);
    }

    #[tokio::test]
    async fn order_may_name_unknown_users() {
        let store = MemoryStore::new();
        let mut uow = store.begin().await.unwrap();
        let order = uow
            .orders()
            .insert(OrderFields {
                name: "Fix a tap".into(),
                description: "Kitchen".into(),
                start_date: None,
                end_date: None,
                address: None,
                price: None,
                customer_id: Some(77),
                executor_id: Some(0),
            })
            .await
            .unwrap();
        assert_eq!(order.fields.customer_id, Some(77));
    }
}
