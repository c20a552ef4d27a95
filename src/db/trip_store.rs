use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use bson::doc;
use mongodb::{Client, Collection};
use thiserror::Error;
use tokio::sync::{OwnedMutexGuard, RwLock};

use super::mongo::{DATABASE_NAME, TRIPS_COLLECTION};
use crate::models::trip::Trip;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),
}

/// Whole-document trip persistence.
pub enum TripStore {
    Mongo(Collection<Trip>),
    Memory(RwLock<HashMap<String, Trip>>),
}

impl TripStore {
    pub fn mongo(client: &Arc<Client>) -> Self {
        TripStore::Mongo(client.database(DATABASE_NAME).collection(TRIPS_COLLECTION))
    }

    pub fn in_memory() -> Self {
        TripStore::Memory(RwLock::new(HashMap::new()))
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            TripStore::Mongo(_) => "mongodb",
            TripStore::Memory(_) => "memory",
        }
    }

    pub async fn load(&self, trip_id: &str) -> Result<Option<Trip>, StoreError> {
        match self {
            TripStore::Mongo(collection) => {
                let filter = doc! { "trip_id": trip_id };
                Ok(collection.find_one(filter).await?)
            }
            TripStore::Memory(trips) => Ok(trips.read().await.get(trip_id).cloned()),
        }
    }

    pub async fn save(&self, trip: &Trip) -> Result<(), StoreError> {
        match self {
            TripStore::Mongo(collection) => {
                let filter = doc! { "trip_id": trip.trip_id.as_str() };
                collection.replace_one(filter, trip).upsert(true).await?;
                Ok(())
            }
            TripStore::Memory(trips) => {
                trips
                    .write()
                    .await
                    .insert(trip.trip_id.clone(), trip.clone());
                Ok(())
            }
        }
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        match self {
            TripStore::Mongo(collection) => {
                collection.count_documents(doc! {}).await?;
                Ok(())
            }
            TripStore::Memory(_) => Ok(()),
        }
    }
}

/// One async mutex per trip id. Holding the guard serializes every
/// read-modify-write of that trip. An id's entry lives only while someone
/// holds or waits for its lock.
#[derive(Default)]
pub struct TripLocks {
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

pub struct TripLockGuard<'a> {
    guard: Option<OwnedMutexGuard<()>>,
    lock: Arc<tokio::sync::Mutex<()>>,
    trip_id: String,
    locks: &'a TripLocks,
}

impl TripLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, trip_id: &str) -> TripLockGuard<'_> {
        let lock = {
            let mut locks = self.map();
            locks
                .entry(trip_id.to_string())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
                .clone()
        };
        let guard = lock.clone().lock_owned().await;
        TripLockGuard {
            guard: Some(guard),
            lock,
            trip_id: trip_id.to_string(),
            locks: self,
        }
    }

    /// Ids with a live lock entry.
    pub fn len(&self) -> usize {
        self.map().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn map(&self) -> MutexGuard<'_, HashMap<String, Arc<tokio::sync::Mutex<()>>>> {
        match self.locks.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Drop for TripLockGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        let mut locks = self.locks.map();
        // Only the map and this guard still point at the lock: nobody is waiting.
        if Arc::strong_count(&self.lock) == 2 {
            locks.remove(&self.trip_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::trip::Team;
    use crate::models::venue::Theme;
    use chrono::{NaiveDate, Utc};
    use std::time::Duration;

    fn trip(id: &str) -> Trip {
        Trip {
            trip_id: id.to_string(),
            created_at: Utc::now(),
            theme: Theme::Wmpo,
            arrival: NaiveDate::from_ymd_opt(2026, 2, 5).unwrap(),
            departure: NaiveDate::from_ymd_opt(2026, 2, 8).unwrap(),
            group_size: 4,
            budget_min: 800,
            budget_max: 2000,
            team: Team::default(),
            trip_name: "Wmpo Trip".to_string(),
            vibes: Vec::new(),
            votes: Vec::new(),
            reconciled_preferences: None,
            plan_a: None,
            plan_b: None,
            selected_plan: None,
        }
    }

    #[actix_rt::test]
    async fn test_memory_store_round_trip() {
        let store = TripStore::in_memory();
        assert!(store.load("abc").await.unwrap().is_none());

        let mut t = trip("abc");
        store.save(&t).await.unwrap();
        t.group_size = 8;
        store.save(&t).await.unwrap();

        assert_eq!(store.load("abc").await.unwrap().unwrap().group_size, 8);
        assert_eq!(store.backend_name(), "memory");
    }

    #[actix_rt::test]
    async fn test_trip_lock_serializes_same_id() {
        let locks = Arc::new(TripLocks::new());
        let guard = locks.acquire("abc").await;

        let contender = {
            let locks = locks.clone();
            tokio::time::timeout(Duration::from_millis(20), async move {
                locks.acquire("abc").await;
            })
        };
        assert!(contender.await.is_err());

        // other trips are independent
        let _other = locks.acquire("xyz").await;
        drop(guard);
        let _again = locks.acquire("abc").await;
    }

    #[actix_rt::test]
    async fn test_released_locks_leave_no_entries() {
        let locks = TripLocks::new();
        for i in 0..1000 {
            let _guard = locks.acquire(&format!("trip{}", i)).await;
        }
        assert!(locks.is_empty());

        let held = locks.acquire("abc").await;
        assert_eq!(locks.len(), 1);
        drop(held);
        assert!(locks.is_empty());
    }

    #[actix_rt::test]
    async fn test_waiting_acquirer_keeps_entry_alive() {
        let locks = Arc::new(TripLocks::new());
        let first = locks.acquire("abc").await;

        let waiter = {
            let locks = locks.clone();
            actix_rt::spawn(async move {
                let _guard = locks.acquire("abc").await;
                locks.len()
            })
        };
        // let the waiter register before releasing
        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(first);

        assert_eq!(waiter.await.unwrap(), 1);
        assert!(locks.is_empty());
    }
}
