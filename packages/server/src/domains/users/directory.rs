//! Lookup-or-create of users by phone number.

use tracing::{info, warn};

use crate::common::StoreError;
use crate::domains::users::User;
use crate::kernel::BaseUserStore;

/// Return the user registered under `phone_number`, creating it with `name`
/// if absent.
///
/// A concurrent signup for the same number can win the insert; the loser sees
/// `Conflict` and re-reads the winner's row instead of failing.
pub async fn get_or_create(
    users: &dyn BaseUserStore,
    phone_number: &str,
    name: &str,
) -> Result<User, StoreError> {
    if let Some(user) = users.find_by_phone_number(phone_number).await? {
        return Ok(user);
    }

    match users.insert(name, phone_number).await {
        Ok(user) => {
            info!(user_id = user.id, phone_number, "Created new user");
            Ok(user)
        }
        Err(StoreError::Conflict) => {
            warn!(phone_number, "Concurrent signup won the insert, re-reading user");
            users
                .find_by_phone_number(phone_number)
                .await?
                .ok_or(StoreError::NotFound)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::test_dependencies::InMemoryUserStore;

    #[tokio::test]
    async fn test_creates_user_when_absent() {
        let store = InMemoryUserStore::new();

        let user = get_or_create(&store, "9998887777", "Ann").await.unwrap();

        assert_eq!(user.phone_number, "9998887777");
        assert_eq!(user.name, "Ann");
        assert_eq!(user.version, 1);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_returns_existing_user_without_renaming() {
        let store = InMemoryUserStore::new();
        let first = get_or_create(&store, "9998887777", "Ann").await.unwrap();

        let second = get_or_create(&store, "9998887777", "Someone Else").await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.name, "Ann");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_conflict_on_insert_rereads_winner() {
        let store = InMemoryUserStore::new();
        // Simulate losing the race: the lookup misses, then another request
        // inserts before ours.
        store.hide_next_lookup();
        let winner = store.insert("Winner", "9998887777").await.unwrap();

        let user = get_or_create(&store, "9998887777", "Loser").await.unwrap();

        assert_eq!(user.id, winner.id);
        assert_eq!(user.name, "Winner");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_signups_create_one_row() {
        let store = std::sync::Arc::new(InMemoryUserStore::new());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    get_or_create(store.as_ref(), "9998887777", &format!("Ann {i}")).await
                })
            })
            .collect();

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap().unwrap().id);
        }

        assert_eq!(store.len(), 1);
        assert!(ids.iter().all(|id| *id == ids[0]));
    }
}
