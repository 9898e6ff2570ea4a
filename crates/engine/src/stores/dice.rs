//! Pending mediated dice-roll requests.

use std::time::Duration;

use rollcall_domain::{DiceRollRequest, DiceRollRequestId};

use crate::infrastructure::cache::TtlCache;

/// Requests waiting for the addressed player, expiring after a TTL.
pub struct PendingDiceRequests {
    cache: TtlCache<DiceRollRequestId, DiceRollRequest>,
}

impl PendingDiceRequests {
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: TtlCache::new(ttl),
        }
    }

    pub async fn insert(&self, request: DiceRollRequest) {
        self.cache.insert(request.id.clone(), request).await;
    }

    pub async fn get(&self, id: &DiceRollRequestId) -> Option<DiceRollRequest> {
        self.cache.get(id).await
    }

    /// Claim a request for completion. Only one caller ever gets it.
    pub async fn take(&self, id: &DiceRollRequestId) -> Option<DiceRollRequest> {
        self.cache.take(id).await
    }

    pub async fn purge_expired(&self) -> usize {
        self.cache.purge_expired().await
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.cache.len().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rollcall_domain::{DiceFormula, SessionId, UserId};

    #[tokio::test]
    async fn request_is_claimed_once() {
        let store = PendingDiceRequests::new(Duration::from_secs(60));
        let id = DiceRollRequestId::generate(1_700_000_000_000, "abcdefghi");
        store
            .insert(DiceRollRequest::new(
                id.clone(),
                SessionId::new(),
                UserId::new("gm").unwrap(),
                UserId::new("bob").unwrap(),
                "d20",
                DiceFormula::parse("d20").unwrap(),
                None,
                None,
                Utc::now(),
            ))
            .await;

        assert!(store.get(&id).await.is_some());
        assert!(store.take(&id).await.is_some());
        assert!(store.take(&id).await.is_none());
        assert_eq!(store.len().await, 0);
    }
}
