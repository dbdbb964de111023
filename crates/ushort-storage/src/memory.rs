use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use jiff::Timestamp;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::trace;
use ushort_core::repository::{ReadRepository, Repository, Result};
use ushort_core::{Link, LinkId, StorageError, Token};

#[derive(Debug)]
struct Inner {
    links: DashMap<LinkId, Link>,
    by_url: DashMap<String, LinkId>,
    by_token: DashMap<Token, LinkId>,
    sequence: AtomicU64,
}

impl Inner {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            links: DashMap::with_capacity(capacity),
            by_url: DashMap::with_capacity(capacity),
            by_token: DashMap::with_capacity(capacity),
            sequence: AtomicU64::new(1),
        }
    }
}

/// In-memory implementation of the link store using DashMap.
///
/// URL and token uniqueness go through the map entry API, which holds the
/// shard lock for the key while the check and the write happen. Clones share
/// the same underlying store.
#[derive(Debug, Clone)]
pub struct InMemoryRepository {
    inner: Arc<Inner>,
}

impl InMemoryRepository {
    /// Creates a new in-memory repository.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates a new in-memory repository with the specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Inner::with_capacity(capacity)),
        }
    }

    /// Number of stored links, including those without a token.
    pub fn len(&self) -> usize {
        self.inner.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.links.is_empty()
    }

    fn sorted(mut links: Vec<Link>, limit: usize) -> Vec<Link> {
        links.sort_unstable_by_key(|link| link.id);
        links.truncate(limit);
        links
    }
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReadRepository for InMemoryRepository {
    async fn find_by_token(&self, token: &Token) -> Result<Option<Link>> {
        let Some(id) = self.inner.by_token.get(token).map(|entry| *entry) else {
            return Ok(None);
        };

        Ok(self
            .inner
            .links
            .get(&id)
            .filter(|link| link.token.as_ref() == Some(token))
            .map(|link| link.clone()))
    }

    async fn find_by_url(&self, original_url: &str) -> Result<Option<Link>> {
        let Some(id) = self.inner.by_url.get(original_url).map(|entry| *entry) else {
            return Ok(None);
        };

        Ok(self.inner.links.get(&id).map(|link| link.clone()))
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn insert(&self, original_url: &str) -> Result<LinkId> {
        match self.inner.by_url.entry(original_url.to_owned()) {
            Entry::Occupied(_) => Err(StorageError::DuplicateUrl(original_url.to_owned())),
            Entry::Vacant(vacant) => {
                let id = LinkId::new(self.inner.sequence.fetch_add(1, Ordering::SeqCst));
                self.inner.links.insert(
                    id,
                    Link {
                        id,
                        original_url: original_url.to_owned(),
                        token: None,
                        created_at: Timestamp::now(),
                    },
                );
                vacant.insert(id);
                trace!(%id, "inserted link");
                Ok(id)
            }
        }
    }

    async fn set_token(&self, id: LinkId, token: &Token) -> Result<()> {
        // The link guard is held until the token is written, so lookups that
        // find the token index entry always see the token on the link.
        let mut link = self
            .inner
            .links
            .get_mut(&id)
            .ok_or(StorageError::NotFound(id))?;

        match &link.token {
            Some(existing) if existing == token => return Ok(()),
            Some(_) => return Err(StorageError::TokenImmutable(id)),
            None => {}
        }

        match self.inner.by_token.entry(token.clone()) {
            Entry::Occupied(holder) if *holder.get() != id => {
                return Err(StorageError::DuplicateToken(token.to_string()));
            }
            Entry::Occupied(_) => {}
            Entry::Vacant(vacant) => {
                vacant.insert(id);
            }
        }

        link.token = Some(token.clone());
        trace!(%id, %token, "assigned token");
        Ok(())
    }

    async fn find_tokenless(&self, after: Option<LinkId>, limit: usize) -> Result<Vec<Link>> {
        let pending = self
            .inner
            .links
            .iter()
            .filter(|link| link.token.is_none() && after.is_none_or(|after| link.id > after))
            .map(|link| link.clone())
            .collect();
        Ok(Self::sorted(pending, limit))
    }

    async fn links_after(&self, after: Option<LinkId>, limit: usize) -> Result<Vec<Link>> {
        let page = self
            .inner
            .links
            .iter()
            .filter(|link| after.is_none_or(|after| link.id > after))
            .map(|link| link.clone())
            .collect();
        Ok(Self::sorted(page, limit))
    }
}
