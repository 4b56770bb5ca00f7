//! User-defined reading lists.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;

use vorleser_storage::KeyValueStore;
use vorleser_types::{NovelId, ReadingList};

use crate::doc;
use crate::error::{ReaderError, Result};

const LISTS_KEY: &str = "vorleser.lists";

/// Id of the built-in list that tracks downloaded novels. It exists from
/// first open and cannot be renamed or removed.
pub const DOWNLOADS_LIST_ID: &str = "downloads-list";

#[derive(Debug, Default, Serialize, Deserialize)]
struct ListsDoc {
    lists: Vec<ReadingList>,
}

/// Named novel collections, including the built-in Downloads list.
pub struct ReadingLists {
    kv: Arc<dyn KeyValueStore>,
    state: Mutex<ListsDoc>,
}

impl ReadingLists {
    pub async fn open(kv: Arc<dyn KeyValueStore>) -> Result<Self> {
        let mut document: ListsDoc = doc::load_or_default(kv.as_ref(), LISTS_KEY).await?;

        if !document.lists.iter().any(|l| l.id == DOWNLOADS_LIST_ID) {
            let now = Utc::now();
            document.lists.insert(
                0,
                ReadingList {
                    id: DOWNLOADS_LIST_ID.to_string(),
                    name: "Downloads".to_string(),
                    description: Some("Novels downloaded for offline reading".to_string()),
                    novel_ids: Vec::new(),
                    created_at: now,
                    updated_at: now,
                },
            );
            doc::persist(kv.as_ref(), LISTS_KEY, &document).await?;
        }

        Ok(Self {
            kv,
            state: Mutex::new(document),
        })
    }

    pub async fn create(&self, name: &str, description: Option<String>) -> Result<ReadingList> {
        let now = Utc::now();
        let list = ReadingList {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            description,
            novel_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        let mut state = self.state.lock().await;
        state.lists.push(list.clone());
        self.persist(&state).await?;
        Ok(list)
    }

    pub async fn remove(&self, id: &str) -> Result<()> {
        if id == DOWNLOADS_LIST_ID {
            return Err(ReaderError::ProtectedList);
        }
        let mut state = self.state.lock().await;
        let Some(pos) = state.lists.iter().position(|l| l.id == id) else {
            return Err(ReaderError::ListNotFound { id: id.to_string() });
        };
        state.lists.remove(pos);
        self.persist(&state).await
    }

    pub async fn rename(&self, id: &str, name: &str) -> Result<()> {
        if id == DOWNLOADS_LIST_ID {
            return Err(ReaderError::ProtectedList);
        }
        let mut state = self.state.lock().await;
        let list = Self::find_mut(&mut state, id)?;
        list.name = name.to_string();
        list.updated_at = Utc::now();
        self.persist(&state).await
    }

    /// Add a novel to a list. Returns false when it was already a member.
    pub async fn add_novel(&self, id: &str, novel: &NovelId) -> Result<bool> {
        let mut state = self.state.lock().await;
        let list = Self::find_mut(&mut state, id)?;
        if list.contains(novel) {
            return Ok(false);
        }
        list.novel_ids.push(novel.clone());
        list.updated_at = Utc::now();
        self.persist(&state).await?;
        Ok(true)
    }

    /// Remove a novel from a list. Returns false when it was not a member.
    pub async fn remove_novel(&self, id: &str, novel: &NovelId) -> Result<bool> {
        let mut state = self.state.lock().await;
        let list = Self::find_mut(&mut state, id)?;
        let before = list.novel_ids.len();
        list.novel_ids.retain(|member| member != novel);
        if list.novel_ids.len() == before {
            return Ok(false);
        }
        list.updated_at = Utc::now();
        self.persist(&state).await?;
        Ok(true)
    }

    pub async fn all(&self) -> Vec<ReadingList> {
        self.state.lock().await.lists.clone()
    }

    pub async fn get(&self, id: &str) -> Option<ReadingList> {
        let state = self.state.lock().await;
        state.lists.iter().find(|l| l.id == id).cloned()
    }

    pub async fn lists_for_novel(&self, novel: &NovelId) -> Vec<ReadingList> {
        let state = self.state.lock().await;
        state
            .lists
            .iter()
            .filter(|l| l.contains(novel))
            .cloned()
            .collect()
    }

    fn find_mut<'a>(state: &'a mut ListsDoc, id: &str) -> Result<&'a mut ReadingList> {
        state
            .lists
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or_else(|| ReaderError::ListNotFound { id: id.to_string() })
    }

    async fn persist(&self, document: &ListsDoc) -> Result<()> {
        doc::persist(self.kv.as_ref(), LISTS_KEY, document).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vorleser_storage::MemoryKv;

    async fn lists() -> ReadingLists {
        ReadingLists::open(Arc::new(MemoryKv::new())).await.unwrap()
    }

    #[tokio::test]
    async fn downloads_list_exists_from_first_open() {
        let lists = lists().await;
        let downloads = lists.get(DOWNLOADS_LIST_ID).await.unwrap();
        assert_eq!(downloads.name, "Downloads");
        assert!(downloads.novel_ids.is_empty());
    }

    #[tokio::test]
    async fn downloads_list_is_protected() {
        let lists = lists().await;
        assert!(matches!(
            lists.remove(DOWNLOADS_LIST_ID).await,
            Err(ReaderError::ProtectedList)
        ));
        assert!(matches!(
            lists.rename(DOWNLOADS_LIST_ID, "Mine").await,
            Err(ReaderError::ProtectedList)
        ));
        // Membership changes are still allowed.
        assert!(lists.add_novel(DOWNLOADS_LIST_ID, &"a".into()).await.unwrap());
    }

    #[tokio::test]
    async fn membership_is_idempotent() {
        let lists = lists().await;
        let favorites = lists.create("Favorites", None).await.unwrap();

        assert!(lists.add_novel(&favorites.id, &"a".into()).await.unwrap());
        assert!(!lists.add_novel(&favorites.id, &"a".into()).await.unwrap());
        assert_eq!(lists.get(&favorites.id).await.unwrap().novel_ids.len(), 1);

        assert!(lists.remove_novel(&favorites.id, &"a".into()).await.unwrap());
        assert!(!lists.remove_novel(&favorites.id, &"a".into()).await.unwrap());
    }

    #[tokio::test]
    async fn lists_for_novel_finds_memberships() {
        let lists = lists().await;
        let favorites = lists.create("Favorites", None).await.unwrap();
        let later = lists.create("Read Later", None).await.unwrap();
        lists.add_novel(&favorites.id, &"a".into()).await.unwrap();
        lists.add_novel(&later.id, &"b".into()).await.unwrap();

        let memberships = lists.lists_for_novel(&"a".into()).await;
        assert_eq!(memberships.len(), 1);
        assert_eq!(memberships[0].id, favorites.id);
    }

    #[tokio::test]
    async fn unknown_list_is_an_error() {
        let lists = lists().await;
        assert!(matches!(
            lists.rename("nope", "x").await,
            Err(ReaderError::ListNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn lists_survive_reopen() {
        let kv = Arc::new(MemoryKv::new());
        let id = {
            let lists = ReadingLists::open(kv.clone()).await.unwrap();
            let favorites = lists.create("Favorites", Some("the good ones".into())).await.unwrap();
            lists.add_novel(&favorites.id, &"a".into()).await.unwrap();
            favorites.id
        };

        let lists = ReadingLists::open(kv).await.unwrap();
        let favorites = lists.get(&id).await.unwrap();
        assert_eq!(favorites.description.as_deref(), Some("the good ones"));
        assert!(favorites.contains(&"a".into()));
    }
}
