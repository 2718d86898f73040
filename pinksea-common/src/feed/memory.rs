use crate::{
    feed::{query::FeedQuery, store::OekakiStore},
    model::{oekaki::Oekaki, tag::TagName},
    tid::Tid,
};
use std::convert::Infallible;

/// An [`OekakiStore`] holding everything in memory.
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct MemoryStore {
    oekaki: Vec<Oekaki>,
    tag_relations: Vec<(Tid, TagName)>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_oekaki(&mut self, oekaki: Oekaki) {
        self.oekaki.push(oekaki);
    }

    /// Relates a post to a tag. Duplicate relations are kept as they are.
    pub fn insert_tag_relation(&mut self, tid: Tid, tag: TagName) {
        self.tag_relations.push((tid, tag));
    }

    fn has_tag(&self, tid: Tid, tag: &TagName) -> bool {
        self.tag_relations
            .iter()
            .any(|(related, name)| *related == tid && name == tag)
    }
}

impl OekakiStore for MemoryStore {
    type Error = Infallible;

    async fn fetch_feed(&self, query: &FeedQuery) -> Result<Vec<Oekaki>, Self::Error> {
        let has_tag = |tid: Tid, tag: &TagName| self.has_tag(tid, tag);

        let mut matching: Vec<Oekaki> = self
            .oekaki
            .iter()
            .filter(|oekaki| query.matches(oekaki, &has_tag))
            .cloned()
            .collect();

        matching.sort_by(|a, b| {
            b.indexed_at
                .cmp(&a.indexed_at)
                .then_with(|| b.tid.cmp(&a.tid))
        });
        if let Some(limit) = query.limit() {
            matching.truncate(limit);
        }

        Ok(matching)
    }

    async fn fetch_oekaki(&self, tid: Tid) -> Result<Option<Oekaki>, Self::Error> {
        Ok(self.oekaki.iter().find(|oekaki| oekaki.tid == tid).cloned())
    }
}

impl FromIterator<Oekaki> for MemoryStore {
    fn from_iter<T: IntoIterator<Item = Oekaki>>(iter: T) -> Self {
        Self {
            oekaki: iter.into_iter().collect(),
            tag_relations: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        feed::{memory::MemoryStore, query::FeedQuery, store::OekakiStore},
        model::oekaki::Oekaki,
        tid::{ClockId, Tid},
    };
    use time::macros::utc_datetime;

    fn oekaki(clock_id: u16, parent_id: Option<Tid>) -> Oekaki {
        let indexed_at = utc_datetime!(2024-06-01 12:00);
        Oekaki {
            tid: Tid::from_time(indexed_at, ClockId::new_unchecked(clock_id)).unwrap(),
            author_did: "did:plc:alice".parse().unwrap(),
            indexed_at,
            record_cid: "bafyrecord".to_owned(),
            blob_cid: "bafyblob".to_owned(),
            alt_text: None,
            parent_id,
        }
    }

    #[tokio::test]
    async fn equal_timestamps_fall_back_to_tid_order() {
        let first = oekaki(1, None);
        let second = oekaki(2, None);
        let store: MemoryStore = [first.clone(), second.clone()].into_iter().collect();

        let feed = store.fetch_feed(&FeedQuery::new()).await.unwrap();

        assert_eq!(feed, vec![second, first]);
    }

    #[tokio::test]
    async fn dangling_parent_is_absent_not_an_error() {
        let missing_parent = oekaki(1, None).tid;
        let reply = oekaki(2, Some(missing_parent));
        let store: MemoryStore = [reply.clone()].into_iter().collect();

        assert_eq!(store.fetch_oekaki(missing_parent).await.unwrap(), None);
        assert_eq!(store.fetch_oekaki(reply.tid).await.unwrap(), Some(reply));
    }

    #[tokio::test]
    async fn self_referential_parent_is_tolerated() {
        let mut looping = oekaki(1, None);
        looping.parent_id = Some(looping.tid);
        let store: MemoryStore = [looping.clone()].into_iter().collect();

        let parent = store.fetch_oekaki(looping.tid).await.unwrap();

        assert_eq!(parent, Some(looping));
    }
}
