use crate::{
    model::{author::Did, oekaki::Oekaki},
    tid::Tid,
};
use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, UtcDateTime};

/// An oekaki post as handed out to clients, with the author's handle resolved.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OekakiDto {
    pub tid: Tid,
    pub author_did: Did,
    pub author_handle: String,
    #[serde(with = "time::serde::rfc3339")]
    pub indexed_at: OffsetDateTime,
    pub record_cid: String,
    pub blob_cid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Tid>,
}

impl OekakiDto {
    #[must_use]
    pub fn from_oekaki(oekaki: &Oekaki, author_handle: &str) -> Self {
        Self {
            tid: oekaki.tid,
            author_did: oekaki.author_did.clone(),
            author_handle: author_handle.to_owned(),
            indexed_at: OffsetDateTime::from(oekaki.indexed_at),
            record_cid: oekaki.record_cid.clone(),
            blob_cid: oekaki.blob_cid.clone(),
            alt_text: oekaki.alt_text.clone(),
            parent_id: oekaki.parent_id,
        }
    }

    #[must_use]
    pub fn indexed_at_utc(&self) -> UtcDateTime {
        UtcDateTime::from(self.indexed_at)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        model::{dto::OekakiDto, oekaki::Oekaki},
        tid::Tid,
    };
    use serde_json::json;
    use time::macros::utc_datetime;

    fn oekaki(alt_text: Option<&str>, parent_id: Option<Tid>) -> Oekaki {
        Oekaki {
            tid: "3kbf5quwqzs2k".parse().unwrap(),
            author_did: "did:plc:alice".parse().unwrap(),
            indexed_at: utc_datetime!(2024-11-09 13:37),
            record_cid: "bafyrecord".to_owned(),
            blob_cid: "bafyblob".to_owned(),
            alt_text: alt_text.map(str::to_owned),
            parent_id,
        }
    }

    #[test]
    fn maps_every_field() {
        let parent: Tid = "3jzfcijpj2z2a".parse().unwrap();
        let source = oekaki(Some("a pink sea"), Some(parent));

        let dto = OekakiDto::from_oekaki(&source, "alice.test");

        assert_eq!(dto.tid, source.tid);
        assert_eq!(dto.author_did, source.author_did);
        assert_eq!(dto.author_handle, "alice.test");
        assert_eq!(dto.indexed_at_utc(), source.indexed_at);
        assert_eq!(dto.record_cid, "bafyrecord");
        assert_eq!(dto.blob_cid, "bafyblob");
        assert_eq!(dto.alt_text.as_deref(), Some("a pink sea"));
        assert_eq!(dto.parent_id, Some(parent));
    }

    #[test]
    fn serializes_camel_case_and_omits_absent_fields() {
        let dto = OekakiDto::from_oekaki(&oekaki(None, None), "alice.test");

        assert_eq!(
            serde_json::to_value(&dto).unwrap(),
            json!({
                "tid": "3kbf5quwqzs2k",
                "authorDid": "did:plc:alice",
                "authorHandle": "alice.test",
                "indexedAt": "2024-11-09T13:37:00Z",
                "recordCid": "bafyrecord",
                "blobCid": "bafyblob",
            })
        );
    }
}
