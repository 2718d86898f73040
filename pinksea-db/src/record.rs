use pinksea_common::model::{
    ModelValidationError,
    author::{Author, Did, Handle},
    oekaki::Oekaki,
};
use sqlx::FromRow;
use time::{Duration, PrimitiveDateTime, UtcDateTime};
use tracing::warn;

#[derive(Clone, Eq, PartialEq, Debug, FromRow)]
pub(crate) struct OekakiRecord {
    pub tid: String,
    pub author_did: String,
    pub indexed_at: PrimitiveDateTime,
    pub record_cid: String,
    pub blob_cid: String,
    pub alt_text: Option<String>,
    pub parent_id: Option<String>,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, FromRow)]
pub(crate) struct AuthorRecord {
    pub did: String,
    pub handle: Option<String>,
}

/// Timestamps are stored without a time zone and are always UTC.
pub(crate) fn to_timestamp(time: UtcDateTime) -> PrimitiveDateTime {
    PrimitiveDateTime::new(time.date(), time.time())
}

/// Converts a comparison bound, rounding up to the microsecond precision of stored
/// timestamps. Stored values have no sub-microsecond part, so `<` and `>=` against the
/// rounded bound select the same rows as against the exact one.
pub(crate) fn to_bound(time: UtcDateTime) -> PrimitiveDateTime {
    let sub_micros = time.nanosecond() % 1000;
    let time = if sub_micros == 0 {
        time
    } else {
        time.saturating_add(Duration::nanoseconds(i64::from(1000 - sub_micros)))
    };

    to_timestamp(time)
}

/// Converts feed rows, dropping the ones that fail validation.
pub(crate) fn valid_oekaki(records: Vec<OekakiRecord>) -> Vec<Oekaki> {
    records
        .into_iter()
        .filter_map(|record| {
            let tid = record.tid.clone();
            Oekaki::try_from(record)
                .inspect_err(|err| warn!(tid = %tid, error = %err, "Skipping invalid oekaki row"))
                .ok()
        })
        .collect()
}

impl TryFrom<OekakiRecord> for Oekaki {
    type Error = ModelValidationError;

    fn try_from(value: OekakiRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            tid: value.tid.parse()?,
            author_did: Did::new(value.author_did)?,
            indexed_at: value.indexed_at.as_utc(),
            record_cid: value.record_cid,
            blob_cid: value.blob_cid,
            alt_text: value.alt_text,
            parent_id: value.parent_id.map(|tid| tid.parse()).transpose()?,
        })
    }
}

impl TryFrom<AuthorRecord> for Author {
    type Error = ModelValidationError;

    fn try_from(value: AuthorRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            did: Did::new(value.did)?,
            handle: value.handle.map(Handle::new).transpose()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::record::{AuthorRecord, OekakiRecord, to_bound, to_timestamp, valid_oekaki};
    use pinksea_common::model::{
        ModelValidationError,
        author::{Author, Handle},
        oekaki::Oekaki,
    };
    use time::macros::{datetime, utc_datetime};

    fn record() -> OekakiRecord {
        OekakiRecord {
            tid: "3kbf5quwqzs2k".to_owned(),
            author_did: "did:plc:alice".to_owned(),
            indexed_at: datetime!(2024-11-09 13:37:00.5),
            record_cid: "bafyrecord".to_owned(),
            blob_cid: "bafyblob".to_owned(),
            alt_text: Some("a pink sea".to_owned()),
            parent_id: Some("3jzfcijpj2z2a".to_owned()),
        }
    }

    #[test]
    fn oekaki_from_record() {
        let oekaki = Oekaki::try_from(record()).unwrap();

        assert_eq!(oekaki.tid.to_string(), "3kbf5quwqzs2k");
        assert_eq!(oekaki.author_did.get(), "did:plc:alice");
        assert_eq!(oekaki.indexed_at, utc_datetime!(2024-11-09 13:37:00.5));
        assert_eq!(oekaki.alt_text.as_deref(), Some("a pink sea"));
        assert_eq!(
            oekaki.parent_id.map(|tid| tid.to_string()).as_deref(),
            Some("3jzfcijpj2z2a")
        );
    }

    #[test]
    fn invalid_records_are_rejected() {
        let bad_tid = OekakiRecord {
            tid: "not-a-tid".to_owned(),
            ..record()
        };
        assert!(matches!(
            Oekaki::try_from(bad_tid),
            Err(ModelValidationError::Tid(_))
        ));

        let bad_parent = OekakiRecord {
            parent_id: Some(String::new()),
            ..record()
        };
        assert!(matches!(
            Oekaki::try_from(bad_parent),
            Err(ModelValidationError::Tid(_))
        ));

        let bad_author = OekakiRecord {
            author_did: "alice".to_owned(),
            ..record()
        };
        assert!(matches!(
            Oekaki::try_from(bad_author),
            Err(ModelValidationError::Did(_))
        ));
    }

    #[test]
    fn invalid_feed_rows_are_skipped() {
        let bad_tid = OekakiRecord {
            tid: "not-a-tid".to_owned(),
            ..record()
        };
        let bad_author = OekakiRecord {
            author_did: "alice".to_owned(),
            ..record()
        };

        let oekaki = valid_oekaki(vec![bad_tid, record(), bad_author]);

        assert_eq!(oekaki, vec![Oekaki::try_from(record()).unwrap()]);
    }

    #[test]
    fn author_from_record() {
        let author = Author::try_from(AuthorRecord {
            did: "did:plc:alice".to_owned(),
            handle: Some("alice.test".to_owned()),
        })
        .unwrap();
        assert_eq!(author.handle.as_ref().map(Handle::get), Some("alice.test"));

        let unhandled = Author::try_from(AuthorRecord {
            did: "did:plc:alice".to_owned(),
            handle: None,
        })
        .unwrap();
        assert_eq!(unhandled.handle, None);

        assert!(matches!(
            Author::try_from(AuthorRecord {
                did: "did:plc:alice".to_owned(),
                handle: Some("no dots".to_owned()),
            }),
            Err(ModelValidationError::Handle(_))
        ));
    }

    #[test]
    fn timestamps_round_trip_through_utc() {
        let time = utc_datetime!(2024-11-09 13:37:00.123456);
        assert_eq!(to_timestamp(time).as_utc(), time);
    }

    #[test]
    fn bounds_round_up_to_stored_precision() {
        assert_eq!(
            to_bound(utc_datetime!(2024-06-01 12:00:00.000001)),
            datetime!(2024-06-01 12:00:00.000001)
        );
        assert_eq!(
            to_bound(utc_datetime!(2024-06-01 12:00:00.0000005)),
            datetime!(2024-06-01 12:00:00.000001)
        );
        assert_eq!(
            to_bound(utc_datetime!(2024-06-01 23:59:59.9999999)),
            datetime!(2024-06-02 00:00)
        );
    }
}
