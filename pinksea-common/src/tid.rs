//! Module for working with TIDs (timestamp identifiers), the record keys of oekaki posts.
//!
//! See <https://atproto.com/specs/tid>

use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{Error, Unexpected},
};
use std::{
    fmt::{Display, Formatter, Write},
    str::FromStr,
};
use thiserror::Error;
use time::{Duration, UtcDateTime};

pub const TID_LEN: usize = 13;
pub const BASE32_SORTABLE: &[u8; 32] = b"234567abcdefghijklmnopqrstuvwxyz";

pub const TIMESTAMP_BITMASK: u64 = 0x7FFF_FFFF_FFFF_FC00;
pub const TIMESTAMP_OFFSET: u64 = 10;
pub const TIMESTAMP_LENGTH: u64 = 53;

pub const CLOCK_ID_BITMASK: u64 = 0x0000_0000_0000_03FF;
pub const CLOCK_ID_OFFSET: u64 = 0;
pub const CLOCK_ID_LENGTH: u64 = 10;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Error)]
pub enum TidTimestampFromDateTimeError {
    #[error("Specified time was before the unix epoch.")]
    TimeBeforeEpoch,
    #[error("Resulting timestamp uses too many bits.")]
    TimestampTooLarge,
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Error)]
pub enum TidParseError {
    #[error("A TID must be 13 characters long, got {0}")]
    InvalidLength(usize),
    #[error("Character at position {position} is not base32-sortable")]
    InvalidCharacter { position: usize },
    #[error("The high bit of a TID must be zero")]
    HighBitSet,
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("TID part was out of range for creation: {0}")]
pub struct TidPartOutOfRangeError<TInt>(TInt);

macro_rules! tid_part {
    ($name:ident: $repr:ty = (tid & $bitmask:ident) >> $offset:ident;
        len = $length:ident) => {
        #[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
        pub struct $name($repr);

        impl $name {
            #[must_use]
            pub fn new(value: $repr) -> Option<Self> {
                (u64::from(value) < 1 << $length).then_some(Self(value))
            }

            #[must_use]
            pub fn new_unchecked(value: $repr) -> Self {
                Self::new(value).expect(concat!(stringify!($name), " out of range."))
            }

            #[must_use]
            pub fn get(self) -> $repr {
                self.0
            }
        }

        impl From<Tid> for $name {
            fn from(value: Tid) -> Self {
                #[allow(clippy::cast_possible_truncation)]
                Self::new_unchecked(((value.get() & $bitmask) >> $offset) as $repr)
            }
        }

        impl TryFrom<$repr> for $name {
            type Error = TidPartOutOfRangeError<$repr>;

            fn try_from(value: $repr) -> Result<Self, Self::Error> {
                Self::new(value).ok_or(TidPartOutOfRangeError(value))
            }
        }
    };
}

tid_part!(TidTimestamp: u64 = (tid & TIMESTAMP_BITMASK) >> TIMESTAMP_OFFSET;
    len = TIMESTAMP_LENGTH);
tid_part!(ClockId: u16 = (tid & CLOCK_ID_BITMASK) >> CLOCK_ID_OFFSET;
    len = CLOCK_ID_LENGTH);

impl TryFrom<UtcDateTime> for TidTimestamp {
    type Error = TidTimestampFromDateTimeError;

    fn try_from(value: UtcDateTime) -> Result<Self, Self::Error> {
        let micros = value.unix_timestamp_nanos() / 1000;
        if micros < 0 {
            return Err(Self::Error::TimeBeforeEpoch);
        }
        let micros_u64 = u64::try_from(micros).map_err(|_| Self::Error::TimestampTooLarge)?;
        Self::new(micros_u64).ok_or(Self::Error::TimestampTooLarge)
    }
}

impl From<TidTimestamp> for UtcDateTime {
    fn from(value: TidTimestamp) -> Self {
        // 53 bits of microseconds always fit an i64.
        UtcDateTime::UNIX_EPOCH + Duration::microseconds(value.0.cast_signed())
    }
}

/// A 64 bit timestamp identifier.
///
/// The top bit is always zero, followed by 53 bits of microseconds since the unix epoch
/// and 10 bits of clock identifier. The string form is 13 characters of base32-sortable,
/// so lexicographic order of the strings matches numeric order.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct Tid(u64);

impl Tid {
    #[must_use]
    pub fn new(inner: u64) -> Option<Self> {
        (inner >> 63 == 0).then_some(Self(inner))
    }

    #[must_use]
    pub fn new_unchecked(inner: u64) -> Self {
        Self::new(inner).expect("TID high bit set.")
    }

    #[must_use]
    pub fn from_parts(timestamp: TidTimestamp, clock_id: ClockId) -> Self {
        let tid = timestamp.get() << TIMESTAMP_OFFSET | u64::from(clock_id.get()) << CLOCK_ID_OFFSET;

        Tid(tid)
    }

    pub fn from_time(
        time: UtcDateTime,
        clock_id: ClockId,
    ) -> Result<Self, TidTimestampFromDateTimeError> {
        Ok(Self::from_parts(time.try_into()?, clock_id))
    }

    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }

    #[must_use]
    pub fn timestamp(self) -> TidTimestamp {
        self.into()
    }

    #[must_use]
    pub fn clock_id(self) -> ClockId {
        self.into()
    }

    #[must_use]
    pub fn into_parts(self) -> (TidTimestamp, ClockId) {
        (self.timestamp(), self.clock_id())
    }
}

impl Display for Tid {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for position in 0..TID_LEN {
            let shift = 5 * (TID_LEN - 1 - position);
            #[allow(clippy::cast_possible_truncation)]
            let digit = ((self.0 >> shift) & 0x1F) as usize;
            f.write_char(char::from(BASE32_SORTABLE[digit]))?;
        }

        Ok(())
    }
}

impl FromStr for Tid {
    type Err = TidParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != TID_LEN {
            return Err(Self::Err::InvalidLength(s.len()));
        }

        let mut value = 0u64;
        for (position, byte) in s.bytes().enumerate() {
            let digit = BASE32_SORTABLE
                .iter()
                .position(|&c| c == byte)
                .ok_or(Self::Err::InvalidCharacter { position })?;

            // The first digit carries bits 60 to 63, so it must leave bit 63 clear.
            if position == 0 && digit >= 8 {
                return Err(Self::Err::HighBitSet);
            }

            value = value << 5 | digit as u64;
        }

        Self::new(value).ok_or(Self::Err::HighBitSet)
    }
}

impl From<Tid> for u64 {
    fn from(value: Tid) -> Self {
        value.get()
    }
}

impl Serialize for Tid {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Tid {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let inner = String::deserialize(deserializer)?;
        inner
            .parse()
            .map_err(|_| Error::invalid_value(Unexpected::Str(&inner), &"a TID"))
    }
}

#[cfg(test)]
mod tests {
    use crate::tid::{
        ClockId, Tid, TidParseError, TidTimestamp, TidTimestampFromDateTimeError,
    };
    use time::{Duration, UtcDateTime, macros::utc_datetime};

    #[test]
    fn legal_values() {
        let legal_timestamps = [0, 0xFFFF, 0x001F_FFFF_FFFF_FFFF];
        let illegal_timestamps = [0x0020_0000_0000_0000, u64::MAX];

        for legal_timestamp in legal_timestamps {
            assert!(TidTimestamp::new(legal_timestamp).is_some());
        }
        for illegal_timestamp in illegal_timestamps {
            assert!(TidTimestamp::new(illegal_timestamp).is_none());
        }

        let legal_clock_ids = [0, 0x1F, 0x3FF];
        let illegal_clock_ids = [0x400, 0xF000, u16::MAX];

        for legal_clock_id in legal_clock_ids {
            assert!(ClockId::new(legal_clock_id).is_some());
        }
        for illegal_clock_id in illegal_clock_ids {
            assert!(ClockId::new(illegal_clock_id).is_none());
        }

        assert!(Tid::new(u64::MAX >> 1).is_some());
        assert!(Tid::new(1 << 63).is_none());
    }

    #[test]
    fn tid_timestamp() {
        let legal_date_times = [
            UtcDateTime::UNIX_EPOCH,
            utc_datetime!(2024-11-09 13:37:00.123456),
            UtcDateTime::UNIX_EPOCH + Duration::microseconds(0x001F_FFFF_FFFF_FFFF),
        ];

        for legal_date_time in legal_date_times {
            let timestamp = TidTimestamp::try_from(legal_date_time).unwrap();
            assert_eq!(UtcDateTime::from(timestamp), legal_date_time);
        }

        assert_eq!(
            TidTimestamp::try_from(UtcDateTime::UNIX_EPOCH - Duration::microseconds(1)),
            Err(TidTimestampFromDateTimeError::TimeBeforeEpoch)
        );

        assert_eq!(
            TidTimestamp::try_from(
                UtcDateTime::UNIX_EPOCH + Duration::microseconds(0x0020_0000_0000_0000)
            ),
            Err(TidTimestampFromDateTimeError::TimestampTooLarge)
        );
    }

    #[test]
    fn tid_from_into_parts() {
        let timestamp = TidTimestamp::new_unchecked(1_731_159_420_123_456);
        let clock_id = ClockId::new_unchecked(0b10_1010_1010);

        let tid = Tid::from_parts(timestamp, clock_id);

        assert_eq!(tid.get(), 1_731_159_420_123_456 << 10 | 0b10_1010_1010);
        assert_eq!(tid.into_parts(), (timestamp, clock_id));
    }

    #[test]
    fn tid_string_form() {
        assert_eq!(Tid::new_unchecked(0).to_string(), "2222222222222");
        assert_eq!(
            Tid::from_parts(TidTimestamp::new_unchecked(1), ClockId::new_unchecked(0)).to_string(),
            "2222222222322"
        );
        assert_eq!(Tid::new_unchecked(u64::MAX >> 1).to_string(), "bzzzzzzzzzzzz");

        for tid in ["3jzfcijpj2z2a", "3kbf5quwqzs2k", "2222222222322", "bzzzzzzzzzzzz"] {
            assert_eq!(tid.parse::<Tid>().unwrap().to_string(), tid);
        }
    }

    #[test]
    fn tid_string_order_matches_numeric_order() {
        let earlier = Tid::from_time(utc_datetime!(2024-01-01 00:00), ClockId::new_unchecked(7))
            .unwrap();
        let later = Tid::from_time(utc_datetime!(2024-01-01 00:00:00.000001), ClockId::default())
            .unwrap();

        assert!(earlier < later);
        assert!(earlier.to_string() < later.to_string());
    }

    #[test]
    fn tid_parse_errors() {
        assert_eq!(
            "3jzfcijpj2z2".parse::<Tid>(),
            Err(TidParseError::InvalidLength(12))
        );
        assert_eq!(
            "3jzfcijpj1z2a".parse::<Tid>(),
            Err(TidParseError::InvalidCharacter { position: 9 })
        );
        assert_eq!(
            "3JZFCIJPJ2Z2A".parse::<Tid>(),
            Err(TidParseError::InvalidCharacter { position: 1 })
        );
        for high_bit_set in ["czzzzzzzzzzzz", "c222222222222", "jzzzzzzzzzzzz", "kzzzzzzzzzzzz"] {
            assert_eq!(high_bit_set.parse::<Tid>(), Err(TidParseError::HighBitSet));
        }
    }
}
