//! `PresenceFilter`, grounded on `bancho/constants.py::PresenceFilter`.
//! Carried by the outbound `RECEIVE_UPDATES` packet to tell the server
//! which presence/stats updates this session wants pushed.

use crate::error::{ProtocolError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum PresenceFilter {
    NoPlayers = 0,
    All = 1,
    Friends = 2,
}

impl PresenceFilter {
    pub fn from_i32(value: i32) -> Result<Self> {
        match value {
            0 => Ok(Self::NoPlayers),
            1 => Ok(Self::All),
            2 => Ok(Self::Friends),
            other => Err(ProtocolError::InvalidEnumValue {
                type_name: "PresenceFilter",
                value: i64::from(other),
            }),
        }
    }

    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_known_values() {
        assert_eq!(PresenceFilter::from_i32(2).unwrap(), PresenceFilter::Friends);
        assert_eq!(PresenceFilter::Friends.as_i32(), 2);
    }

    #[test]
    fn rejects_unknown_value() {
        assert!(PresenceFilter::from_i32(9).is_err());
    }
}
