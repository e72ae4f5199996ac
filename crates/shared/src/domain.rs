use std::{fmt, ops::Add, ops::Sub, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::ParseIdError;

pub const ID_LEN: usize = 32;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub [u8; ID_LEN]);

        impl $name {
            pub fn short_log_id(&self) -> String {
                hex::encode(&self.0[..8])
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&hex::encode(self.0))
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let bytes = hex::decode(s).map_err(|_| ParseIdError::InvalidHex(s.to_string()))?;
                let id: [u8; ID_LEN] = bytes
                    .try_into()
                    .map_err(|bytes: Vec<u8>| ParseIdError::InvalidLength(bytes.len()))?;
                Ok(Self(id))
            }
        }
    };
}

id_newtype!(UserId);
id_newtype!(GroupId);
id_newtype!(PostId);
id_newtype!(FileId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PageSessionId(pub u64);

impl fmt::Display for PageSessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Amount(pub i64);

impl Amount {
    pub const ZERO: Amount = Amount(0);
    pub const ATOMS_PER_COIN: i64 = 100_000_000;

    pub fn from_coins(coins: f64) -> Self {
        Self((coins * Self::ATOMS_PER_COIN as f64).round() as i64)
    }

    pub fn to_coins(self) -> f64 {
        self.0 as f64 / Self::ATOMS_PER_COIN as f64
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Self) -> Self::Output {
        Amount(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Amount {
    type Output = Amount;

    fn sub(self, rhs: Self) -> Self::Output {
        Amount(self.0.saturating_sub(rhs.0))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.8} DCR", self.to_coins())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Offline,
    CheckingWallet,
    Online,
}

impl ConnectionState {
    pub fn can_transition_to(self, next: ConnectionState) -> bool {
        matches!(
            (self, next),
            (ConnectionState::Offline, ConnectionState::CheckingWallet)
                | (ConnectionState::CheckingWallet, ConnectionState::Online)
                | (ConnectionState::CheckingWallet, ConnectionState::Offline)
                | (ConnectionState::Online, ConnectionState::Offline)
        )
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConnectionState::Offline => "offline",
            ConnectionState::CheckingWallet => "checking wallet",
            ConnectionState::Online => "online",
        };
        f.write_str(label)
    }
}
