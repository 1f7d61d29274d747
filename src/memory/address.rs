//! Addresses within a program image's static address space

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str;

/// An address in a named static address space, such as `ram:00400000`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StaticAddress {
    space: String,
    offset: u64,
}

impl StaticAddress {
    pub fn new(space: &str, offset: u64) -> Self {
        StaticAddress {
            space: space.to_string(),
            offset,
        }
    }

    pub fn space(&self) -> &str {
        &self.space
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }
}

impl fmt::Display for StaticAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:08x}", self.space, self.offset)
    }
}

impl str::FromStr for StaticAddress {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (space, offset) = match s.rfind(':') {
            Some(split) => (&s[..split], &s[split + 1..]),
            None => return Err(()),
        };

        if space.is_empty() {
            return Err(());
        }

        let offset = u64::from_str_radix(offset.trim_start_matches("0x"), 16).map_err(|_| ())?;

        Ok(StaticAddress::new(space, offset))
    }
}
