//! Intervals on the execution-time axis

use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::fmt;

/// A point on a trace's execution-time axis.
pub type Snap = i64;

/// The span of snaps during which something exists.
///
/// A lifespan starts at a creation snap and, once its owner is destroyed,
/// ends at the destruction snap. The end is exclusive: something destroyed at
/// snap 5 is alive at snap 4 and gone at snap 5. An open lifespan has no end
/// and contains every snap from its start onwards.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "LifespanRepr", into = "LifespanRepr")]
pub struct Lifespan {
    start: Snap,
    end: Option<Snap>,
}

/// On-disk form of a `Lifespan`, checked on the way in.
#[derive(Serialize, Deserialize)]
struct LifespanRepr {
    start: Snap,

    #[serde(default)]
    end: Option<Snap>,
}

impl TryFrom<LifespanRepr> for Lifespan {
    type Error = String;

    fn try_from(repr: LifespanRepr) -> Result<Self, Self::Error> {
        match repr.end {
            None => Ok(Lifespan::now_on(repr.start)),
            Some(end) => Lifespan::span(repr.start, end)
                .ok_or_else(|| format!("lifespan cannot end at {} when it starts at {}", end, repr.start)),
        }
    }
}

impl From<Lifespan> for LifespanRepr {
    fn from(lifespan: Lifespan) -> Self {
        LifespanRepr {
            start: lifespan.start,
            end: lifespan.end,
        }
    }
}

impl Lifespan {
    /// A lifespan that begins at `start` and never ends.
    pub fn now_on(start: Snap) -> Self {
        Lifespan { start, end: None }
    }

    /// A closed lifespan from `start` up to (but not including) `end`.
    ///
    /// Yields `None` if `end` precedes `start`. A lifespan where both are equal
    /// is valid but contains no snaps.
    pub fn span(start: Snap, end: Snap) -> Option<Self> {
        if start <= end {
            Some(Lifespan {
                start,
                end: Some(end),
            })
        } else {
            None
        }
    }

    pub fn start(&self) -> Snap {
        self.start
    }

    /// The exclusive end of this lifespan, if it has been closed.
    pub fn end(&self) -> Option<Snap> {
        self.end
    }

    pub fn is_open(&self) -> bool {
        self.end.is_none()
    }

    pub fn is_empty(&self) -> bool {
        self.end == Some(self.start)
    }

    pub fn contains(&self, snap: Snap) -> bool {
        self.start <= snap && self.end.map_or(true, |end| snap < end)
    }

    /// Determine if any snap is contained by both lifespans.
    pub fn intersects(&self, other: &Lifespan) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }

        let self_before_other_ends = other.end.map_or(true, |end| self.start < end);
        let other_before_self_ends = self.end.map_or(true, |end| other.start < end);

        self_before_other_ends && other_before_self_ends
    }

    /// Close this lifespan at the given snap.
    ///
    /// Yields `None` if the snap precedes the start of the lifespan.
    pub fn closed_at(&self, end: Snap) -> Option<Self> {
        Lifespan::span(self.start, end)
    }
}

impl fmt::Display for Lifespan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.end {
            Some(end) => write!(f, "[{}, {})", self.start, end),
            None => write!(f, "[{}, +inf)", self.start),
        }
    }
}
