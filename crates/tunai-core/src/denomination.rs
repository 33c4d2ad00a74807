//! # Denomination Module
//!
//! The fixed set of Indonesian Rupiah banknote face values.
//!
//! ## The Closed Set
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  Rp 1.000   Rp 2.000   Rp 5.000   Rp 10.000                         │
//! │  Rp 20.000  Rp 50.000  Rp 100.000                                   │
//! │                                                                     │
//! │  Nothing else is a banknote. A detector result outside this set     │
//! │  (including the value-0 "not recognized" marker) never enters a     │
//! │  counting session.                                                  │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::money::Rupiah;

// =============================================================================
// Denomination
// =============================================================================

/// A banknote face value. Immutable enumeration, not user-extensible.
///
/// Serialized as its integer face value so breakdown JSON reads
/// `{"value": 50000, "count": 2}` on the wire and in storage. Structs
/// exporting TypeScript bindings declare fields of this type as `number`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Denomination {
    Rp1000,
    Rp2000,
    Rp5000,
    Rp10000,
    Rp20000,
    Rp50000,
    Rp100000,
}

impl Denomination {
    /// All denominations in ascending face-value order.
    pub const ALL: [Denomination; 7] = [
        Denomination::Rp1000,
        Denomination::Rp2000,
        Denomination::Rp5000,
        Denomination::Rp10000,
        Denomination::Rp20000,
        Denomination::Rp50000,
        Denomination::Rp100000,
    ];

    /// Returns the face value in whole rupiah.
    #[inline]
    pub const fn value(&self) -> i64 {
        match self {
            Denomination::Rp1000 => 1_000,
            Denomination::Rp2000 => 2_000,
            Denomination::Rp5000 => 5_000,
            Denomination::Rp10000 => 10_000,
            Denomination::Rp20000 => 20_000,
            Denomination::Rp50000 => 50_000,
            Denomination::Rp100000 => 100_000,
        }
    }

    /// Returns the face value as a `Rupiah` amount.
    #[inline]
    pub const fn rupiah(&self) -> Rupiah {
        Rupiah::new(self.value())
    }

    /// The fixed spoken form for this note, fed to text-to-speech.
    pub const fn speech_text(&self) -> &'static str {
        match self {
            Denomination::Rp1000 => "seribu rupiah",
            Denomination::Rp2000 => "dua ribu rupiah",
            Denomination::Rp5000 => "lima ribu rupiah",
            Denomination::Rp10000 => "sepuluh ribu rupiah",
            Denomination::Rp20000 => "dua puluh ribu rupiah",
            Denomination::Rp50000 => "lima puluh ribu rupiah",
            Denomination::Rp100000 => "seratus ribu rupiah",
        }
    }

    /// Looks up a denomination by face value.
    ///
    /// Returns `None` for anything outside the set, including the
    /// detector's value-0 failure marker.
    pub fn from_value(value: i64) -> Option<Self> {
        match value {
            1_000 => Some(Denomination::Rp1000),
            2_000 => Some(Denomination::Rp2000),
            5_000 => Some(Denomination::Rp5000),
            10_000 => Some(Denomination::Rp10000),
            20_000 => Some(Denomination::Rp20000),
            50_000 => Some(Denomination::Rp50000),
            100_000 => Some(Denomination::Rp100000),
            _ => None,
        }
    }
}

impl TryFrom<i64> for Denomination {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Denomination::from_value(value)
            .ok_or_else(|| format!("{} is not a Rupiah banknote denomination", value))
    }
}

impl From<Denomination> for i64 {
    fn from(d: Denomination) -> i64 {
        d.value()
    }
}

/// Display uses the currency format: `Rp 50.000`.
impl fmt::Display for Denomination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.rupiah().fmt(f)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_value_accepts_the_fixed_set() {
        for d in Denomination::ALL {
            assert_eq!(Denomination::from_value(d.value()), Some(d));
        }
    }

    #[test]
    fn test_from_value_rejects_everything_else() {
        assert_eq!(Denomination::from_value(0), None);
        assert_eq!(Denomination::from_value(500), None);
        assert_eq!(Denomination::from_value(75_000), None);
        assert_eq!(Denomination::from_value(-1_000), None);
        assert_eq!(Denomination::from_value(1_000_000), None);
    }

    #[test]
    fn test_ordering_follows_face_value() {
        assert!(Denomination::Rp100000 > Denomination::Rp50000);
        assert!(Denomination::Rp2000 > Denomination::Rp1000);

        let mut sorted = Denomination::ALL;
        sorted.sort();
        assert_eq!(sorted, Denomination::ALL);
    }

    #[test]
    fn test_serde_as_integer() {
        let json = serde_json::to_string(&Denomination::Rp50000).unwrap();
        assert_eq!(json, "50000");

        let back: Denomination = serde_json::from_str("20000").unwrap();
        assert_eq!(back, Denomination::Rp20000);

        assert!(serde_json::from_str::<Denomination>("0").is_err());
        assert!(serde_json::from_str::<Denomination>("750").is_err());
    }

    #[test]
    fn test_speech_text_matches_words() {
        for d in Denomination::ALL {
            assert_eq!(d.speech_text(), d.rupiah().to_words());
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(Denomination::Rp100000.to_string(), "Rp 100.000");
        assert_eq!(Denomination::Rp1000.to_string(), "Rp 1.000");
    }
}
