//! # Rupiah Module
//!
//! Provides the `Rupiah` type for Indonesian Rupiah amounts.
//!
//! ## Why Integer Rupiah?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                         │
//! │                                                                     │
//! │  In JavaScript/floating point:                                      │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                       │
//! │                                                                     │
//! │  Rupiah banknotes have no usable subunit (sen is long obsolete),    │
//! │  so every amount in the system is a whole number of rupiah.         │
//! │  i64 arithmetic is exact; only the UI layer ever sees a string.     │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tunai_core::money::Rupiah;
//!
//! let note = Rupiah::new(50_000);
//! let total = note + Rupiah::new(20_000);
//!
//! assert_eq!(total.value(), 70_000);
//! assert_eq!(total.to_string(), "Rp 70.000");
//! assert_eq!(note.to_words(), "lima puluh ribu rupiah");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Rupiah Type
// =============================================================================

/// A monetary amount in whole Indonesian Rupiah.
///
/// ## Design Decisions
/// - **i64 (signed)**: totals fit comfortably; signed keeps subtraction total
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Derives**: full serde support so breakdowns serialize as plain numbers
///
/// ## Where Rupiah Flows
/// ```text
/// Denomination.rupiah() ──► Session total ──► "Rp 120.000" in responses
///                                        └──► "seratus dua puluh ribu rupiah"
///                                             spoken aloud by the frontend
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Rupiah(i64);

impl Rupiah {
    /// Creates an amount from whole rupiah.
    #[inline]
    pub const fn new(amount: i64) -> Self {
        Rupiah(amount)
    }

    /// Returns the amount as a plain integer.
    #[inline]
    pub const fn value(&self) -> i64 {
        self.0
    }

    /// Zero rupiah.
    #[inline]
    pub const fn zero() -> Self {
        Rupiah(0)
    }

    /// Checks if the amount is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the amount is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Multiplies the amount by a count (tally subtotals).
    #[inline]
    pub const fn multiply_count(&self, count: i64) -> Self {
        Rupiah(self.0 * count)
    }

    /// Renders the amount as spoken Indonesian, e.g. for text-to-speech.
    ///
    /// ## Example
    /// ```rust
    /// use tunai_core::money::Rupiah;
    ///
    /// assert_eq!(Rupiah::zero().to_words(), "nol rupiah");
    /// assert_eq!(Rupiah::new(1_000).to_words(), "seribu rupiah");
    /// assert_eq!(Rupiah::new(120_000).to_words(), "seratus dua puluh ribu rupiah");
    /// ```
    pub fn to_words(&self) -> String {
        if self.0 == 0 {
            return "nol rupiah".to_string();
        }

        let mut n = self.0;
        let mut parts: Vec<String> = Vec::new();

        if n < 0 {
            parts.push("minus".to_string());
            n = -n;
        }

        if n >= 1_000_000_000 {
            let billions = n / 1_000_000_000;
            n %= 1_000_000_000;
            if billions == 1 {
                parts.push("satu miliar".to_string());
            } else {
                parts.push(format!("{} miliar", words_under_thousand(billions)));
            }
        }

        if n >= 1_000_000 {
            let millions = n / 1_000_000;
            n %= 1_000_000;
            if millions == 1 {
                parts.push("satu juta".to_string());
            } else {
                parts.push(format!("{} juta", words_under_thousand(millions)));
            }
        }

        if n >= 1_000 {
            let thousands = n / 1_000;
            n %= 1_000;
            // "seribu", never "satu ribu"
            if thousands == 1 {
                parts.push("seribu".to_string());
            } else {
                parts.push(format!("{} ribu", words_under_thousand(thousands)));
            }
        }

        if n > 0 {
            parts.push(words_under_thousand(n));
        }

        format!("{} rupiah", parts.join(" "))
    }
}

/// Spoken Indonesian for 1..=999.
fn words_under_thousand(n: i64) -> String {
    const SATUAN: [&str; 10] = [
        "", "satu", "dua", "tiga", "empat", "lima", "enam", "tujuh", "delapan", "sembilan",
    ];
    const BELASAN: [&str; 10] = [
        "sepuluh",
        "sebelas",
        "dua belas",
        "tiga belas",
        "empat belas",
        "lima belas",
        "enam belas",
        "tujuh belas",
        "delapan belas",
        "sembilan belas",
    ];

    debug_assert!((1..1000).contains(&n));

    if n < 10 {
        return SATUAN[n as usize].to_string();
    }
    if n < 20 {
        return BELASAN[(n - 10) as usize].to_string();
    }
    if n < 100 {
        let tens = n / 10;
        let ones = n % 10;
        return if ones > 0 {
            format!("{} puluh {}", SATUAN[tens as usize], SATUAN[ones as usize])
        } else {
            format!("{} puluh", SATUAN[tens as usize])
        };
    }

    let hundreds = n / 100;
    let remainder = n % 100;
    // "seratus", never "satu ratus"
    let head = if hundreds == 1 {
        "seratus".to_string()
    } else {
        format!("{} ratus", SATUAN[hundreds as usize])
    };
    if remainder > 0 {
        format!("{} {}", head, words_under_thousand(remainder))
    } else {
        head
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display renders the Indonesian currency format: `Rp 50.000`.
///
/// Thousands are grouped with dots, matching `toLocaleString('id-ID')`
/// on the frontend.
impl fmt::Display for Rupiah {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let digits = self.0.unsigned_abs().to_string();

        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        let offset = digits.len() % 3;
        for (i, c) in digits.chars().enumerate() {
            if i != 0 && (i + 3 - offset) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(c);
        }

        write!(f, "{}Rp {}", sign, grouped)
    }
}

/// Default amount is zero.
impl Default for Rupiah {
    fn default() -> Self {
        Rupiah::zero()
    }
}

impl Add for Rupiah {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Rupiah(self.0 + other.0)
    }
}

impl AddAssign for Rupiah {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Rupiah {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Rupiah(self.0 - other.0)
    }
}

impl SubAssign for Rupiah {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by a banknote count.
impl Mul<i64> for Rupiah {
    type Output = Self;

    #[inline]
    fn mul(self, count: i64) -> Self {
        Rupiah(self.0 * count)
    }
}

impl Sum for Rupiah {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Rupiah::zero(), Add::add)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_and_value() {
        let amount = Rupiah::new(50_000);
        assert_eq!(amount.value(), 50_000);
        assert!(amount.is_positive());
        assert!(!amount.is_zero());
    }

    #[test]
    fn test_display_grouping() {
        assert_eq!(Rupiah::new(0).to_string(), "Rp 0");
        assert_eq!(Rupiah::new(500).to_string(), "Rp 500");
        assert_eq!(Rupiah::new(1_000).to_string(), "Rp 1.000");
        assert_eq!(Rupiah::new(50_000).to_string(), "Rp 50.000");
        assert_eq!(Rupiah::new(120_000).to_string(), "Rp 120.000");
        assert_eq!(Rupiah::new(1_234_567).to_string(), "Rp 1.234.567");
        assert_eq!(Rupiah::new(-50_000).to_string(), "-Rp 50.000");
    }

    #[test]
    fn test_arithmetic() {
        let a = Rupiah::new(50_000);
        let b = Rupiah::new(20_000);

        assert_eq!((a + b).value(), 70_000);
        assert_eq!((a - b).value(), 30_000);
        assert_eq!((a * 3).value(), 150_000);

        let mut total = Rupiah::zero();
        total += a;
        total += a;
        assert_eq!(total.value(), 100_000);
    }

    #[test]
    fn test_sum() {
        let notes = [Rupiah::new(50_000), Rupiah::new(20_000), Rupiah::new(50_000)];
        let total: Rupiah = notes.iter().copied().sum();
        assert_eq!(total.value(), 120_000);
    }

    #[test]
    fn test_words_banknote_denominations() {
        // The seven fixed denominations, as spoken by the TTS layer
        assert_eq!(Rupiah::new(1_000).to_words(), "seribu rupiah");
        assert_eq!(Rupiah::new(2_000).to_words(), "dua ribu rupiah");
        assert_eq!(Rupiah::new(5_000).to_words(), "lima ribu rupiah");
        assert_eq!(Rupiah::new(10_000).to_words(), "sepuluh ribu rupiah");
        assert_eq!(Rupiah::new(20_000).to_words(), "dua puluh ribu rupiah");
        assert_eq!(Rupiah::new(50_000).to_words(), "lima puluh ribu rupiah");
        assert_eq!(Rupiah::new(100_000).to_words(), "seratus ribu rupiah");
    }

    #[test]
    fn test_words_compound_totals() {
        assert_eq!(Rupiah::zero().to_words(), "nol rupiah");
        assert_eq!(Rupiah::new(120_000).to_words(), "seratus dua puluh ribu rupiah");
        assert_eq!(Rupiah::new(170_000).to_words(), "seratus tujuh puluh ribu rupiah");
        assert_eq!(
            Rupiah::new(275_000).to_words(),
            "dua ratus tujuh puluh lima ribu rupiah"
        );
        assert_eq!(Rupiah::new(1_000_000).to_words(), "satu juta rupiah");
        assert_eq!(
            Rupiah::new(1_550_000).to_words(),
            "satu juta lima ratus lima puluh ribu rupiah"
        );
        assert_eq!(
            Rupiah::new(12_011_000).to_words(),
            "dua belas juta sebelas ribu rupiah"
        );
        assert_eq!(Rupiah::new(1_000_000_000).to_words(), "satu miliar rupiah");
    }

    #[test]
    fn test_words_teens() {
        assert_eq!(Rupiah::new(11_000).to_words(), "sebelas ribu rupiah");
        assert_eq!(Rupiah::new(19_000).to_words(), "sembilan belas ribu rupiah");
    }
}
