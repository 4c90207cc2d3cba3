//! Random test data
//!
//! Builders for owners, amounts and currencies. Every function takes the
//! random source explicitly; seed a `StdRng` for reproducible data.

use rand::seq::SliceRandom;
use rand::Rng;
use rust_decimal::Decimal;

use crate::domain::Currency;
use crate::store::CreateAccountParams;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Integer in `min..=max`
pub fn random_int<R: Rng + ?Sized>(rng: &mut R, min: i64, max: i64) -> i64 {
    rng.gen_range(min..=max)
}

/// Uppercase ASCII string of `len` letters
pub fn random_string<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Six-letter account owner
pub fn random_owner<R: Rng + ?Sized>(rng: &mut R) -> String {
    random_string(rng, 6)
}

/// Amount in `0.00..=max + 0.99`, two decimal places
pub fn random_money<R: Rng + ?Sized>(rng: &mut R, max: i64) -> Decimal {
    let cents = random_int(rng, 0, max.max(0) * 100 + 99);
    Decimal::new(cents, 2)
}

pub fn random_currency<R: Rng + ?Sized>(rng: &mut R) -> Currency {
    *Currency::ALL
        .choose(rng)
        .unwrap_or(&Currency::Usd)
}

/// Account with a random owner, currency and balance up to `max_balance`
pub fn random_account_params<R: Rng + ?Sized>(rng: &mut R, max_balance: i64) -> CreateAccountParams {
    let currency = random_currency(rng);
    CreateAccountParams::new(random_owner(rng), random_money(rng, max_balance), currency)
}
