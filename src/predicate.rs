//! Temporal and sign predicates over Lots, exposed as first-class closures
//! so handlers and tests can compose new ones without branching in the
//! partition primitives themselves.

use chrono::NaiveDateTime;

use crate::types::{Lot, Transaction};

/// Lots whose creating transaction happened on or before `when`.
pub fn open_as_of(when: NaiveDateTime) -> impl Fn(&Lot) -> bool {
    move |lot: &Lot| lot.createtransaction.datetime() <= when
}

/// Long (positive-unit) Lots created on or before `when`.
pub fn long_as_of(when: NaiveDateTime) -> impl Fn(&Lot) -> bool {
    move |lot: &Lot| lot.createtransaction.datetime() <= when && lot.units > rust_decimal::Decimal::ZERO
}

/// Lots open as of `tx`'s date whose sign is opposite `tx`'s units, i.e. can
/// be closed by booking `tx`.
pub fn closable_by<'a>(tx: &'a Transaction, tx_units: rust_decimal::Decimal) -> impl Fn(&Lot) -> bool + 'a {
    let when = tx.datetime();
    move |lot: &Lot| lot.createtransaction.datetime() <= when && sign(lot.units) != sign(tx_units) && sign(lot.units) != 0
}

fn sign(d: rust_decimal::Decimal) -> i8 {
    use std::cmp::Ordering;
    match d.cmp(&rust_decimal::Decimal::ZERO) {
        Ordering::Less => -1,
        Ordering::Equal => 0,
        Ordering::Greater => 1,
    }
}
