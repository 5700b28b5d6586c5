//! Non-dividend distribution: reduces the cost basis of every long, open Lot
//! in the pocket pro rata; any distribution beyond total basis is a Gain.
//! Short positions (a pocket that's net short the security) are untouched —
//! the affected set is scoped to `long_as_of`, not every open Lot.
//!
//! Deliberate quirk, not a bug: on overflow the emitted Gain's price is the
//! *full* per-share distribution, not just the overflowing portion.

use rust_decimal::Decimal;

use crate::error::{EngineError, Result};
use crate::predicate::long_as_of;
use crate::types::{Gain, Lot, Portfolio, Transaction};

pub(crate) fn book_return_of_capital(tx: &Transaction, portfolio: &mut Portfolio) -> Result<Vec<Gain>> {
    let Transaction::ReturnOfCapital { cash, .. } = tx
    else {
        unreachable!("book_return_of_capital called with non-ReturnOfCapital transaction")
    };

    if cash.is_zero() {
        return Err(EngineError::value(format!("cash can't be zero: {tx:?}")));
    }
    if *cash < Decimal::ZERO {
        return Err(EngineError::value(format!(
            "a return of capital's cash is signed positive for received, got {cash}: {tx:?}"
        )));
    }

    let pocket = tx.pocket();
    let position = portfolio.take_position(&pocket);
    let affected_units: Decimal = position
        .iter()
        .filter(|lot| long_as_of(tx.datetime())(lot))
        .map(|lot| lot.units)
        .sum();

    if affected_units.is_zero() {
        return Err(EngineError::inconsistent(
            tx.uniqueid(),
            "return of capital against a pocket with no long, open Lots",
        ));
    }

    let distribution = *cash;
    let per_share = distribution / affected_units;

    let affected_basis: Decimal = position
        .iter()
        .filter(|lot| long_as_of(tx.datetime())(lot))
        .map(|lot| lot.cost_basis())
        .sum();
    let overflow = distribution - affected_basis;

    let mut reduced = Vec::with_capacity(position.len());
    let mut gains = Vec::new();

    for lot in position {
        if !long_as_of(tx.datetime())(&lot) {
            reduced.push(lot);
            continue;
        }

        let reduction = per_share * lot.units;
        let new_price = lot.price - reduction / lot.units;

        if overflow > Decimal::ZERO && new_price < Decimal::ZERO {
            log::warn!(
                "{} return of capital exceeds basis on a lot opened by {}; realizing overflow as a gain",
                tx.uniqueid(),
                lot.opentransaction.uniqueid()
            );
            // basis fully exhausted; the gain realizes at the full per-share
            // distribution price, not just the overflow, but the lot itself
            // is only replaced, never closed — it survives at zero basis.
            gains.push(Gain::new(lot.clone(), tx.clone(), per_share));
            reduced.push(Lot {
                price: Decimal::ZERO,
                ..lot
            });
        } else {
            reduced.push(Lot { price: new_price, ..lot });
        }
    }

    portfolio.set_position(pocket, reduced);
    Ok(gains)
}
