//! Forward/reverse split: every Lot open as of the split date is rescaled by
//! `numerator/denominator`, closing none. Lots not yet open at that date (a
//! stream processed out of chronological order) pass through untouched.

use rust_decimal::Decimal;

use crate::error::{EngineError, Result};
use crate::handlers::units_tolerance;
use crate::predicate::open_as_of;
use crate::types::{Gain, Lot, Portfolio, Transaction};

pub(crate) fn book_split(tx: &Transaction, portfolio: &mut Portfolio) -> Result<Vec<Gain>> {
    let Transaction::Split {
        numerator,
        denominator,
        units,
        ..
    } = tx
    else {
        unreachable!("book_split called with non-Split transaction")
    };

    if numerator.is_zero() || denominator.is_zero() {
        return Err(EngineError::value(format!(
            "split numerator/denominator can't be zero: {tx:?}"
        )));
    }

    let ratio = numerator / denominator;
    let pocket = tx.pocket();
    let position = portfolio.take_position(&pocket);
    let affected_predicate = open_as_of(tx.datetime());

    let pre_units: Decimal = position
        .iter()
        .filter(|lot| affected_predicate(lot))
        .map(|lot| lot.units)
        .sum();

    if pre_units.is_zero() {
        portfolio.set_position(pocket, position);
        return Err(EngineError::inconsistent(tx.uniqueid(), "split against a pocket with no open Lots"));
    }

    let expected_delta = pre_units * ratio - pre_units;
    if (expected_delta - *units).abs() > units_tolerance() {
        portfolio.set_position(pocket, position);
        log::warn!(
            "{} split delta mismatch: reported {units}, computed {expected_delta}",
            tx.uniqueid()
        );
        return Err(EngineError::inconsistent(
            tx.uniqueid(),
            format!(
                "split reports a delta of {units} units but scaling the current position by {ratio} yields a delta of {expected_delta}"
            ),
        ));
    }

    let rescaled: Vec<Lot> = position
        .into_iter()
        .map(|lot| {
            if affected_predicate(&lot) {
                Lot {
                    units: lot.units * ratio,
                    price: lot.price / ratio,
                    ..lot
                }
            } else {
                lot
            }
        })
        .collect();

    portfolio.set_position(pocket, rescaled);
    Ok(Vec::new())
}
