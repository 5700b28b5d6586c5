//! Non-cash distribution of a new security against an existing holding:
//! allocates a fraction of the source security's basis to new Lots of the
//! spun-off security, leaving the source Lots' units untouched.

use rust_decimal::Decimal;

use crate::error::{EngineError, Result};
use crate::handlers::{mutate_portfolio, units_tolerance};
use crate::partition::part_basis;
use crate::predicate::open_as_of;
use crate::sort::SortStrategy;
use crate::types::{Gain, Portfolio, Transaction};

pub(crate) fn book_spinoff(tx: &Transaction, portfolio: &mut Portfolio, sort: SortStrategy) -> Result<Vec<Gain>> {
    let Transaction::Spinoff {
        account,
        units,
        numerator,
        denominator,
        from_security,
        security_price,
        from_security_price,
        ..
    } = tx
    else {
        unreachable!("book_spinoff called with non-Spinoff transaction")
    };

    if *numerator <= Decimal::ZERO || *denominator <= Decimal::ZERO {
        return Err(EngineError::value(format!(
            "numerator & denominator must be positive: {tx:?}"
        )));
    }

    let source_pocket = (account.clone(), from_security.clone());
    let source_position = portfolio.take_position(&source_pocket);
    if source_position.is_empty() {
        return Err(EngineError::inconsistent(
            tx.uniqueid(),
            format!("no position in {source_pocket:?}"),
        ));
    }

    let spin_ratio = numerator / denominator;

    let cost_fraction = match (security_price, from_security_price) {
        (Some(sp), Some(fsp)) => {
            let spinoff_fmv = sp * units;
            let spunoff_fmv = fsp * units / spin_ratio;
            spinoff_fmv / (spinoff_fmv + spunoff_fmv)
        }
        _ => Decimal::ZERO,
    };

    let (lots_removed, source_remaining) = match part_basis(&source_position, open_as_of(tx.datetime()), cost_fraction) {
        Ok(split) => split,
        Err(msg) => {
            portfolio.set_position(source_pocket, source_position);
            return Err(EngineError::inconsistent(tx.uniqueid(), msg));
        }
    };

    let units_removed: Decimal = lots_removed.iter().map(|lot| lot.units).sum();
    if (units_removed * spin_ratio - units).abs() > units_tolerance() {
        portfolio.set_position(source_pocket, source_position);
        return Err(EngineError::inconsistent(
            tx.uniqueid(),
            format!(
                "spinoff of {numerator}-for-{denominator} units requires a {from_security:?} position of {} units, not {units_removed}",
                units / spin_ratio
            ),
        ));
    }

    portfolio.set_position(source_pocket, source_remaining);

    let destination = tx.pocket();
    let mut gains = Vec::new();
    for lot in lots_removed {
        let closed = mutate_portfolio(
            portfolio,
            destination.clone(),
            tx,
            lot.units * spin_ratio,
            -lot.price * lot.units,
            lot.currency.clone(),
            Some(&lot.opentransaction),
            sort,
        )?;
        gains.extend(closed);
    }

    Ok(gains)
}
