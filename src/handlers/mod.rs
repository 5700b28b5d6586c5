pub(crate) mod exercise;
pub(crate) mod return_of_capital;
pub(crate) mod spinoff;
pub(crate) mod split;
pub(crate) mod trade;
pub(crate) mod transfer;

use rust_decimal::Decimal;

use crate::error::{EngineError, Result};
use crate::partition::part_units;
use crate::predicate::closable_by;
use crate::sort::SortStrategy;
use crate::types::{Currency, Gain, Lot, Pocket, Portfolio, Transaction};

/// Dispatch a transaction to its handler and apply it to `portfolio`.
///
/// `sort` selects the gain-recognition ordering for handlers that close
/// Lots (Trade, Transfer, Spinoff, Exercise); it is ignored by
/// ReturnOfCapital and Split, which close none. Defaults to FIFO.
///
/// # Errors
/// `EngineError::Value` for a malformed transaction (bad sign, zero units);
/// `EngineError::Inconsistent` if the Portfolio can't satisfy a well-formed
/// transaction; `EngineError::UnknownVariant` for `Transaction::Persisted`.
/// On any error the Portfolio is left byte-identical to its pre-call state.
pub fn book(
    tx: &Transaction,
    portfolio: &mut Portfolio,
    sort: Option<SortStrategy>,
) -> Result<Vec<Gain>> {
    let sort = sort.unwrap_or_default();
    match tx {
        Transaction::Trade { .. } => trade::book_trade(tx, portfolio, sort),
        Transaction::ReturnOfCapital { .. } => return_of_capital::book_return_of_capital(tx, portfolio),
        Transaction::Split { .. } => split::book_split(tx, portfolio),
        Transaction::Transfer { .. } => transfer::book_transfer(tx, portfolio, sort),
        Transaction::Spinoff { .. } => spinoff::book_spinoff(tx, portfolio, sort),
        Transaction::Exercise { .. } => exercise::book_exercise(tx, portfolio, sort),
        Transaction::Persisted { .. } => Err(EngineError::UnknownVariant),
    }
}

/// Shared closer used by every handler: sorts the destination pocket,
/// closes any Lots of opposite sign that the incoming `units`/`cash` can
/// satisfy, and opens a new Lot with whatever units are left over.
///
/// `gain_tx` is the caller-visible transaction bound to every emitted Gain
/// (never a synthetic intermediate). `opentransaction` overrides the holding-period anchor of
/// any newly-opened Lot; when absent it defaults to `gain_tx` (an ordinary
/// opening trade starts its own holding period).
#[allow(clippy::too_many_arguments)]
pub(crate) fn mutate_portfolio(
    portfolio: &mut Portfolio,
    pocket: Pocket,
    gain_tx: &Transaction,
    units: Decimal,
    cash: Decimal,
    currency: Currency,
    opentransaction: Option<&Transaction>,
    sort: SortStrategy,
) -> Result<Vec<Gain>> {
    let mut position = portfolio.take_position(&pocket);
    sort.sort(&mut position);

    let price = (cash / units).abs();

    let (closed, mut remaining) = match part_units(&position, closable_by(gain_tx, units), Some(-units)) {
        Ok(split) => split,
        Err(msg) => {
            portfolio.set_position(pocket, position);
            return Err(EngineError::inconsistent(gain_tx.uniqueid(), msg));
        }
    };

    let leftover_units: Decimal = units + closed.iter().map(|lot| lot.units).sum::<Decimal>();
    if !leftover_units.is_zero() {
        remaining.push(Lot {
            opentransaction: opentransaction.cloned().unwrap_or_else(|| gain_tx.clone()),
            createtransaction: gain_tx.clone(),
            units: leftover_units,
            price,
            currency,
        });
    }

    portfolio.set_position(pocket, remaining);

    if !closed.is_empty() {
        log::debug!(
            "{} closed {} lot(s) at {price}",
            gain_tx.uniqueid(),
            closed.len()
        );
    }

    Ok(closed
        .into_iter()
        .map(|lot| Gain::new(lot, gain_tx.clone(), price))
        .collect())
}

/// Significance threshold for the difference between a transaction's
/// reported units and the units actually produced by scaling a position
/// (Split, Spinoff). Below this, floating settlement-system rounding is
/// tolerated; above it, the Portfolio is Inconsistent.
pub(crate) fn units_tolerance() -> Decimal {
    Decimal::new(1, 3) // 0.001
}
