//! Ordinary buy/sell: closes prior opposite-sign Lots and opens a new Lot
//! with any leftover units, all on the same pocket.

use crate::error::{EngineError, Result};
use crate::handlers::mutate_portfolio;
use crate::sort::SortStrategy;
use crate::types::{Gain, Portfolio, Transaction};

pub(crate) fn book_trade(tx: &Transaction, portfolio: &mut Portfolio, sort: SortStrategy) -> Result<Vec<Gain>> {
    let Transaction::Trade {
        units, cash, currency, ..
    } = tx
    else {
        unreachable!("book_trade called with non-Trade transaction")
    };

    if units.is_zero() {
        return Err(EngineError::value(format!("units can't be zero: {tx:?}")));
    }

    mutate_portfolio(
        portfolio,
        tx.pocket(),
        tx,
        *units,
        *cash,
        currency.clone(),
        None,
        sort,
    )
}
