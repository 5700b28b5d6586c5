//! Flattening a [`Portfolio`] into tabular rows for a caller's serialization
//! front-end, and rebuilding one from those rows. Out of scope here: actual
//! CSV/JSON encoding is the caller's job — this module only produces/consumes
//! plain `serde`-friendly structs.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Account, Currency, Lot, Portfolio, Security, Transaction, TxId};

/// One row of a flattened portfolio. `cusip`/`isin`/`conid`/`ticker` are
/// reserved for a persistence layer that tracks alternate security
/// identifiers (out of scope here, like [`crate::types::Gain::disallowed`]);
/// this crate only ever populates them with `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatLot {
    pub account: Account,
    pub security: Security,
    pub opendatetime: NaiveDateTime,
    pub opentxid: TxId,
    pub units: Decimal,
    pub cost: Decimal,
    pub currency: Currency,
    pub cusip: Option<String>,
    pub isin: Option<String>,
    pub conid: Option<String>,
    pub ticker: Option<String>,
}

/// Flatten every pocket of `portfolio` into rows, dropping any with zero
/// units. When `consolidate` is set, every Lot in a pocket collapses into a
/// single row (summed units and cost basis, anchored on the earliest
/// opening transaction) and per-Lot holding-period detail is lost; `false`
/// emits one row per Lot, preserving full round-trip fidelity (see
/// [`unflatten_portfolio`]).
pub fn flatten_portfolio(portfolio: &Portfolio, consolidate: bool) -> Vec<FlatLot> {
    let mut rows = Vec::new();

    for (pocket, position) in portfolio.iter() {
        if consolidate {
            if let Some(row) = consolidate_position(pocket, position) {
                rows.push(row);
            }
        } else {
            for lot in position {
                if lot.units.is_zero() {
                    continue;
                }
                rows.push(FlatLot {
                    account: pocket.0.clone(),
                    security: pocket.1.clone(),
                    opendatetime: lot.opentransaction.datetime(),
                    opentxid: lot.opentransaction.uniqueid().clone(),
                    units: lot.units,
                    cost: lot.cost_basis(),
                    currency: lot.currency.clone(),
                    cusip: None,
                    isin: None,
                    conid: None,
                    ticker: None,
                });
            }
        }
    }

    rows
}

fn consolidate_position(pocket: &(Account, Security), position: &[Lot]) -> Option<FlatLot> {
    let units: Decimal = position.iter().map(|lot| lot.units).sum();
    if units.is_zero() {
        return None;
    }

    let cost: Decimal = position.iter().map(|lot| lot.cost_basis()).sum();
    let earliest = position
        .iter()
        .min_by_key(|lot| (lot.opentransaction.datetime(), lot.opentransaction.uniqueid().clone()))?;

    Some(FlatLot {
        account: pocket.0.clone(),
        security: pocket.1.clone(),
        opendatetime: earliest.opentransaction.datetime(),
        opentxid: earliest.opentransaction.uniqueid().clone(),
        units,
        cost,
        currency: earliest.currency.clone(),
        cusip: None,
        isin: None,
        conid: None,
        ticker: None,
    })
}

/// Rebuild a [`Portfolio`] from flattened rows. Each row becomes a single
/// Lot whose `opentransaction`/`createtransaction` are a synthetic
/// [`Transaction::Persisted`] carrying only the identity and date the row
/// preserved — full Lot identity (the original booking transaction) is
/// recovered only when the rows came from a non-consolidated
/// [`flatten_portfolio`] call over a Portfolio with exactly one Lot per row.
pub fn unflatten_portfolio(rows: &[FlatLot]) -> Portfolio {
    let mut portfolio = Portfolio::new();

    for row in rows {
        if row.units.is_zero() {
            continue;
        }

        let tx = Transaction::Persisted {
            uniqueid: row.opentxid.clone(),
            datetime: row.opendatetime,
            settle_date: None,
            account: row.account.clone(),
            security: row.security.clone(),
            currency: Some(row.currency.clone()),
            cash: None,
            security_price: None,
            from_security_price: None,
        };

        let lot = Lot {
            opentransaction: tx.clone(),
            createtransaction: tx,
            units: row.units,
            price: row.cost / row.units,
            currency: row.currency.clone(),
        };

        let pocket = (row.account.clone(), row.security.clone());
        let mut position = portfolio.take_position(&pocket);
        position.push(lot);
        portfolio.set_position(pocket, position);
    }

    portfolio
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::trade::book_trade;
    use crate::sort::SortStrategy;
    use crate::types::Currency as Ccy;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn dt(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    fn trade(uid: &str, when: NaiveDateTime, units: Decimal, cash: Decimal) -> Transaction {
        Transaction::Trade {
            uniqueid: TxId::new(uid),
            datetime: when,
            settle_date: None,
            account: None,
            security: None,
            units,
            cash,
            currency: Ccy::new("USD"),
        }
    }

    #[test]
    fn round_trip_preserves_units_and_cost_per_pocket() {
        let mut portfolio = Portfolio::new();
        book_trade(&trade("a", dt(2020, 1, 1), dec!(100), dec!(-1000)), &mut portfolio, SortStrategy::Fifo).unwrap();
        book_trade(&trade("b", dt(2020, 2, 1), dec!(50), dec!(-600)), &mut portfolio, SortStrategy::Fifo).unwrap();

        let rows = flatten_portfolio(&portfolio, false);
        assert_eq!(rows.len(), 2);

        let rebuilt = unflatten_portfolio(&rows);
        let pocket = (None, None);

        let orig_units: Decimal = portfolio.position(&pocket).iter().map(|l| l.units).sum();
        let orig_cost: Decimal = portfolio.position(&pocket).iter().map(|l| l.cost_basis()).sum();
        let new_units: Decimal = rebuilt.position(&pocket).iter().map(|l| l.units).sum();
        let new_cost: Decimal = rebuilt.position(&pocket).iter().map(|l| l.cost_basis()).sum();

        assert_eq!(orig_units, new_units);
        assert_eq!(orig_cost, new_cost);
    }

    #[test]
    fn consolidate_merges_lots_into_one_row() {
        let mut portfolio = Portfolio::new();
        book_trade(&trade("a", dt(2020, 1, 1), dec!(100), dec!(-1000)), &mut portfolio, SortStrategy::Fifo).unwrap();
        book_trade(&trade("b", dt(2020, 2, 1), dec!(50), dec!(-600)), &mut portfolio, SortStrategy::Fifo).unwrap();

        let rows = flatten_portfolio(&portfolio, true);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].units, dec!(150));
        assert_eq!(rows[0].cost, dec!(1600));
        assert_eq!(rows[0].opentxid.0, "a");
    }

    #[test]
    fn zero_unit_rows_are_dropped() {
        let mut portfolio = Portfolio::new();
        book_trade(&trade("a", dt(2020, 1, 1), dec!(100), dec!(-1000)), &mut portfolio, SortStrategy::Fifo).unwrap();
        book_trade(&trade("b", dt(2020, 2, 1), dec!(-100), dec!(1100)), &mut portfolio, SortStrategy::Fifo).unwrap();

        let rows = flatten_portfolio(&portfolio, false);
        assert!(rows.is_empty());
    }
}
