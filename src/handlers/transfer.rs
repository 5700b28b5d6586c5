//! Move Lots from a source pocket to the transaction's own pocket,
//! preserving each Lot's opening transaction (holding period) and closing
//! any opposite-signed Lots already resident at the destination.

use rust_decimal::Decimal;

use crate::error::{EngineError, Result};
use crate::handlers::{mutate_portfolio, units_tolerance};
use crate::predicate::open_as_of;
use crate::partition::part_units;
use crate::sort::SortStrategy;
use crate::types::{Gain, Portfolio, Transaction};

pub(crate) fn book_transfer(tx: &Transaction, portfolio: &mut Portfolio, sort: SortStrategy) -> Result<Vec<Gain>> {
    let Transaction::Transfer {
        units,
        from_account,
        from_security,
        from_units,
        ..
    } = tx
    else {
        unreachable!("book_transfer called with non-Transfer transaction")
    };

    if *units * *from_units >= Decimal::ZERO {
        return Err(EngineError::value(format!(
            "units and from_units aren't oppositely signed: {tx:?}"
        )));
    }

    let source_pocket = (from_account.clone(), from_security.clone());
    let source_position = portfolio.take_position(&source_pocket);
    if source_position.is_empty() {
        return Err(EngineError::inconsistent(
            tx.uniqueid(),
            format!("no position in {source_pocket:?}"),
        ));
    }

    let (lots_removed, source_remaining) = match part_units(&source_position, open_as_of(tx.datetime()), Some(-*from_units)) {
        Ok(split) => split,
        Err(msg) => {
            portfolio.set_position(source_pocket, source_position);
            return Err(EngineError::inconsistent(tx.uniqueid(), msg));
        }
    };

    let units_removed: Decimal = lots_removed.iter().map(|lot| lot.units).sum();
    if (units_removed + *from_units).abs() > units_tolerance() {
        portfolio.set_position(source_pocket, source_position);
        return Err(EngineError::inconsistent(
            tx.uniqueid(),
            format!("position in {source_pocket:?} is only {units_removed} units; can't transfer out {from_units} units"),
        ));
    }

    portfolio.set_position(source_pocket, source_remaining);

    let transfer_ratio = -*units / *from_units;
    let destination = tx.pocket();

    let mut gains = Vec::new();
    for lot in lots_removed {
        let closed = mutate_portfolio(
            portfolio,
            destination.clone(),
            tx,
            lot.units * transfer_ratio,
            -lot.price * lot.units,
            lot.currency.clone(),
            Some(&lot.opentransaction),
            sort,
        )?;
        gains.extend(closed);
    }

    Ok(gains)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Currency, TxId};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn dt(y: i32, m: u32, d: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    fn trade(uid: &str, account: Option<&str>, when: chrono::NaiveDateTime, units: Decimal, cash: Decimal) -> Transaction {
        Transaction::Trade {
            uniqueid: TxId::new(uid),
            datetime: when,
            settle_date: None,
            account: account.map(String::from),
            security: None,
            units,
            cash,
            currency: Currency::new("USD"),
        }
    }

    fn transfer_tx(
        uid: &str,
        when: chrono::NaiveDateTime,
        account: Option<&str>,
        units: Decimal,
        from_account: Option<&str>,
        from_units: Decimal,
    ) -> Transaction {
        Transaction::Transfer {
            uniqueid: TxId::new(uid),
            datetime: when,
            settle_date: None,
            account: account.map(String::from),
            security: None,
            units,
            from_account: from_account.map(String::from),
            from_security: None,
            from_units,
        }
    }

    #[test]
    fn plain_transfer_preserves_holding_period_and_basis() {
        let mut portfolio = Portfolio::new();
        crate::handlers::trade::book_trade(
            &trade("buy", Some("broker-a"), dt(2018, 1, 1), dec!(100), dec!(-1000)),
            &mut portfolio,
            SortStrategy::Fifo,
        )
        .unwrap();

        let xfer = transfer_tx("xfer", dt(2020, 1, 1), Some("broker-b"), dec!(100), Some("broker-a"), dec!(-100));
        let gains = book_transfer(&xfer, &mut portfolio, SortStrategy::Fifo).unwrap();
        assert!(gains.is_empty());

        assert!(portfolio.position(&(Some("broker-a".into()), None)).is_empty());
        let dest = portfolio.position(&(Some("broker-b".into()), None));
        assert_eq!(dest.len(), 1);
        assert_eq!(dest[0].units, dec!(100));
        assert_eq!(dest[0].price, dec!(10));
        assert_eq!(dest[0].opentransaction.uniqueid().0, "buy");
    }

    #[test]
    fn transfer_closing_opposite_signed_destination_position() {
        let mut portfolio = Portfolio::new();
        crate::handlers::trade::book_trade(
            &trade("buy-a", Some("broker-a"), dt(2018, 1, 1), dec!(100), dec!(-1000)),
            &mut portfolio,
            SortStrategy::Fifo,
        )
        .unwrap();
        // destination already has a short position of the same security
        crate::handlers::trade::book_trade(
            &trade("short-b", Some("broker-b"), dt(2019, 1, 1), dec!(-100), dec!(1200)),
            &mut portfolio,
            SortStrategy::Fifo,
        )
        .unwrap();

        let xfer = transfer_tx("xfer", dt(2020, 1, 1), Some("broker-b"), dec!(100), Some("broker-a"), dec!(-100));
        let gains = book_transfer(&xfer, &mut portfolio, SortStrategy::Fifo).unwrap();

        assert_eq!(gains.len(), 1);
        assert_eq!(gains[0].lot.units, dec!(-100));
        assert_eq!(gains[0].price, dec!(10));
        assert!(portfolio.position(&(Some("broker-b".into()), None)).is_empty());
    }

    #[test]
    fn same_sign_units_is_a_value_error() {
        let mut portfolio = Portfolio::new();
        let bad = transfer_tx("bad", dt(2020, 1, 1), Some("b"), dec!(100), Some("a"), dec!(100));
        assert!(matches!(book_transfer(&bad, &mut portfolio, SortStrategy::Fifo), Err(EngineError::Value(_))));
    }
}
