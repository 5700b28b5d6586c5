//! Option/warrant exercise: consumes contracts from a source pocket and
//! opens Lots of the underlying security at strike-adjusted basis.
//!
//! Unlike Transfer and Spinoff, the new underlying Lots' holding period
//! starts at the exercise itself (no `opentransaction` override).

use rust_decimal::Decimal;

use crate::error::{EngineError, Result};
use crate::handlers::{mutate_portfolio, units_tolerance};
use crate::partition::part_units;
use crate::predicate::open_as_of;
use crate::sort::SortStrategy;
use crate::types::{Gain, Portfolio, Transaction};

pub(crate) fn book_exercise(tx: &Transaction, portfolio: &mut Portfolio, sort: SortStrategy) -> Result<Vec<Gain>> {
    let Transaction::Exercise {
        account,
        units,
        from_security,
        from_units,
        cash,
        ..
    } = tx
    else {
        unreachable!("book_exercise called with non-Exercise transaction")
    };

    if from_units.is_zero() {
        return Err(EngineError::value(format!("from_units can't be zero: {tx:?}")));
    }

    let source_pocket = (account.clone(), from_security.clone());
    let source_position = portfolio.take_position(&source_pocket);

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
            format!("exercised Lot.units={units_removed} (not {from_units})"),
        ));
    }

    portfolio.set_position(source_pocket, source_remaining);

    let multiplier = (units / from_units).abs();
    let strike_price = (cash / units).abs();
    let destination = tx.pocket();

    let mut gains = Vec::new();
    for lot in lots_removed {
        let exercise_cash = (lot.price * -lot.units) + (lot.units * multiplier * strike_price);
        let closed = mutate_portfolio(
            portfolio,
            destination.clone(),
            tx,
            lot.units * multiplier,
            exercise_cash,
            lot.currency.clone(),
            None,
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

    fn trade(uid: &str, security: Option<&str>, when: chrono::NaiveDateTime, units: Decimal, cash: Decimal) -> Transaction {
        Transaction::Trade {
            uniqueid: TxId::new(uid),
            datetime: when,
            settle_date: None,
            account: None,
            security: security.map(String::from),
            units,
            cash,
            currency: Currency::new("USD"),
        }
    }

    fn exercise_tx(
        uid: &str,
        when: chrono::NaiveDateTime,
        security: Option<&str>,
        units: Decimal,
        from_security: Option<&str>,
        from_units: Decimal,
        cash: Decimal,
    ) -> Transaction {
        Transaction::Exercise {
            uniqueid: TxId::new(uid),
            datetime: when,
            settle_date: None,
            account: None,
            security: security.map(String::from),
            units,
            from_security: from_security.map(String::from),
            from_units,
            cash,
        }
    }

    #[test]
    fn exercise_consumes_contracts_and_opens_underlying_lot() {
        let mut portfolio = Portfolio::new();
        // bought 10 call contracts (each worth 100 shares) for 500 total premium
        crate::handlers::trade::book_trade(
            &trade("buy-calls", Some("XYZ 2020 CALL"), dt(2019, 1, 1), dec!(10), dec!(-500)),
            &mut portfolio,
            SortStrategy::Fifo,
        )
        .unwrap();

        // exercise all 10 contracts for 1000 underlying shares at strike $20 = $20000
        let ex = exercise_tx(
            "exercise",
            dt(2020, 1, 1),
            Some("XYZ"),
            dec!(1000),
            Some("XYZ 2020 CALL"),
            dec!(-10),
            dec!(-20000),
        );
        let gains = book_exercise(&ex, &mut portfolio, SortStrategy::Fifo).unwrap();
        assert!(gains.is_empty());

        assert!(portfolio.position(&(None, Some("XYZ 2020 CALL".into()))).is_empty());
        let underlying = portfolio.position(&(None, Some("XYZ".into())));
        assert_eq!(underlying.len(), 1);
        assert_eq!(underlying[0].units, dec!(1000));
        assert_eq!(underlying[0].price, dec!(19.5));
    }

    #[test]
    fn insufficient_contracts_is_inconsistent() {
        let mut portfolio = Portfolio::new();
        crate::handlers::trade::book_trade(
            &trade("buy-calls", Some("XYZ 2020 CALL"), dt(2019, 1, 1), dec!(5), dec!(-250)),
            &mut portfolio,
            SortStrategy::Fifo,
        )
        .unwrap();

        let ex = exercise_tx(
            "exercise",
            dt(2020, 1, 1),
            Some("XYZ"),
            dec!(1000),
            Some("XYZ 2020 CALL"),
            dec!(-10),
            dec!(-20000),
        );
        assert!(matches!(book_exercise(&ex, &mut portfolio, SortStrategy::Fifo), Err(EngineError::Inconsistent { .. })));
    }
}
