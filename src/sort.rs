//! Closed set of gain-selection orderings. Deliberately not a free-form
//! callable taken from callers — a small enum keeps outcomes deterministic
//! and comparable across runs.

use crate::types::{Lot, TxId};

/// Named ordering under which a Position is sorted before closing Lots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortStrategy {
    /// Oldest holding period closed first.
    #[default]
    Fifo,
    /// Newest holding period closed first.
    Lifo,
    /// Highest-cost lot closed first (minimizes realized gain).
    MinGain,
    /// Lowest-cost lot closed first (maximizes realized gain).
    MaxGain,
}

impl SortStrategy {
    fn key(self, lot: &Lot) -> (SortKey, &TxId) {
        let opentxid = lot.opentransaction.uniqueid();
        match self {
            SortStrategy::Fifo | SortStrategy::Lifo => {
                (SortKey::DateTime(lot.opentransaction.datetime()), opentxid)
            }
            SortStrategy::MinGain => (SortKey::Price(-lot.price), opentxid),
            SortStrategy::MaxGain => (SortKey::Price(lot.price), opentxid),
        }
    }

    fn reverse(self) -> bool {
        matches!(self, SortStrategy::Lifo)
    }

    /// Sort `position` in place under this strategy. Stable over the
    /// secondary key (opening transaction id) so ties are deterministic.
    pub fn sort(self, position: &mut [Lot]) {
        position.sort_by(|a, b| {
            let ord = self.key(a).cmp(&self.key(b));
            if self.reverse() {
                ord.reverse()
            } else {
                ord
            }
        });
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum SortKey {
    DateTime(chrono::NaiveDateTime),
    Price(rust_decimal::Decimal),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Currency, Transaction};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn dt(y: i32, m: u32, d: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    fn make_lot(uid: &str, when: chrono::NaiveDateTime, price: rust_decimal::Decimal) -> Lot {
        let tx = Transaction::Trade {
            uniqueid: TxId::new(uid),
            datetime: when,
            settle_date: None,
            account: None,
            security: None,
            units: dec!(100),
            cash: dec!(-1000),
            currency: Currency::new("USD"),
        };
        Lot {
            opentransaction: tx.clone(),
            createtransaction: tx,
            units: dec!(100),
            price,
            currency: Currency::new("USD"),
        }
    }

    #[test]
    fn fifo_orders_oldest_first() {
        let mut position = vec![
            make_lot("b", dt(2020, 2, 1), dec!(10)),
            make_lot("a", dt(2020, 1, 1), dec!(10)),
        ];
        SortStrategy::Fifo.sort(&mut position);
        assert_eq!(position[0].opentransaction.uniqueid().0, "a");
    }

    #[test]
    fn lifo_orders_newest_first() {
        let mut position = vec![
            make_lot("a", dt(2020, 1, 1), dec!(10)),
            make_lot("b", dt(2020, 2, 1), dec!(10)),
        ];
        SortStrategy::Lifo.sort(&mut position);
        assert_eq!(position[0].opentransaction.uniqueid().0, "b");
    }

    #[test]
    fn mingain_orders_dearest_first() {
        let mut position = vec![
            make_lot("cheap", dt(2020, 1, 1), dec!(5)),
            make_lot("dear", dt(2020, 1, 2), dec!(15)),
        ];
        SortStrategy::MinGain.sort(&mut position);
        assert_eq!(position[0].opentransaction.uniqueid().0, "dear");
    }

    #[test]
    fn maxgain_orders_cheapest_first() {
        let mut position = vec![
            make_lot("dear", dt(2020, 1, 1), dec!(15)),
            make_lot("cheap", dt(2020, 1, 2), dec!(5)),
        ];
        SortStrategy::MaxGain.sort(&mut position);
        assert_eq!(position[0].opentransaction.uniqueid().0, "cheap");
    }

    #[test]
    fn ties_break_on_opening_txid() {
        let mut position = vec![
            make_lot("z", dt(2020, 1, 1), dec!(10)),
            make_lot("a", dt(2020, 1, 1), dec!(10)),
        ];
        SortStrategy::Fifo.sort(&mut position);
        assert_eq!(position[0].opentransaction.uniqueid().0, "a");
    }
}
