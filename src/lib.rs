//! `lotbook`: a deterministic tax-lot inventory engine.
//!
//! Applies a chronologically ordered stream of securities transactions to a
//! [`Portfolio`] of immutable tax lots, matching opening acquisitions
//! against closing dispositions under a pluggable gain-selection ordering
//! ([`SortStrategy`]), and translates the resulting [`Gain`]s into a
//! reporting currency.
//!
//! Statement parsing, persistence, currency-rate lookup, and CLI/serialization
//! front-ends are out of scope: this crate exposes only the [`RateProvider`]
//! trait as that boundary, and plain `serde`-derived structs
//! ([`GainReport`], [`FlatLot`]) for a caller to hand to whatever
//! serialization backend it likes.
//!
//! ```
//! use chrono::NaiveDate;
//! use rust_decimal_macros::dec;
//! use lotbook::{book, Currency, Portfolio, SortStrategy, Transaction, TxId};
//!
//! let mut portfolio = Portfolio::new();
//! let buy = Transaction::Trade {
//!     uniqueid: TxId::new("buy-1"),
//!     datetime: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap(),
//!     settle_date: None,
//!     account: None,
//!     security: None,
//!     units: dec!(100),
//!     cash: dec!(-1000),
//!     currency: Currency::new("USD"),
//! };
//! let gains = book(&buy, &mut portfolio, Some(SortStrategy::Fifo)).unwrap();
//! assert!(gains.is_empty());
//! assert_eq!(portfolio.position(&(None, None))[0].units, dec!(100));
//! ```

mod error;
mod flatten;
mod handlers;
mod partition;
mod predicate;
mod report;
mod sort;
mod types;

pub use error::{EngineError, Result};
pub use flatten::{flatten_portfolio, unflatten_portfolio, FlatLot};
pub use handlers::book;
pub use partition::{part_basis, part_units};
pub use predicate::{closable_by, long_as_of, open_as_of};
pub use report::{report_gain, FixedRateProvider, GainReport, RateProvider, ReportConfig};
pub use sort::SortStrategy;
pub use types::{
    Account, Currency, Gain, Lot, Pocket, Portfolio, Position, Security, Transaction, TxId,
};
