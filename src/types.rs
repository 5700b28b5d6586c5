//! Value types: transactions, lots, gains, and the portfolio mapping.
//!
//! Everything here is immutable and cheap to clone. Lots and Gains are
//! replaced wholesale, never mutated in place, so references held by a
//! previously-emitted `Gain` stay valid forever (spec invariant: a Gain's
//! lot snapshot never changes after the fact).

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// ISO 4217 currency code, e.g. "USD".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Currency(pub String);

impl Currency {
    pub fn new(code: impl Into<String>) -> Self {
        Currency(code.into())
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Currency {
    fn from(s: &str) -> Self {
        Currency::new(s)
    }
}

/// Brokerage-scoped unique transaction identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TxId(pub String);

impl TxId {
    pub fn new(id: impl Into<String>) -> Self {
        TxId(id.into())
    }
}

impl std::fmt::Display for TxId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TxId {
    fn from(s: &str) -> Self {
        TxId::new(s)
    }
}

/// Financial-institution account; `None` is the single-account "default" pocket.
pub type Account = Option<String>;
/// Security identifier; `None` is a placeholder pocket used in single-security tests.
pub type Security = Option<String>;
/// The key into a [`Portfolio`]: `(account, security)`.
pub type Pocket = (Account, Security);

/// One of the six bookable transaction shapes, plus an opaque `Persisted`
/// variant for a transaction whose concrete originating shape isn't known to
/// the caller, used only for report translation. `book()` rejects
/// `Persisted` transactions: they can be translated for reporting but never
/// applied to a `Portfolio`.
#[derive(Debug, Clone, PartialEq)]
pub enum Transaction {
    Trade {
        uniqueid: TxId,
        datetime: NaiveDateTime,
        settle_date: Option<NaiveDate>,
        account: Account,
        security: Security,
        units: Decimal,
        cash: Decimal,
        currency: Currency,
    },
    ReturnOfCapital {
        uniqueid: TxId,
        datetime: NaiveDateTime,
        settle_date: Option<NaiveDate>,
        account: Account,
        security: Security,
        cash: Decimal,
        currency: Currency,
    },
    Split {
        uniqueid: TxId,
        datetime: NaiveDateTime,
        settle_date: Option<NaiveDate>,
        account: Account,
        security: Security,
        numerator: Decimal,
        denominator: Decimal,
        units: Decimal,
    },
    Transfer {
        uniqueid: TxId,
        datetime: NaiveDateTime,
        settle_date: Option<NaiveDate>,
        account: Account,
        security: Security,
        units: Decimal,
        from_account: Account,
        from_security: Security,
        from_units: Decimal,
    },
    Spinoff {
        uniqueid: TxId,
        datetime: NaiveDateTime,
        settle_date: Option<NaiveDate>,
        account: Account,
        security: Security,
        units: Decimal,
        numerator: Decimal,
        denominator: Decimal,
        from_security: Security,
        security_price: Option<Decimal>,
        from_security_price: Option<Decimal>,
    },
    Exercise {
        uniqueid: TxId,
        datetime: NaiveDateTime,
        settle_date: Option<NaiveDate>,
        account: Account,
        security: Security,
        units: Decimal,
        from_security: Security,
        from_units: Decimal,
        cash: Decimal,
    },
    /// Opaque, already-serialized transaction, used only as a `Gain.transaction`
    /// or `Lot.opentransaction` stand-in during report translation when the
    /// originating variant isn't known to the caller. Never booked.
    Persisted {
        uniqueid: TxId,
        datetime: NaiveDateTime,
        settle_date: Option<NaiveDate>,
        account: Account,
        security: Security,
        currency: Option<Currency>,
        cash: Option<Decimal>,
        security_price: Option<Decimal>,
        from_security_price: Option<Decimal>,
    },
}

impl Transaction {
    pub fn uniqueid(&self) -> &TxId {
        match self {
            Transaction::Trade { uniqueid, .. }
            | Transaction::ReturnOfCapital { uniqueid, .. }
            | Transaction::Split { uniqueid, .. }
            | Transaction::Transfer { uniqueid, .. }
            | Transaction::Spinoff { uniqueid, .. }
            | Transaction::Exercise { uniqueid, .. }
            | Transaction::Persisted { uniqueid, .. } => uniqueid,
        }
    }

    pub fn datetime(&self) -> NaiveDateTime {
        match self {
            Transaction::Trade { datetime, .. }
            | Transaction::ReturnOfCapital { datetime, .. }
            | Transaction::Split { datetime, .. }
            | Transaction::Transfer { datetime, .. }
            | Transaction::Spinoff { datetime, .. }
            | Transaction::Exercise { datetime, .. }
            | Transaction::Persisted { datetime, .. } => *datetime,
        }
    }

    /// Settlement date, defaulting to the transaction's own date when absent.
    pub fn settle_date(&self) -> NaiveDate {
        let (settle, datetime) = match self {
            Transaction::Trade {
                settle_date,
                datetime,
                ..
            }
            | Transaction::ReturnOfCapital {
                settle_date,
                datetime,
                ..
            }
            | Transaction::Split {
                settle_date,
                datetime,
                ..
            }
            | Transaction::Transfer {
                settle_date,
                datetime,
                ..
            }
            | Transaction::Spinoff {
                settle_date,
                datetime,
                ..
            }
            | Transaction::Exercise {
                settle_date,
                datetime,
                ..
            }
            | Transaction::Persisted {
                settle_date,
                datetime,
                ..
            } => (*settle_date, *datetime),
        };
        settle.unwrap_or(datetime.date())
    }

    pub fn account(&self) -> &Account {
        match self {
            Transaction::Trade { account, .. }
            | Transaction::ReturnOfCapital { account, .. }
            | Transaction::Split { account, .. }
            | Transaction::Transfer { account, .. }
            | Transaction::Spinoff { account, .. }
            | Transaction::Exercise { account, .. }
            | Transaction::Persisted { account, .. } => account,
        }
    }

    pub fn security(&self) -> &Security {
        match self {
            Transaction::Trade { security, .. }
            | Transaction::ReturnOfCapital { security, .. }
            | Transaction::Split { security, .. }
            | Transaction::Transfer { security, .. }
            | Transaction::Spinoff { security, .. }
            | Transaction::Exercise { security, .. }
            | Transaction::Persisted { security, .. } => security,
        }
    }

    pub(crate) fn pocket(&self) -> Pocket {
        (self.account().clone(), self.security().clone())
    }

    /// The currency denominating this transaction's cash/price fields, when
    /// it carries one. `Split` and `Transfer` move units without a cash leg
    /// of their own and return `None`; `Exercise` folds option premium into
    /// the destination Lot's currency rather than carrying its own.
    pub fn currency(&self) -> Option<Currency> {
        match self {
            Transaction::Trade { currency, .. } | Transaction::ReturnOfCapital { currency, .. } => {
                Some(currency.clone())
            }
            Transaction::Split { .. } | Transaction::Transfer { .. } | Transaction::Exercise { .. } => None,
            Transaction::Spinoff { .. } => None,
            Transaction::Persisted { currency, .. } => currency.clone(),
        }
    }

    /// Returns a copy with this transaction's cash/price fields scaled by
    /// `rate` and re-denominated into `functional`, per the per-variant
    /// translation table. `Split` and `Transfer` pass through unchanged;
    /// they carry no cash leg to translate.
    pub fn translated(&self, rate: Decimal, functional: &Currency) -> Transaction {
        match self {
            Transaction::Trade { cash, .. } | Transaction::ReturnOfCapital { cash, .. } => {
                let mut out = self.clone();
                match &mut out {
                    Transaction::Trade { cash: c, currency: cur, .. }
                    | Transaction::ReturnOfCapital { cash: c, currency: cur, .. } => {
                        *c = cash * rate;
                        *cur = functional.clone();
                    }
                    _ => unreachable!(),
                }
                out
            }
            Transaction::Exercise { cash, .. } => {
                let mut out = self.clone();
                if let Transaction::Exercise { cash: c, .. } = &mut out {
                    *c = cash * rate;
                }
                out
            }
            Transaction::Spinoff {
                security_price,
                from_security_price,
                ..
            } => {
                let mut out = self.clone();
                if let Transaction::Spinoff {
                    security_price: sp,
                    from_security_price: fsp,
                    ..
                } = &mut out
                {
                    *sp = security_price.map(|p| p * rate);
                    *fsp = from_security_price.map(|p| p * rate);
                }
                out
            }
            Transaction::Split { .. } | Transaction::Transfer { .. } => self.clone(),
            Transaction::Persisted {
                cash,
                security_price,
                from_security_price,
                ..
            } => {
                let mut out = self.clone();
                if let Transaction::Persisted {
                    cash: c,
                    security_price: sp,
                    from_security_price: fsp,
                    currency: cur,
                    ..
                } = &mut out
                {
                    *c = cash.map(|v| v * rate);
                    *sp = security_price.map(|p| p * rate);
                    *fsp = from_security_price.map(|p| p * rate);
                    *cur = Some(functional.clone());
                }
                out
            }
        }
    }
}

/// Cost basis / holding-period record: one "bunch" of units bought or
/// received together. Immutable; replaced wholesale by every transform.
#[derive(Debug, Clone, PartialEq)]
pub struct Lot {
    /// Transaction that began the tax holding period.
    pub opentransaction: Transaction,
    /// Transaction that placed this Lot in its current pocket.
    pub createtransaction: Transaction,
    /// Nonzero; sign determines long (positive) vs short (negative).
    pub units: Decimal,
    /// Per-unit cost, same currency as `currency`, >= 0.
    pub price: Decimal,
    pub currency: Currency,
}

impl Lot {
    pub fn with_units(&self, units: Decimal) -> Self {
        Lot {
            units,
            ..self.clone()
        }
    }

    pub fn with_price(&self, price: Decimal) -> Self {
        Lot {
            price,
            ..self.clone()
        }
    }

    pub(crate) fn cost_basis(&self) -> Decimal {
        self.units * self.price
    }
}

/// A closure event: a closed Lot bound to the realizing transaction and the
/// per-unit realization price.
#[derive(Debug, Clone, PartialEq)]
pub struct Gain {
    pub lot: Lot,
    pub transaction: Transaction,
    pub price: Decimal,
    /// Reserved for a future wash-sale disallowance pass. Always `None`.
    pub disallowed: Option<bool>,
}

impl Gain {
    pub(crate) fn new(lot: Lot, transaction: Transaction, price: Decimal) -> Self {
        Gain {
            lot,
            transaction,
            price,
            disallowed: None,
        }
    }

    pub fn proceeds(&self) -> Decimal {
        self.lot.units * self.price
    }

    pub fn cost(&self) -> Decimal {
        self.lot.cost_basis()
    }

    pub fn profit(&self) -> Decimal {
        self.proceeds() - self.cost()
    }
}

/// Ordered sequence of Lots held in one pocket.
pub type Position = Vec<Lot>;

/// Mapping `(account, security) -> Position`; the engine's sole mutable state.
#[derive(Debug, Clone, Default)]
pub struct Portfolio {
    positions: HashMap<Pocket, Position>,
}

impl Portfolio {
    pub fn new() -> Self {
        Portfolio {
            positions: HashMap::new(),
        }
    }

    pub fn position(&self, pocket: &Pocket) -> &[Lot] {
        self.positions
            .get(pocket)
            .map(|p| p.as_slice())
            .unwrap_or(&[])
    }

    pub(crate) fn take_position(&mut self, pocket: &Pocket) -> Position {
        self.positions.remove(pocket).unwrap_or_default()
    }

    pub(crate) fn set_position(&mut self, pocket: Pocket, position: Position) {
        if position.is_empty() {
            self.positions.remove(&pocket);
        } else {
            self.positions.insert(pocket, position);
        }
    }

    pub fn pockets(&self) -> impl Iterator<Item = &Pocket> {
        self.positions.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Pocket, &Position)> {
        self.positions.iter()
    }
}
