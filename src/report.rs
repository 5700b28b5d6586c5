//! Currency translation of realized gains for reporting.
//!
//! Rate lookup itself is supplied by the caller through [`RateProvider`];
//! this module only does the arithmetic and field-selection dance of the
//! per-variant translation table, mirroring a `CapitalGain`/`long_term`
//! split with an added currency leg for gains whose lot and realizing
//! transaction aren't denominated alike.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{Account, Currency, Gain, Security, TxId};

/// The long-term holding-period threshold: strictly 366 days or more.
const LONG_TERM_DAYS: i64 = 366;

/// Looks up a currency-conversion rate for a settlement date. Implementations
/// must be pure with respect to `(from, to, settle)` — the engine calls this
/// only from [`report_gain`], never from a transaction handler.
pub trait RateProvider {
    fn rate(&self, from: &Currency, to: &Currency, settle: NaiveDate) -> Result<Decimal>;
}

/// The one recognized reporting option: the currency every [`Gain`] is
/// translated into. Passed explicitly rather than read from a process-wide
/// singleton, so pure translation code never reaches for global config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportConfig {
    pub functional_currency: Currency,
}

impl ReportConfig {
    pub fn new(functional_currency: impl Into<Currency>) -> Self {
        ReportConfig {
            functional_currency: functional_currency.into(),
        }
    }
}

/// A realized gain translated into the functional currency, flattened to
/// scalar fields so it serializes cleanly for a caller's CLI or persistence
/// front-end (out of scope here).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GainReport {
    pub account: Account,
    pub security: Security,
    pub open_uniqueid: TxId,
    pub open_datetime: chrono::NaiveDateTime,
    pub gain_uniqueid: TxId,
    pub gain_datetime: chrono::NaiveDateTime,
    pub units: Decimal,
    pub currency: Currency,
    pub cost: Decimal,
    pub proceeds: Decimal,
    pub longterm: bool,
}

impl GainReport {
    pub fn profit(&self) -> Decimal {
        self.proceeds - self.cost
    }
}

/// Translate `gain` into `config.functional_currency`, producing a
/// self-contained report row.
///
/// Two independent translation legs:
/// 1. If the Lot's currency isn't functional, rate-lookup on the opening
///    transaction's settle date and translate the Lot's cost basis.
/// 2. If the realizing transaction's currency isn't functional, rate-lookup
///    on *its* settle date and translate the realization price.
///
/// A Lot and its realizing transaction can be denominated differently (e.g.
/// a GBP Lot closed by a USD trade after an intervening transfer), so the
/// two legs use independent rates rather than a single portfolio-wide one.
pub fn report_gain(rates: &dyn RateProvider, config: &ReportConfig, gain: &Gain) -> Result<GainReport> {
    let functional = &config.functional_currency;
    let lot = &gain.lot;

    let (lot_price, opening_tx) = if lot.currency != *functional {
        let rate = rates.rate(&lot.currency, functional, lot.opentransaction.settle_date())?;
        (lot.price * rate, lot.opentransaction.translated(rate, functional))
    } else {
        (lot.price, lot.opentransaction.clone())
    };

    let tx_currency = gain.transaction.currency().unwrap_or_else(|| lot.currency.clone());
    let (gain_price, gain_tx) = if tx_currency != *functional {
        let rate = rates.rate(&tx_currency, functional, gain.transaction.settle_date())?;
        (gain.price * rate, gain.transaction.translated(rate, functional))
    } else {
        (gain.price, gain.transaction.clone())
    };

    let longterm = lot.units > Decimal::ZERO
        && (gain.transaction.datetime().date() - lot.opentransaction.datetime().date()).num_days() >= LONG_TERM_DAYS;

    Ok(GainReport {
        account: gain.transaction.account().clone(),
        security: gain.transaction.security().clone(),
        open_uniqueid: opening_tx.uniqueid().clone(),
        open_datetime: opening_tx.datetime(),
        gain_uniqueid: gain_tx.uniqueid().clone(),
        gain_datetime: gain_tx.datetime(),
        units: lot.units,
        currency: functional.clone(),
        cost: lot.units * lot_price,
        proceeds: lot.units * gain_price,
        longterm,
    })
}

/// Constant-table rate lookup for tests and doctests. Production rate
/// lookup (a persistence-backed service) is the caller's job.
#[derive(Debug, Clone, Default)]
pub struct FixedRateProvider {
    rates: std::collections::HashMap<(Currency, Currency), Decimal>,
}

impl FixedRateProvider {
    pub fn new() -> Self {
        FixedRateProvider::default()
    }

    pub fn with_rate(mut self, from: impl Into<Currency>, to: impl Into<Currency>, rate: Decimal) -> Self {
        self.rates.insert((from.into(), to.into()), rate);
        self
    }
}

impl RateProvider for FixedRateProvider {
    fn rate(&self, from: &Currency, to: &Currency, _settle: NaiveDate) -> Result<Decimal> {
        if from == to {
            return Ok(Decimal::ONE);
        }
        self.rates
            .get(&(from.clone(), to.clone()))
            .copied()
            .ok_or_else(|| crate::error::EngineError::value(format!("no rate from {from} to {to}")))
    }
}
