//! Pure functions that split a position into (taken, remaining) under a
//! predicate and an optional cap. Neither touches the Portfolio nor sorts;
//! callers sort the position first so these walk it in closing order.

use rust_decimal::Decimal;

use crate::types::Lot;

/// Walk `position` in its current order, routing each Lot to `taken` or
/// `remaining` per `predicate`, consuming at most `max_units` (signed, same
/// sign as the Lots being taken) across all taken Lots. `None` takes every
/// matching Lot in full.
///
/// Preserves the sum of `units` across (taken ++ remaining) and the original
/// position (split lots sum back to their parent).
///
/// # Errors
/// Returns `Err` if a predicate-matched Lot's sign is opposite `max_units`'s
/// sign — the predicate selected a Lot incompatible with the requested cap.
pub fn part_units(
    position: &[Lot],
    predicate: impl Fn(&Lot) -> bool,
    max_units: Option<Decimal>,
) -> Result<(Vec<Lot>, Vec<Lot>), String> {
    let mut taken = Vec::new();
    let mut remaining = Vec::new();
    let mut cap = max_units;

    for lot in position {
        if !predicate(lot) {
            remaining.push(lot.clone());
            continue;
        }

        match cap {
            None => taken.push(lot.clone()),
            Some(c) if c.is_zero() => remaining.push(lot.clone()),
            Some(c) => {
                if lot.units * c <= Decimal::ZERO {
                    return Err(format!(
                        "remaining cap {c} and lot.units {} must have the same sign",
                        lot.units
                    ));
                }
                if lot.units.abs() <= c.abs() {
                    cap = Some(c - lot.units);
                    taken.push(lot.clone());
                } else {
                    taken.push(lot.with_units(c));
                    remaining.push(lot.with_units(lot.units - c));
                    cap = Some(Decimal::ZERO);
                }
            }
        }
    }

    Ok((taken, remaining))
}

/// For each Lot matching `predicate`, split it into two Lots with identical
/// `units` and `opentransaction`: one with `price = original * fraction`
/// (taken), one with `price = original * (1 - fraction)` (remaining).
/// Non-matching Lots pass through to `remaining` unchanged.
///
/// # Errors
/// Returns `Err` if `fraction` isn't in `[0, 1]`.
pub fn part_basis(
    position: &[Lot],
    predicate: impl Fn(&Lot) -> bool,
    fraction: Decimal,
) -> Result<(Vec<Lot>, Vec<Lot>), String> {
    if !(Decimal::ZERO..=Decimal::ONE).contains(&fraction) {
        return Err(format!("fraction must be between 0 and 1 (inclusive), not {fraction}"));
    }

    let mut taken = Vec::new();
    let mut remaining = Vec::new();

    for lot in position {
        if predicate(lot) {
            let taken_price = lot.price * fraction;
            taken.push(lot.with_price(taken_price));
            remaining.push(lot.with_price(lot.price - taken_price));
        } else {
            remaining.push(lot.clone());
        }
    }

    Ok((taken, remaining))
}
