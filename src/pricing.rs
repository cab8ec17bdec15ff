//! Pure cart pricing: subtotal, shipping weight, shipping charge, COD charge.
//!
//! Everything here operates on already-loaded data and exact decimals; the
//! service layer is responsible for resolving districts, zones, and rate rows
//! into a [`RateTable`] before calling in.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use utoipa::ToSchema;

use crate::models::PaymentMethod;

/// One cart line, flattened for pricing. `weight_kg` is already resolved
/// (variant weight, falling back to product weight, falling back to zero).
#[derive(Debug, Clone)]
pub struct PricedLine {
    pub unit_price: Decimal,
    pub quantity: i32,
    pub weight_kg: Decimal,
    pub free_shipping: bool,
}

/// The two weight-tier rates the cart formula consumes for a zone:
/// a flat fee covering [0, 1) kg and a per-kg rate for [1, ∞) kg.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateTable {
    pub base_fee: Option<Decimal>,
    pub extra_per_kg: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CartQuote {
    pub subtotal: Decimal,
    pub shipping_charge: Decimal,
    pub cod_charge: Decimal,
    pub grand_total: Decimal,
}

/// Quantize a monetary amount to 2 decimal places, rounding half up at the
/// cent boundary.
pub fn quantize(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Subtotal over all lines, free-shipping ones included.
pub fn subtotal(lines: &[PricedLine]) -> Decimal {
    quantize(lines.iter().map(line_total).sum())
}

fn line_total(line: &PricedLine) -> Decimal {
    line.unit_price * Decimal::from(line.quantity)
}

/// Total shipping weight in kg over chargeable (non-free-shipping) lines.
pub fn chargeable_weight(lines: &[PricedLine]) -> Decimal {
    lines
        .iter()
        .filter(|line| !line.free_shipping)
        .map(|line| line.weight_kg * Decimal::from(line.quantity))
        .sum()
}

fn chargeable_subtotal(lines: &[PricedLine]) -> Decimal {
    lines
        .iter()
        .filter(|line| !line.free_shipping)
        .map(line_total)
        .sum()
}

/// Shipping charge for a given chargeable weight.
///
/// The base tier's `rate_per_kg` is a flat fee for the whole first kilogram.
/// Weight above 1 kg bills in whole-kg increments at the extra tier's per-kg
/// rate; partial kilograms round up so couriers are never undercharged.
/// Missing configuration (no rate table, no base tier) degrades to zero.
pub fn shipping_charge(weight: Decimal, rates: Option<&RateTable>) -> Decimal {
    let Some(rates) = rates else {
        return Decimal::ZERO;
    };
    if weight <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let Some(base_fee) = rates.base_fee else {
        return Decimal::ZERO;
    };

    let mut charge = base_fee;
    if weight > Decimal::ONE {
        if let Some(extra_per_kg) = rates.extra_per_kg {
            let extra_kg = (weight - Decimal::ONE).ceil();
            charge += extra_kg * extra_per_kg;
        }
    }
    quantize(charge)
}

/// Cash-on-delivery surcharge: 1% of the chargeable-items subtotal, only for
/// COD payments. Held on the order for the merchant's books; not added to the
/// customer-facing total.
pub fn cod_charge(lines: &[PricedLine], method: PaymentMethod) -> Decimal {
    if !method.is_cod() {
        return Decimal::ZERO;
    }
    quantize(chargeable_subtotal(lines) * Decimal::new(1, 2))
}

/// Full breakdown for a cart. `grand_total = subtotal + shipping_charge`;
/// the COD charge is carried alongside but excluded from the total.
pub fn quote(lines: &[PricedLine], rates: Option<&RateTable>, method: PaymentMethod) -> CartQuote {
    let subtotal = subtotal(lines);
    let shipping_charge = shipping_charge(chargeable_weight(lines), rates);
    CartQuote {
        subtotal,
        shipping_charge,
        cod_charge: cod_charge(lines, method),
        grand_total: quantize(subtotal + shipping_charge),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn line(price: Decimal, quantity: i32, weight: Decimal, free_shipping: bool) -> PricedLine {
        PricedLine {
            unit_price: price,
            quantity,
            weight_kg: weight,
            free_shipping,
        }
    }

    fn rates(base: Decimal, extra: Decimal) -> RateTable {
        RateTable {
            base_fee: Some(base),
            extra_per_kg: Some(extra),
        }
    }

    #[test]
    fn base_tier_is_a_flat_fee_for_the_first_kg() {
        let table = rates(dec!(70), dec!(20));
        assert_eq!(shipping_charge(dec!(0.5), Some(&table)), dec!(70.00));
        assert_eq!(shipping_charge(dec!(1.0), Some(&table)), dec!(70.00));
    }

    #[test]
    fn partial_extra_kilograms_bill_as_whole_kilograms() {
        let table = rates(dec!(70), dec!(20));
        // ceil(2.3 - 1) = 2 extra kg
        assert_eq!(shipping_charge(dec!(2.3), Some(&table)), dec!(110.00));
        // exactly one extra kg
        assert_eq!(shipping_charge(dec!(2.0), Some(&table)), dec!(90.00));
        assert_eq!(shipping_charge(dec!(1.01), Some(&table)), dec!(90.00));
    }

    #[test]
    fn zero_or_negative_weight_ships_free() {
        let table = rates(dec!(70), dec!(20));
        assert_eq!(shipping_charge(Decimal::ZERO, Some(&table)), Decimal::ZERO);
        assert_eq!(shipping_charge(dec!(-1), Some(&table)), Decimal::ZERO);
    }

    #[test]
    fn missing_zone_or_base_tier_degrades_to_zero() {
        assert_eq!(shipping_charge(dec!(5), None), Decimal::ZERO);

        let no_base = RateTable {
            base_fee: None,
            extra_per_kg: Some(dec!(20)),
        };
        assert_eq!(shipping_charge(dec!(5), Some(&no_base)), Decimal::ZERO);
    }

    #[test]
    fn missing_extra_tier_still_charges_the_base_fee() {
        let table = RateTable {
            base_fee: Some(dec!(70)),
            extra_per_kg: None,
        };
        assert_eq!(shipping_charge(dec!(3.7), Some(&table)), dec!(70.00));
    }

    #[test]
    fn free_shipping_items_count_toward_subtotal_but_not_weight() {
        // One free-shipping item (2kg, 500) and one normal item (0.5kg, 300).
        let lines = vec![
            line(dec!(500), 1, dec!(2), true),
            line(dec!(300), 1, dec!(0.5), false),
        ];
        let table = rates(dec!(70), dec!(20));

        assert_eq!(chargeable_weight(&lines), dec!(0.5));
        let quote = quote(&lines, Some(&table), PaymentMethod::Bkash);
        assert_eq!(quote.subtotal, dec!(800.00));
        assert_eq!(quote.shipping_charge, dec!(70.00));
        assert_eq!(quote.grand_total, dec!(870.00));
    }

    #[test]
    fn subtotal_rounds_half_up_at_the_cent() {
        let lines = vec![line(dec!(33.335), 3, Decimal::ZERO, false)];
        // 3 x 33.335 = 100.005 -> 100.01
        assert_eq!(subtotal(&lines), dec!(100.01));
    }

    #[test]
    fn results_never_exceed_two_fraction_digits() {
        let lines = vec![line(dec!(19.99), 3, dec!(0.333), false)];
        let table = rates(dec!(12.345), dec!(7.777));
        let quote = quote(&lines, Some(&table), PaymentMethod::Cod);
        assert!(quote.subtotal.scale() <= 2);
        assert!(quote.shipping_charge.scale() <= 2);
        assert!(quote.cod_charge.scale() <= 2);
        assert!(quote.grand_total.scale() <= 2);
    }

    #[test]
    fn cod_charge_is_one_percent_of_chargeable_subtotal() {
        let lines = vec![
            line(dec!(500), 1, dec!(2), true),
            line(dec!(300), 1, dec!(0.5), false),
        ];
        // only the 300 line is chargeable
        assert_eq!(cod_charge(&lines, PaymentMethod::Cod), dec!(3.00));
        assert_eq!(cod_charge(&lines, PaymentMethod::Card), Decimal::ZERO);

        let all_free = vec![line(dec!(500), 2, dec!(2), true)];
        assert_eq!(cod_charge(&all_free, PaymentMethod::Cod), Decimal::ZERO);
    }

    #[test]
    fn cod_charge_stays_out_of_the_grand_total() {
        let lines = vec![line(dec!(300), 1, dec!(0.5), false)];
        let table = rates(dec!(70), dec!(20));
        let quote = quote(&lines, Some(&table), PaymentMethod::Cod);
        assert_eq!(quote.cod_charge, dec!(3.00));
        assert_eq!(quote.grand_total, quote.subtotal + quote.shipping_charge);
    }

    #[test]
    fn quote_without_destination_offers_free_shipping() {
        let lines = vec![line(dec!(300), 2, dec!(4), false)];
        let quote = quote(&lines, None, PaymentMethod::Cod);
        assert_eq!(quote.shipping_charge, Decimal::ZERO);
        assert_eq!(quote.grand_total, quote.subtotal);
    }
}
