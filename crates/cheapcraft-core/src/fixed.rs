use fixed::types::I32F32;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
///
/// All prices and costs use this type so that cost comparisons are exact and
/// two builds over the same inputs always agree.
pub type Fixed64 = I32F32;

/// Convert an f64 to Fixed64. Use only for initialization and tests.
#[inline]
pub fn f64_to_fixed64(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

/// Convert Fixed64 to f64. Use only for display.
#[inline]
pub fn fixed64_to_f64(v: Fixed64) -> f64 {
    v.to_num::<f64>()
}

/// Total price of `quantity` units at `unit_price`, saturating at the
/// representable maximum.
#[inline]
pub fn total_cost(unit_price: Fixed64, quantity: u64) -> Fixed64 {
    let quantity = i64::try_from(quantity).unwrap_or(i64::MAX);
    unit_price.saturating_mul_int(quantity)
}

/// Per-unit price of a bundle that sells `bundle_quantity` units for
/// `bundle_cost`. Returns `None` for an empty bundle.
#[inline]
pub fn unit_price(bundle_cost: Fixed64, bundle_quantity: u32) -> Option<Fixed64> {
    bundle_cost.checked_div_int(i64::from(bundle_quantity))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed64_basic_arithmetic() {
        let a = f64_to_fixed64(1.5);
        let b = f64_to_fixed64(2.0);
        assert_eq!(fixed64_to_f64(a + b), 3.5);
    }

    #[test]
    fn total_cost_multiplies() {
        let price = f64_to_fixed64(2.5);
        assert_eq!(fixed64_to_f64(total_cost(price, 4)), 10.0);
    }

    #[test]
    fn total_cost_saturates() {
        let price = f64_to_fixed64(1000.0);
        assert_eq!(total_cost(price, u64::MAX), Fixed64::MAX);
    }

    #[test]
    fn unit_price_of_bundle() {
        let price = unit_price(f64_to_fixed64(56.0), 10).unwrap();
        assert!((fixed64_to_f64(price) - 5.6).abs() < 1e-6);
        assert_eq!(total_cost(price, 10).round(), f64_to_fixed64(56.0));
    }

    #[test]
    fn unit_price_of_empty_bundle() {
        assert!(unit_price(f64_to_fixed64(8.0), 0).is_none());
    }

    #[test]
    fn fixed64_ordering() {
        let a = f64_to_fixed64(1.0);
        let b = f64_to_fixed64(2.0);
        assert!(a < b);
        assert!(b > a);
    }
}
