use crate::product::Product;
use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use serde::{Serialize, Serializer};
use std::fmt;

pub const ELECTRONICS: &str = "Electronics";
pub const PREMIUM_ELECTRONICS: &str = "Premium Electronics";

/// Electronics are sold at 90% of the listed price.
pub const DISCOUNT_RATE: Decimal = dec!(0.90);
pub const PREMIUM_THRESHOLD: Decimal = dec!(500.00);

const LOW_MAX: Decimal = dec!(10.00);
const MEDIUM_MAX: Decimal = dec!(100.00);
const HIGH_MAX: Decimal = dec!(500.00);

const PRICE_SCALE: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceRange {
    Low,
    Medium,
    High,
    Premium,
}

impl PriceRange {
    /// Buckets a final price. Upper bounds are inclusive.
    pub fn classify(price: Decimal) -> Self {
        if price <= LOW_MAX {
            PriceRange::Low
        } else if price <= MEDIUM_MAX {
            PriceRange::Medium
        } else if price <= HIGH_MAX {
            PriceRange::High
        } else {
            PriceRange::Premium
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PriceRange::Low => "Low",
            PriceRange::Medium => "Medium",
            PriceRange::High => "High",
            PriceRange::Premium => "Premium",
        }
    }
}

impl Serialize for PriceRange {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl fmt::Display for PriceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One output row. Field order is the column order of the output file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransformedProduct {
    #[serde(rename = "ProductID")]
    pub id: i32,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Price", serialize_with = "serialize_price")]
    pub price: Decimal,
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "PriceRange")]
    pub price_range: PriceRange,
}

/// Rounds half away from zero to exactly two fractional digits.
pub fn round_price(price: Decimal) -> Decimal {
    round_scaled(price.mantissa(), price.scale())
}

/// Rounds `mantissa * 10^-scale` to cents without any intermediate rounding.
fn round_scaled(mantissa: i128, scale: u32) -> Decimal {
    let cents = if scale <= PRICE_SCALE {
        mantissa * 10i128.pow(PRICE_SCALE - scale)
    } else {
        let divisor = 10i128.pow(scale - PRICE_SCALE);
        let (quotient, remainder) = (mantissa / divisor, mantissa % divisor);
        if remainder.abs() * 2 >= divisor {
            quotient + mantissa.signum()
        } else {
            quotient
        }
    };
    Decimal::try_from_i128_with_scale(cents, PRICE_SCALE).unwrap_or(if cents < 0 {
        Decimal::MIN
    } else {
        Decimal::MAX
    })
}

pub fn transform(product: &Product) -> TransformedProduct {
    let is_electronics = product.category == ELECTRONICS;

    // the discounted product can need more digits than a Decimal holds, so it
    // is rounded straight from the widened mantissa
    let price = if is_electronics {
        round_scaled(
            product.price.mantissa() * DISCOUNT_RATE.mantissa(),
            product.price.scale() + DISCOUNT_RATE.scale(),
        )
    } else {
        round_price(product.price)
    };

    // checked against the discounted, rounded price
    let category = if is_electronics && price > PREMIUM_THRESHOLD {
        PREMIUM_ELECTRONICS.to_string()
    } else {
        product.category.clone()
    };

    TransformedProduct {
        id: product.id,
        name: product.name.to_uppercase(),
        price,
        category,
        price_range: PriceRange::classify(price),
    }
}

fn serialize_price<S>(price: &Decimal, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&price.to_string())
}

#[test]
fn widget_scenario() {
    let out = transform(&Product::new(1, "Widget", dec!(25.00), "Tools"));
    assert_eq!(out.name, "WIDGET");
    assert_eq!(out.price.to_string(), "25.00");
    assert_eq!(out.category, "Tools");
    assert_eq!(out.price_range, PriceRange::Medium);
}

#[test]
fn discounted_phone_becomes_premium() {
    let out = transform(&Product::new(2, "Phone", dec!(600.00), "Electronics"));
    assert_eq!(out.price.to_string(), "540.00");
    assert_eq!(out.category, PREMIUM_ELECTRONICS);
    assert_eq!(out.price_range, PriceRange::Premium);
}

#[test]
fn cheap_electronics_keep_category() {
    let out = transform(&Product::new(3, "Cable", dec!(15.00), "Electronics"));
    assert_eq!(out.name, "CABLE");
    assert_eq!(out.price.to_string(), "13.50");
    assert_eq!(out.category, ELECTRONICS);
    assert_eq!(out.price_range, PriceRange::Medium);
}

#[test]
fn discount_applies_before_premium_check() {
    // 555.00 * 0.90 = 499.50
    let out = transform(&Product::new(4, "Tv", dec!(555.00), "Electronics"));
    assert_eq!(out.price.to_string(), "499.50");
    assert_eq!(out.category, ELECTRONICS);
    assert_eq!(out.price_range, PriceRange::High);

    // 556.12 * 0.90 = 500.508 -> 500.51
    let out = transform(&Product::new(5, "Tv", dec!(556.12), "Electronics"));
    assert_eq!(out.price.to_string(), "500.51");
    assert_eq!(out.category, PREMIUM_ELECTRONICS);

    // 555.56 * 0.90 = 500.004 -> 500.00, not above the threshold
    let out = transform(&Product::new(6, "Tv", dec!(555.56), "Electronics"));
    assert_eq!(out.price.to_string(), "500.00");
    assert_eq!(out.category, ELECTRONICS);
    assert_eq!(out.price_range, PriceRange::High);
}

#[test]
fn category_match_is_exact() {
    for category in ["electronics", "ELECTRONICS", "Electronics Accessories"] {
        let out = transform(&Product::new(7, "Mouse", dec!(1000), category));
        assert_eq!(out.price.to_string(), "1000.00");
        assert_eq!(out.category, category);
        assert_eq!(out.price_range, PriceRange::Premium);
    }
}

#[test]
fn non_electronics_above_threshold_keep_category() {
    let out = transform(&Product::new(8, "Sofa", dec!(900), "Furniture"));
    assert_eq!(out.category, "Furniture");
    assert_eq!(out.price_range, PriceRange::Premium);
}

#[test]
fn rounding_is_half_up() {
    assert_eq!(round_price(dec!(10.005)).to_string(), "10.01");
    assert_eq!(round_price(dec!(10.004)).to_string(), "10.00");
    assert_eq!(round_price(dec!(-10.005)).to_string(), "-10.01");
    assert_eq!(round_price(dec!(2.345)).to_string(), "2.35");
    assert_eq!(round_price(dec!(7)).to_string(), "7.00");
    assert_eq!(round_price(dec!(7.1)).to_string(), "7.10");
    assert_eq!(round_price(dec!(-0.001)).to_string(), "0.00");
}

#[test]
fn discount_is_exact() {
    // 0.05 * 0.90 = 0.045 -> 0.05
    let out = transform(&Product::new(9, "Fuse", dec!(0.05), "Electronics"));
    assert_eq!(out.price.to_string(), "0.05");
    let out = transform(&Product::new(9, "Fuse", dec!(11.15), "Electronics"));
    // 10.035 -> 10.04
    assert_eq!(out.price.to_string(), "10.04");
}

#[test]
fn discount_on_full_precision_prices() {
    // exact product is 0.00499999999999999999999999995
    let price = crate::product::parse_price("0.0055555555555555555555555555").unwrap();
    let out = transform(&Product::new(11, "Resistor", price, "Electronics"));
    assert_eq!(out.price.to_string(), "0.00");
    assert_eq!(out.price_range, PriceRange::Low);

    // exact product is 0.00500000000000000000000000004
    let price = crate::product::parse_price("0.0055555555555555555555555556").unwrap();
    let out = transform(&Product::new(12, "Resistor", price, "Electronics"));
    assert_eq!(out.price.to_string(), "0.01");

    let price = crate::product::parse_price("99999999999999999999999999.99").unwrap();
    let out = transform(&Product::new(13, "Mainframe", price, "Electronics"));
    assert_eq!(out.price.to_string(), "89999999999999999999999999.99");
    assert_eq!(out.category, PREMIUM_ELECTRONICS);
    let out = transform(&Product::new(13, "Mainframe", price, "Hardware"));
    assert_eq!(out.price.to_string(), "99999999999999999999999999.99");
}

#[test]
fn serialized_row() {
    let out = transform(&Product::new(2, "Phone", dec!(600.00), "Electronics"));
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.serialize(&out).unwrap();
    let row = String::from_utf8(writer.into_inner().unwrap()).unwrap();
    assert_eq!(row, "2,PHONE,540.00,Premium Electronics,Premium\n");
}

#[test]
fn range_boundaries_are_inclusive() {
    assert_eq!(PriceRange::classify(dec!(-5.00)), PriceRange::Low);
    assert_eq!(PriceRange::classify(dec!(10.00)), PriceRange::Low);
    assert_eq!(PriceRange::classify(dec!(10.01)), PriceRange::Medium);
    assert_eq!(PriceRange::classify(dec!(100.00)), PriceRange::Medium);
    assert_eq!(PriceRange::classify(dec!(100.01)), PriceRange::High);
    assert_eq!(PriceRange::classify(dec!(500.00)), PriceRange::High);
    assert_eq!(PriceRange::classify(dec!(500.01)), PriceRange::Premium);
    assert_eq!(PriceRange::High.to_string(), "High");
}

#[test]
fn unicode_names_uppercase() {
    let out = transform(&Product::new(10, "straße café", dec!(3), "Food"));
    assert_eq!(out.name, "STRASSE CAFÉ");
}
