use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::str::FromStr;
use thiserror::Error;

/// Why a single input line could not become a [`Product`].
///
/// These never abort a run: the pipeline counts the line as skipped and moves on.
#[derive(Debug, Error, PartialEq)]
pub enum RowError {
    #[error("expected 4 fields, found {0}")]
    FieldCount(usize),
    #[error("invalid product id '{0}'")]
    InvalidId(String),
    #[error("invalid price '{0}'")]
    InvalidPrice(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: i32,
    pub name: String,
    pub price: Decimal,
    pub category: String,
}

struct RawRecord<'a> {
    id: &'a str,
    name: &'a str,
    price: &'a str,
    category: &'a str,
}

impl<'a> RawRecord<'a> {
    fn split(fields: impl IntoIterator<Item = &'a str>) -> Result<Self, RowError> {
        let fields: Vec<&str> = fields.into_iter().map(str::trim).collect();
        let &[id, name, price, category] = fields.as_slice() else {
            return Err(RowError::FieldCount(fields.len()));
        };
        Ok(RawRecord {
            id,
            name,
            price,
            category,
        })
    }
}

impl Product {
    pub fn new(id: i32, name: &str, price: Decimal, category: &str) -> Self {
        Product {
            id,
            name: name.to_string(),
            price,
            category: category.to_string(),
        }
    }

    /// Builds a product from the already split fields of one line.
    pub fn from_fields<'a>(fields: impl IntoIterator<Item = &'a str>) -> Result<Self, RowError> {
        let raw = RawRecord::split(fields)?;
        let id = raw
            .id
            .parse::<i32>()
            .map_err(|_| RowError::InvalidId(raw.id.to_string()))?;
        let price = parse_price(raw.price)?;
        Ok(Product::new(id, raw.name, price, raw.category))
    }
}

impl FromStr for Product {
    type Err = RowError;

    /// Parses a raw line. Commas are plain separators; there is no quoting.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        Product::from_fields(line.split(','))
    }
}

/// Prices must still fit a `Decimal` once expressed in cents.
const PRICE_LIMIT: Decimal = dec!(100000000000000000000000000);

/// Parses a plain decimal literal: optional sign, digits, optional fraction.
///
/// Exponents, grouping separators, anything `Decimal` cannot hold exactly and
/// magnitudes of 10^26 or more are rejected.
pub fn parse_price(text: &str) -> Result<Decimal, RowError> {
    let invalid = || RowError::InvalidPrice(text.to_string());

    let (negative, body) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let (int_part, frac_part) = body.split_once('.').unwrap_or((body, ""));

    let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(invalid());
    }
    if !all_digits(int_part) || !all_digits(frac_part) {
        return Err(invalid());
    }

    let int_part = if int_part.is_empty() { "0" } else { int_part };
    let literal = if frac_part.is_empty() {
        int_part.to_string()
    } else {
        format!("{}.{}", int_part, frac_part)
    };
    let value = Decimal::from_str_exact(&literal).map_err(|_| invalid())?;
    if value >= PRICE_LIMIT {
        return Err(invalid());
    }
    Ok(if negative { -value } else { value })
}

#[test]
fn parses_well_formed_line() {
    let product: Product = "1,Widget,25.00,Tools".parse().unwrap();
    assert_eq!(product, Product::new(1, "Widget", dec!(25.00), "Tools"));
}

#[test]
fn trims_fields_and_keeps_case() {
    let product: Product = " 7 ,  usb Hub , 19.5 , electronics ".parse().unwrap();
    assert_eq!(product.id, 7);
    assert_eq!(product.name, "usb Hub");
    assert_eq!(product.price, dec!(19.5));
    assert_eq!(product.category, "electronics");
}

#[test]
fn wrong_field_count() {
    assert_eq!(
        "1,Widget,25.00".parse::<Product>(),
        Err(RowError::FieldCount(3))
    );
    // trailing empty fields are kept
    assert_eq!(
        "1,Widget,25.00,Tools,".parse::<Product>(),
        Err(RowError::FieldCount(5))
    );
    assert_eq!(
        "1,,25.00,Tools".parse::<Product>().map(|p| p.name),
        Ok(String::new())
    );
}

#[test]
fn rejects_bad_ids() {
    for id in ["abc", "1.0", "1,000", "", "99999999999"] {
        let line = format!("{},Widget,1.00,Tools", id);
        assert!(
            matches!(
                line.parse::<Product>(),
                Err(RowError::InvalidId(_)) | Err(RowError::FieldCount(_))
            ),
            "{} should be rejected",
            id
        );
    }
    assert_eq!("-3,Widget,1.00,Tools".parse::<Product>().unwrap().id, -3);
    assert_eq!("+3,Widget,1.00,Tools".parse::<Product>().unwrap().id, 3);
}

#[test]
fn price_literals() {
    assert_eq!(parse_price("25"), Ok(dec!(25)));
    assert_eq!(parse_price("+25.10"), Ok(dec!(25.10)));
    assert_eq!(parse_price("-0.5"), Ok(dec!(-0.5)));
    assert_eq!(parse_price(".5"), Ok(dec!(0.5)));
    assert_eq!(parse_price("5."), Ok(dec!(5)));
    assert_eq!(parse_price("10.005"), Ok(dec!(10.005)));
    assert_eq!(
        parse_price("99999999999999999999999999.99").map(|p| p.scale()),
        Ok(2)
    );
}

#[test]
fn rejects_prices_too_large_for_cents() {
    for price in ["100000000000000000000000000", "-100000000000000000000000000.5"] {
        assert_eq!(
            parse_price(price),
            Err(RowError::InvalidPrice(price.to_string()))
        );
    }
}

#[test]
fn rejects_bad_prices() {
    let bad = [
        "", "-", ".", "abc", "1e3", "1_000", "1.2.3", "12abc", "$5", "--1", "1 000",
    ];
    for price in bad {
        assert_eq!(
            parse_price(price),
            Err(RowError::InvalidPrice(price.to_string())),
            "{} should be rejected",
            price
        );
    }
}
