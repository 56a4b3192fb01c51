//! Value objects for the back-office

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

pub const MIN_PHONE_DIGITS: usize = 9;
/// Largest price or delivery charge accepted from a form.
pub const MAX_AMOUNT: u64 = 1_000_000_000;
pub const MAX_QUANTITY: u32 = 10_000;

/// Phone number as typed by the operator; only the digit count is checked.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Phone(String);

impl Phone {
    pub fn new(value: impl Into<String>) -> Result<Self, PhoneError> {
        let value = value.into().trim().to_string();
        if value.is_empty() { return Err(PhoneError::Empty); }
        if value.chars().filter(char::is_ascii_digit).count() < MIN_PHONE_DIGITS { return Err(PhoneError::TooFewDigits); }
        Ok(Self(value))
    }
    pub fn as_str(&self) -> &str { &self.0 }
    pub fn into_inner(self) -> String { self.0 }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum PhoneError { Empty, TooFewDigits }
impl std::error::Error for PhoneError {}
impl fmt::Display for PhoneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self { Self::Empty => write!(f, "phone empty"), Self::TooFewDigits => write!(f, "phone has too few digits") }
    }
}

/// Human-readable order number, `ORD-` followed by a sequence padded to
/// three digits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct OrderNumber(u64);

impl OrderNumber {
    pub const PREFIX: &'static str = "ORD-";
    pub fn new(sequence: u64) -> Self { Self(sequence) }
    pub fn next(&self) -> Self { Self(self.0 + 1) }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}{:03}", Self::PREFIX, self.0) }
}

impl FromStr for OrderNumber {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix(Self::PREFIX).and_then(|n| n.parse().ok()).map(Self).ok_or(())
    }
}

/// Line quantity, a whole number between one and [`MAX_QUANTITY`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Quantity(u32);

impl Quantity {
    pub fn new(value: u32) -> Option<Self> { (1..=MAX_QUANTITY).contains(&value).then_some(Self(value)) }
    pub fn value(&self) -> u32 { self.0 }

    pub fn from_field(field: &NumberField) -> Result<Self, &'static str> {
        let n = field.decimal().ok_or("quantity_invalid")?;
        if !n.fract().is_zero() { return Err("quantity_invalid"); }
        n.to_u32().and_then(Self::new).ok_or("quantity_invalid")
    }
}

/// A numeric form field that may arrive as a JSON number or as text.
///
/// Anything that does not read as a number is kept as `Invalid` so that
/// it surfaces as a field error rather than a deserialization failure.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum NumberField {
    #[default]
    Missing,
    Number(Decimal),
    Invalid(String),
}

impl NumberField {
    pub fn decimal(&self) -> Option<Decimal> {
        match self { Self::Number(n) => Some(*n), _ => None }
    }

    pub fn is_missing(&self) -> bool { matches!(self, Self::Missing) }

    /// Required amount no smaller than `min` and no larger than
    /// [`MAX_AMOUNT`].
    pub fn at_least(&self, min: Decimal, invalid: &'static str, too_low: &'static str) -> Result<Decimal, &'static str> {
        match self {
            Self::Missing => Err("required"),
            Self::Invalid(_) => Err(invalid),
            Self::Number(n) if *n < min => Err(too_low),
            Self::Number(n) if *n > Decimal::from(MAX_AMOUNT) => Err("amount_too_high"),
            Self::Number(n) => Ok(*n),
        }
    }

    /// Like [`at_least`](Self::at_least) but absence is fine.
    pub fn optional_at_least(&self, min: Decimal, invalid: &'static str, too_low: &'static str) -> Result<Option<Decimal>, &'static str> {
        if self.is_missing() { return Ok(None); }
        self.at_least(min, invalid, too_low).map(Some)
    }

    fn parse(text: &str) -> Self {
        let text = text.trim();
        if text.is_empty() { return Self::Missing; }
        Decimal::from_str(text)
            .or_else(|_| Decimal::from_scientific(text))
            .map(Self::Number)
            .unwrap_or_else(|_| Self::Invalid(text.to_string()))
    }
}

impl From<Decimal> for NumberField {
    fn from(value: Decimal) -> Self { Self::Number(value) }
}

impl From<u32> for NumberField {
    fn from(value: u32) -> Self { Self::Number(Decimal::from(value)) }
}

impl<'de> Deserialize<'de> for NumberField {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Null => Self::Missing,
            Value::Number(n) => Self::parse(&n.to_string()),
            Value::String(s) => Self::parse(&s),
            other => Self::Invalid(other.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone() {
        assert_eq!(Phone::new(" 059-123-4567 ").unwrap().as_str(), "059-123-4567");
        assert_eq!(Phone::new("12345"), Err(PhoneError::TooFewDigits));
        assert_eq!(Phone::new("   "), Err(PhoneError::Empty));
    }

    #[test]
    fn test_order_number() {
        assert_eq!(OrderNumber::new(7).to_string(), "ORD-007");
        assert_eq!(OrderNumber::new(1234).to_string(), "ORD-1234");
        assert_eq!("ORD-042".parse::<OrderNumber>(), Ok(OrderNumber::new(42)));
        assert!("42".parse::<OrderNumber>().is_err());
    }

    #[test]
    fn test_number_field_coercion() {
        let fields: Vec<NumberField> = serde_json::from_str(r#"[12, "12.5", " ", null, "abc", true]"#).unwrap();
        assert_eq!(fields[0], NumberField::Number(Decimal::new(12, 0)));
        assert_eq!(fields[1], NumberField::Number(Decimal::new(125, 1)));
        assert_eq!(fields[2], NumberField::Missing);
        assert_eq!(fields[3], NumberField::Missing);
        assert_eq!(fields[4], NumberField::Invalid("abc".into()));
        assert!(matches!(fields[5], NumberField::Invalid(_)));
    }

    #[test]
    fn test_quantity() {
        assert_eq!(Quantity::from_field(&NumberField::from(3)).unwrap().value(), 3);
        assert!(Quantity::from_field(&NumberField::from(0)).is_err());
        assert!(Quantity::from_field(&NumberField::Number(Decimal::new(15, 1))).is_err());
        assert!(Quantity::from_field(&NumberField::Number(Decimal::new(-2, 0))).is_err());
        assert!(Quantity::from_field(&NumberField::Invalid("x".into())).is_err());
        assert_eq!(Quantity::from_field(&NumberField::from(MAX_QUANTITY)).unwrap().value(), MAX_QUANTITY);
        assert!(Quantity::from_field(&NumberField::from(MAX_QUANTITY + 1)).is_err());
    }

    #[test]
    fn test_amounts_are_capped() {
        let huge: NumberField = serde_json::from_str("79228162514264337593543950335").unwrap();
        assert_eq!(huge.at_least(Decimal::ONE, "price_invalid", "price_too_low"), Err("amount_too_high"));
        let cap = NumberField::Number(Decimal::from(MAX_AMOUNT));
        assert_eq!(cap.at_least(Decimal::ONE, "price_invalid", "price_too_low"), Ok(Decimal::from(MAX_AMOUNT)));
        let fine: NumberField = serde_json::from_str("12.345678901234567891").unwrap();
        assert_eq!(fine.decimal().map(|d| d.to_string()), Some("12.345678901234567891".to_string()));
    }
}
