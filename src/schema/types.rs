//! Leaf types and typed value comparison.

use crate::err::ValueError;
use log::warn;
use std::cmp::Ordering;

/// YANG built-in types, the end of every typedef chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseType {
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Decimal64,
    Boolean,
    String,
    Empty,
    Identityref,
    Enumeration,
    Bits,
    Binary,
    Leafref,
    InstanceIdentifier,
    Union,
}

impl BaseType {
    pub fn from_name(name: &str) -> Option<BaseType> {
        let base = match name {
            "int8" => BaseType::Int8,
            "int16" => BaseType::Int16,
            "int32" => BaseType::Int32,
            "int64" => BaseType::Int64,
            "uint8" => BaseType::Uint8,
            "uint16" => BaseType::Uint16,
            "uint32" => BaseType::Uint32,
            "uint64" => BaseType::Uint64,
            "decimal64" => BaseType::Decimal64,
            "boolean" => BaseType::Boolean,
            "string" => BaseType::String,
            "empty" => BaseType::Empty,
            "identityref" => BaseType::Identityref,
            "enumeration" => BaseType::Enumeration,
            "bits" => BaseType::Bits,
            "binary" => BaseType::Binary,
            "leafref" => BaseType::Leafref,
            "instance-identifier" => BaseType::InstanceIdentifier,
            "union" => BaseType::Union,
            _ => return None,
        };
        Some(base)
    }

    pub fn name(self) -> &'static str {
        match self {
            BaseType::Int8 => "int8",
            BaseType::Int16 => "int16",
            BaseType::Int32 => "int32",
            BaseType::Int64 => "int64",
            BaseType::Uint8 => "uint8",
            BaseType::Uint16 => "uint16",
            BaseType::Uint32 => "uint32",
            BaseType::Uint64 => "uint64",
            BaseType::Decimal64 => "decimal64",
            BaseType::Boolean => "boolean",
            BaseType::String => "string",
            BaseType::Empty => "empty",
            BaseType::Identityref => "identityref",
            BaseType::Enumeration => "enumeration",
            BaseType::Bits => "bits",
            BaseType::Binary => "binary",
            BaseType::Leafref => "leafref",
            BaseType::InstanceIdentifier => "instance-identifier",
            BaseType::Union => "union",
        }
    }

    /// Types whose JSON encoding is a bare literal rather than a string.
    ///
    /// RFC 7951 quotes 64-bit integers; this codec writes them bare like the
    /// other integer types.
    pub fn is_unquoted(self) -> bool {
        matches!(
            self,
            BaseType::Int8
                | BaseType::Int16
                | BaseType::Int32
                | BaseType::Int64
                | BaseType::Uint8
                | BaseType::Uint16
                | BaseType::Uint32
                | BaseType::Uint64
                | BaseType::Decimal64
                | BaseType::Boolean
        )
    }

    fn signed_range(self) -> Option<(i64, i64)> {
        match self {
            BaseType::Int8 => Some((i8::MIN.into(), i8::MAX.into())),
            BaseType::Int16 => Some((i16::MIN.into(), i16::MAX.into())),
            BaseType::Int32 => Some((i32::MIN.into(), i32::MAX.into())),
            BaseType::Int64 => Some((i64::MIN, i64::MAX)),
            _ => None,
        }
    }

    fn unsigned_max(self) -> Option<u64> {
        match self {
            BaseType::Uint8 => Some(u8::MAX.into()),
            BaseType::Uint16 => Some(u16::MAX.into()),
            BaseType::Uint32 => Some(u32::MAX.into()),
            BaseType::Uint64 => Some(u64::MAX),
            _ => None,
        }
    }
}

/// A leaf type after typedef resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSpec {
    /// The name used at the point of use (a typedef name or a built-in).
    pub name: String,
    pub base: BaseType,
    /// Only meaningful for `decimal64`.
    pub fraction_digits: u8,
}

impl TypeSpec {
    pub fn builtin(base: BaseType) -> Self {
        TypeSpec {
            name: base.name().to_owned(),
            base,
            fraction_digits: if base == BaseType::Decimal64 { 2 } else { 0 },
        }
    }

    pub fn decimal64(fraction_digits: u8) -> Self {
        TypeSpec {
            name: BaseType::Decimal64.name().to_owned(),
            base: BaseType::Decimal64,
            fraction_digits,
        }
    }

    /// Parse a body into its typed value.
    pub fn parse(&self, body: &str) -> Result<TypedValue, ValueError> {
        let trimmed = body.trim();
        if let Some((min, max)) = self.base.signed_range() {
            return trimmed
                .parse::<i64>()
                .ok()
                .filter(|v| (min..=max).contains(v))
                .map(TypedValue::Int)
                .ok_or_else(|| ValueError::InvalidNumber {
                    value: body.to_owned(),
                    type_name: self.base.name(),
                });
        }
        if let Some(max) = self.base.unsigned_max() {
            return trimmed
                .parse::<u64>()
                .ok()
                .filter(|v| *v <= max)
                .map(TypedValue::Uint)
                .ok_or_else(|| ValueError::InvalidNumber {
                    value: body.to_owned(),
                    type_name: self.base.name(),
                });
        }
        match self.base {
            BaseType::Decimal64 => parse_decimal(trimmed, self.fraction_digits)
                .map(TypedValue::Decimal)
                .ok_or_else(|| ValueError::InvalidDecimal {
                    value: body.to_owned(),
                    fraction_digits: self.fraction_digits,
                }),
            BaseType::Boolean => match trimmed {
                "true" => Ok(TypedValue::Bool(true)),
                "false" => Ok(TypedValue::Bool(false)),
                _ => Err(ValueError::InvalidBoolean {
                    value: body.to_owned(),
                }),
            },
            _ => Ok(TypedValue::Text(body.to_owned())),
        }
    }
}

/// A parsed leaf value. Decimals are stored scaled by `10^fraction_digits`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum TypedValue {
    Int(i64),
    Uint(u64),
    Decimal(i128),
    Bool(bool),
    Text(String),
}

impl TypedValue {
    /// The canonical lexical form. Decimals are written with at least one
    /// fraction digit and no trailing zeros beyond it.
    pub fn canonical(&self, fraction_digits: u8) -> String {
        match self {
            TypedValue::Int(v) => v.to_string(),
            TypedValue::Uint(v) => v.to_string(),
            TypedValue::Decimal(mantissa) => format_decimal(*mantissa, fraction_digits),
            TypedValue::Bool(v) => v.to_string(),
            TypedValue::Text(text) => text.clone(),
        }
    }
}

fn format_decimal(mantissa: i128, fraction_digits: u8) -> String {
    let sign = if mantissa < 0 { "-" } else { "" };
    let magnitude = mantissa.unsigned_abs();
    let scale = 10u128.pow(u32::from(fraction_digits));
    let int_part = magnitude / scale;
    if fraction_digits == 0 {
        return format!("{sign}{int_part}");
    }
    let frac = format!("{:0width$}", magnitude % scale, width = usize::from(fraction_digits));
    let frac = match frac.trim_end_matches('0') {
        "" => "0",
        trimmed => trimmed,
    };
    format!("{sign}{int_part}.{frac}")
}

/// Parse `-12.5` into a mantissa scaled to `fraction_digits` decimals.
fn parse_decimal(text: &str, fraction_digits: u8) -> Option<i128> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, f),
        None => (digits, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !int_part.bytes().all(|b| b.is_ascii_digit()) || !frac_part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if frac_part.len() > usize::from(fraction_digits) || int_part.len() > 19 {
        return None;
    }
    let mut mantissa: i128 = 0;
    for b in int_part.bytes().chain(frac_part.bytes()) {
        mantissa = mantissa.checked_mul(10)?.checked_add(i128::from(b - b'0'))?;
    }
    for _ in frac_part.len()..usize::from(fraction_digits) {
        mantissa = mantissa.checked_mul(10)?;
    }
    Some(if negative { -mantissa } else { mantissa })
}

/// Compare two leaf bodies by their typed value.
///
/// A missing body is smaller than any value. Bodies that fail to parse sort
/// after every parseable one and compare lexically among themselves, which
/// keeps the order total.
pub fn compare_bodies(ty: Option<&TypeSpec>, a: Option<&str>, b: Option<&str>) -> Ordering {
    let (a, b) = match (a, b) {
        (None, None) => return Ordering::Equal,
        (None, Some(_)) => return Ordering::Less,
        (Some(_), None) => return Ordering::Greater,
        (Some(a), Some(b)) => (a, b),
    };
    let Some(ty) = ty else {
        return a.cmp(b);
    };
    match (ty.parse(a), ty.parse(b)) {
        (Ok(va), Ok(vb)) => va.cmp(&vb),
        (Ok(_), Err(e)) => {
            warn!("{e}, sorting it last");
            Ordering::Less
        }
        (Err(e), Ok(_)) => {
            warn!("{e}, sorting it last");
            Ordering::Greater
        }
        (Err(_), Err(_)) => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_integers_compare_numerically() {
        let ty = TypeSpec::builtin(BaseType::Int32);
        assert_eq!(compare_bodies(Some(&ty), Some("9"), Some("10")), Ordering::Less);
        assert_eq!(compare_bodies(Some(&ty), Some("-3"), Some("-20")), Ordering::Greater);
        assert_eq!(compare_bodies(None, Some("9"), Some("10")), Ordering::Greater);
    }

    #[test]
    fn test_out_of_range_is_rejected() {
        let ty = TypeSpec::builtin(BaseType::Uint8);
        assert_eq!(ty.parse("255"), Ok(TypedValue::Uint(255)));
        assert_eq!(
            ty.parse("256"),
            Err(ValueError::InvalidNumber {
                value: "256".to_owned(),
                type_name: "uint8"
            })
        );
    }

    #[test]
    fn test_decimal_scaling() {
        let ty = TypeSpec::decimal64(3);
        assert_eq!(ty.parse("1.5"), Ok(TypedValue::Decimal(1500)));
        assert_eq!(ty.parse("-0.25"), Ok(TypedValue::Decimal(-250)));
        assert_eq!(ty.parse("12"), Ok(TypedValue::Decimal(12000)));
        assert!(ty.parse("1.2345").is_err());
        assert!(ty.parse(".").is_err());
        assert_eq!(compare_bodies(Some(&ty), Some("1.50"), Some("1.5")), Ordering::Equal);
    }

    #[test]
    fn test_missing_and_unparseable_bodies() {
        let ty = TypeSpec::builtin(BaseType::Int8);
        assert_eq!(compare_bodies(Some(&ty), None, Some("-128")), Ordering::Less);
        assert_eq!(compare_bodies(Some(&ty), Some("x"), Some("100")), Ordering::Greater);
        assert_eq!(compare_bodies(Some(&ty), Some("x"), Some("y")), Ordering::Less);
    }

    #[test]
    fn test_canonical_forms() {
        let int = TypeSpec::builtin(BaseType::Int32);
        assert_eq!(int.parse("+5").map(|v| v.canonical(0)), Ok("5".to_owned()));
        assert_eq!(int.parse("-007").map(|v| v.canonical(0)), Ok("-7".to_owned()));
        let dec = TypeSpec::decimal64(2);
        assert_eq!(dec.parse("1.").map(|v| v.canonical(2)), Ok("1.0".to_owned()));
        assert_eq!(dec.parse(".5").map(|v| v.canonical(2)), Ok("0.5".to_owned()));
        assert_eq!(dec.parse("-.05").map(|v| v.canonical(2)), Ok("-0.05".to_owned()));
        assert_eq!(dec.parse("+12.30").map(|v| v.canonical(2)), Ok("12.3".to_owned()));
    }

    #[test]
    fn test_boolean_literals() {
        let ty = TypeSpec::builtin(BaseType::Boolean);
        assert_eq!(compare_bodies(Some(&ty), Some("false"), Some("true")), Ordering::Less);
        assert!(ty.parse("yes").is_err());
    }
}
