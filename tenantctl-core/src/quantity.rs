//! Resource quantity normalization
//!
//! Cluster resource lists carry quantities as strings in several encodings:
//! plain integers (`2`), decimals (`4.5`), decimal SI suffixes (`4500m`,
//! `10G`), binary SI suffixes (`16Gi`) and exponents (`1e3`). This module
//! turns them into `i64` values in canonical base units.

use std::collections::{BTreeMap, HashMap};

use k8s_openapi::apimachinery::pkg::api::resource::Quantity;

use crate::error::{TenantError, TenantResult};

/// Resource list as found in quota, limit range and container specs
pub type ResourceList = BTreeMap<String, Quantity>;

pub const MIB: i64 = 1 << 20;
pub const GIB: i64 = 1 << 30;

/// Normalize the named resources of `resources`.
///
/// CPU resources (any name containing `cpu`) are returned in milli-units,
/// everything else in base units. Non-integral values are rounded up.
///
/// Fails with `ResourceNotFound` as soon as one name is missing; no partial
/// map is ever returned.
pub fn normalize(resources: &ResourceList, names: &[&str]) -> TenantResult<HashMap<String, i64>> {
    let mut result = HashMap::with_capacity(names.len());

    for &name in names {
        let quantity = resources
            .get(name)
            .ok_or_else(|| TenantError::ResourceNotFound {
                name: name.to_string(),
            })?;

        let parsed = ParsedQuantity::parse(&quantity.0);
        let value = if is_cpu(name) {
            parsed.and_then(|q| q.milli_value())
        } else {
            parsed.and_then(|q| q.value())
        };

        let value = value.ok_or_else(|| TenantError::InvalidQuantity {
            name: name.to_string(),
            value: quantity.0.clone(),
        })?;

        result.insert(name.to_string(), value);
    }

    Ok(result)
}

/// Normalize a single named resource.
pub fn normalize_one(resources: &ResourceList, name: &str) -> TenantResult<i64> {
    let mut values = normalize(resources, &[name])?;
    values
        .remove(name)
        .ok_or_else(|| TenantError::Internal(format!("normalized value for {} missing", name)))
}

fn is_cpu(name: &str) -> bool {
    name.contains("cpu")
}

pub fn bytes_to_gib(bytes: i64) -> i64 {
    bytes / GIB
}

pub fn bytes_to_mib(bytes: i64) -> i64 {
    bytes / MIB
}

/// A parsed quantity: `mantissa * 10^exp10 * 2^exp2`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedQuantity {
    mantissa: i128,
    exp10: i32,
    exp2: u32,
}

impl ParsedQuantity {
    pub fn parse(input: &str) -> Option<Self> {
        let s = input.trim();

        let (negative, s) = match s.as_bytes().first()? {
            b'-' => (true, &s[1..]),
            b'+' => (false, &s[1..]),
            _ => (false, s),
        };

        let number_end = s
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(s.len());
        let (number, suffix) = s.split_at(number_end);

        let (int_part, frac_part) = match number.split_once('.') {
            Some((i, f)) => (i, f),
            None => (number, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return None;
        }

        let mut mantissa: i128 = 0;
        for c in int_part.chars().chain(frac_part.chars()) {
            let digit = c.to_digit(10)? as i128;
            mantissa = mantissa.checked_mul(10)?.checked_add(digit)?;
        }
        if negative {
            mantissa = -mantissa;
        }

        let (suffix_exp10, exp2) = parse_suffix(suffix)?;
        let exp10 = suffix_exp10.checked_sub(i32::try_from(frac_part.len()).ok()?)?;

        Some(Self {
            mantissa,
            exp10,
            exp2,
        })
    }

    /// Value in base units, rounded up
    pub fn value(&self) -> Option<i64> {
        self.scaled(0)
    }

    /// Value in thousandths of a unit, rounded up
    pub fn milli_value(&self) -> Option<i64> {
        self.scaled(3)
    }

    /// `self * 10^scale`, rounded away from zero
    fn scaled(&self, scale: i32) -> Option<i64> {
        let v = self.mantissa.checked_mul(1i128.checked_shl(self.exp2)?)?;
        if v == 0 {
            return Some(0);
        }

        let exp = self.exp10.checked_add(scale)?;
        let result = if exp >= 0 {
            v.checked_mul(10i128.checked_pow(exp as u32)?)?
        } else {
            match 10i128.checked_pow(exp.unsigned_abs()) {
                Some(divisor) => {
                    let quotient = v / divisor;
                    if v % divisor != 0 {
                        quotient + v.signum()
                    } else {
                        quotient
                    }
                }
                // Divisor exceeds any representable mantissa
                None => v.signum(),
            }
        };

        i64::try_from(result).ok()
    }
}

fn parse_suffix(suffix: &str) -> Option<(i32, u32)> {
    let parsed = match suffix {
        "" => (0, 0),
        "Ki" => (0, 10),
        "Mi" => (0, 20),
        "Gi" => (0, 30),
        "Ti" => (0, 40),
        "Pi" => (0, 50),
        "Ei" => (0, 60),
        "n" => (-9, 0),
        "u" => (-6, 0),
        "m" => (-3, 0),
        "k" => (3, 0),
        "M" => (6, 0),
        "G" => (9, 0),
        "T" => (12, 0),
        "P" => (15, 0),
        "E" => (18, 0),
        _ => {
            let exponent = suffix
                .strip_prefix('e')
                .or_else(|| suffix.strip_prefix('E'))?;
            (exponent.parse::<i32>().ok()?, 0)
        }
    };
    Some(parsed)
}
