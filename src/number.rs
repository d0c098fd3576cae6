// Copyright 2023 Christian Jaeger <ch@christianjaeger.ch>. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! EDN numbers: 64-bit integers, arbitrary precision integers (the
//! `N` suffix, or integers that don't fit into an i64), and doubles
//! (`M` suffixed decimals are read as doubles, too).

use num::BigInt;
use ordered_float::OrderedFloat;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Number {
    Integer(i64),
    // boxing since BigInt is Vec (RawVec (ptr and usize) and usize)
    // plus sign.
    BigInt(Box<BigInt>),
    Float(OrderedFloat<f64>),
}

impl Number {
    pub fn float(x: f64) -> Number {
        Number::Float(OrderedFloat(x))
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Number::Integer(n) => Some(*n),
            Number::BigInt(n) => i64::try_from(&**n).ok(),
            Number::Float(_) => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Number::Float(x) => Some(x.0),
            _ => None,
        }
    }
}

impl From<i64> for Number {
    fn from(n: i64) -> Number {
        Number::Integer(n)
    }
}

impl From<BigInt> for Number {
    fn from(n: BigInt) -> Number {
        Number::BigInt(Box::new(n))
    }
}

impl From<f64> for Number {
    fn from(x: f64) -> Number {
        Number::float(x)
    }
}

impl std::fmt::Display for Number {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>)
           -> Result<(), std::fmt::Error> {
        match self {
            Number::Integer(n) => f.write_fmt(format_args!("{}", n)),
            Number::BigInt(n) => f.write_fmt(format_args!("{}N", n)),
            Number::Float(x) => {
                let x = x.0;
                if x.is_nan() {
                    f.write_str("##NaN")
                } else if x.is_infinite() {
                    f.write_str(if x > 0. { "##Inf" } else { "##-Inf" })
                } else {
                    // Debug always shows a '.' or an exponent, so the
                    // output reads back as a float.
                    f.write_fmt(format_args!("{:?}", x))
                }
            }
        }
    }
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Parse the complete text of a numeric token (which starts with a
/// digit, or with a sign followed by a digit). Returns None if `s` is
/// not a valid EDN number.
pub fn read_number(s: &str) -> Option<Number> {
    let (is_neg, unsigned) = match s.as_bytes().first()? {
        b'-' => (true, &s[1..]),
        b'+' => (false, &s[1..]),
        _ => (false, s),
    };

    // Integer, possibly with N suffix
    let (digits, big) = match unsigned.strip_suffix('N') {
        Some(d) => (d, true),
        None => (unsigned, false),
    };
    if is_digits(digits) {
        if digits.len() > 1 && digits.starts_with('0') {
            return None
        }
        let n: BigInt = digits.parse().ok()?;
        let n = if is_neg { -n } else { n };
        if !big {
            if let Ok(small) = i64::try_from(&n) {
                return Some(Number::Integer(small))
            }
        }
        return Some(Number::BigInt(Box::new(n)))
    }

    // Float: int frac? exp? M?
    let body = unsigned.strip_suffix('M').unwrap_or(unsigned);
    let (mantissa, exp) = match body.find(|c| c == 'e' || c == 'E') {
        Some(i) => (&body[..i], Some(&body[i + 1..])),
        None => (body, None),
    };
    let (int, frac) = match mantissa.find('.') {
        Some(i) => (&mantissa[..i], Some(&mantissa[i + 1..])),
        None => (mantissa, None),
    };
    if !is_digits(int) || (int.len() > 1 && int.starts_with('0')) {
        return None
    }
    if let Some(frac) = frac {
        // "1." is accepted, like Clojure does
        if !frac.is_empty() && !is_digits(frac) {
            return None
        }
    }
    if let Some(exp) = exp {
        let e = exp.strip_prefix(|c| c == '+' || c == '-').unwrap_or(exp);
        if !is_digits(e) {
            return None
        }
    }
    if frac.is_none() && exp.is_none() && body.len() == unsigned.len() {
        // plain digits followed by junk
        return None
    }
    let x: f64 = body.parse().ok()?;
    // out of range; infinity is only written as ##Inf
    if x.is_infinite() {
        return None
    }
    Some(Number::float(if is_neg { -x } else { x }))
}
