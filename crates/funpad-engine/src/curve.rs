//! # Pricing curve math
//!
//! Integer-only integrals for the two [`CurveKind`] strategies. Supply `s`
//! is counted in atomic token units, cost in atomic native units.
//!
//! ## Linear
//! ```text
//! price(s)      = base_price * (slope + s) / slope          (per whole token)
//! cost(s0, s1)  = base_price * Δ * (2·slope + s0 + s1) / (2·slope·unit)
//! inverse       : largest Δ with (A + Δ)² ≤ A² + C,
//!                 A = slope + s0,  C = ⌊2·b·slope·unit / base_price⌋
//! ```
//!
//! ## VirtualProduct
//! ```text
//! V(s)          = k / (vt - s),   k = vb · vt
//! cost(s0, s1)  = V(s1) - V(s0)
//! inverse       : s1 = vt - ⌈k / (⌊V(s0)⌋ + b)⌉
//! ```
//!
//! Buys use [`Rounding::Up`], sells [`Rounding::Down`], so every rounding
//! error lands in the reserve's favour.

use funpad_core::{CurveKind, EngineError, EngineResult};

/// Spot prices are reported as native atomic units per whole token × 10^12.
pub const PRICE_SCALE: u128 = 1_000_000_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    Up,
    Down,
}

/// A monotonically increasing price function with a closed-form inverse.
pub trait PricingCurve {
    /// Reject parameters that can't price `supply_cap` units.
    fn validate(&self, supply_cap: u128) -> EngineResult<()>;

    /// Spot price at `supply` sold, scaled by [`PRICE_SCALE`].
    fn price(&self, supply: u128, unit: u128) -> EngineResult<u128>;

    /// Integral of the price from `from` to `to` (`from <= to`).
    fn cost(&self, from: u128, to: u128, unit: u128, rounding: Rounding) -> EngineResult<u128>;

    /// Largest Δ such that `cost(from, from + Δ, Up) <= budget`.
    fn supply_for_cost(&self, from: u128, budget: u128, unit: u128) -> EngineResult<u128>;
}

impl PricingCurve for CurveKind {
    fn validate(&self, supply_cap: u128) -> EngineResult<()> {
        match *self {
            CurveKind::Linear { base_price, slope } => {
                if base_price == 0 || slope == 0 {
                    return Err(EngineError::InvalidParameters(
                        "linear curve needs base_price > 0 and slope > 0".to_string(),
                    ));
                }
            }
            CurveKind::VirtualProduct {
                virtual_base,
                virtual_token,
            } => {
                if virtual_base == 0 || virtual_token <= supply_cap {
                    return Err(EngineError::InvalidParameters(
                        "virtual product curve needs virtual_base > 0 and virtual_token > supply cap"
                            .to_string(),
                    ));
                }
                virtual_base
                    .checked_mul(virtual_token)
                    .ok_or_else(|| EngineError::overflow("virtual invariant"))?;
            }
        }
        Ok(())
    }

    fn price(&self, supply: u128, unit: u128) -> EngineResult<u128> {
        match *self {
            CurveKind::Linear { base_price, slope } => {
                let scaled = mul(base_price, PRICE_SCALE)?;
                mul_div(scaled, add(slope, supply)?, slope)
            }
            CurveKind::VirtualProduct {
                virtual_base,
                virtual_token,
            } => {
                let k = mul(virtual_base, virtual_token)?;
                let x = remaining_virtual(virtual_token, supply)?;
                let per_x = mul_div(k, PRICE_SCALE, x)?;
                mul_div(per_x, unit, x)
            }
        }
    }

    fn cost(&self, from: u128, to: u128, unit: u128, rounding: Rounding) -> EngineResult<u128> {
        if to < from {
            return Err(EngineError::InvalidParameters(format!(
                "curve integral bounds reversed: {} > {}",
                from, to
            )));
        }
        if to == from {
            return Ok(0);
        }
        match *self {
            CurveKind::Linear { base_price, slope } => {
                let delta = to - from;
                let span = add(add(mul(2, slope)?, from)?, to)?;
                let num = mul(mul(base_price, delta)?, span)?;
                let den = mul(mul(2, slope)?, unit)?;
                Ok(match rounding {
                    Rounding::Up => num.div_ceil(den),
                    Rounding::Down => num / den,
                })
            }
            CurveKind::VirtualProduct {
                virtual_base,
                virtual_token,
            } => {
                let k = mul(virtual_base, virtual_token)?;
                let x0 = remaining_virtual(virtual_token, from)?;
                let x1 = remaining_virtual(virtual_token, to)?;
                Ok(match rounding {
                    Rounding::Up => k.div_ceil(x1) - k / x0,
                    Rounding::Down => (k / x1).saturating_sub(k.div_ceil(x0)),
                })
            }
        }
    }

    fn supply_for_cost(&self, from: u128, budget: u128, unit: u128) -> EngineResult<u128> {
        if budget == 0 {
            return Ok(0);
        }
        match *self {
            CurveKind::Linear { base_price, slope } => {
                let a = add(slope, from)?;
                let c = mul(mul(mul(2, budget)?, slope)?, unit)? / base_price;
                let root = isqrt(add(mul(a, a)?, c)?);
                Ok(root.saturating_sub(a))
            }
            CurveKind::VirtualProduct {
                virtual_base,
                virtual_token,
            } => {
                let k = mul(virtual_base, virtual_token)?;
                let x0 = remaining_virtual(virtual_token, from)?;
                let ceiling = add(k / x0, budget)?;
                let x1 = k.div_ceil(ceiling);
                let to = virtual_token - x1;
                Ok(to.saturating_sub(from))
            }
        }
    }
}

/// Integer square root (Newton's method). Returns ⌊√n⌋.
pub fn isqrt(n: u128) -> u128 {
    if n == 0 {
        return 0;
    }
    let mut x = n;
    let mut y = x.div_ceil(2);
    while y < x {
        x = y;
        y = (x + n / x) / 2;
    }
    x
}

pub(crate) fn mul(a: u128, b: u128) -> EngineResult<u128> {
    a.checked_mul(b)
        .ok_or_else(|| EngineError::overflow("curve multiplication"))
}

pub(crate) fn add(a: u128, b: u128) -> EngineResult<u128> {
    a.checked_add(b)
        .ok_or_else(|| EngineError::overflow("curve addition"))
}

/// `a * b / c`, floored. `c` must be non-zero.
pub(crate) fn mul_div(a: u128, b: u128, c: u128) -> EngineResult<u128> {
    if c == 0 {
        return Err(EngineError::InvalidParameters("division by zero".to_string()));
    }
    Ok(mul(a, b)? / c)
}

fn remaining_virtual(virtual_token: u128, supply: u128) -> EngineResult<u128> {
    match virtual_token.checked_sub(supply) {
        Some(x) if x > 0 => Ok(x),
        _ => Err(EngineError::CurveExhausted(format!(
            "supply {} reaches virtual reserve {}",
            supply, virtual_token
        ))),
    }
}
