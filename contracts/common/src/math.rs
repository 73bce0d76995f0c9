//! Fixed-Point Math for the Stablecoin Protocol
//!
//! Checked wad/ray/rad arithmetic on 256-bit integers. Every helper mirrors
//! the on-chain library it replaces, including rounding direction, so values
//! computed here match the contracts bit for bit.

use alloy_primitives::{I256, U256};

use crate::constants::precision::{BPS, RAY, WAD, WAD_TO_RAY};
use crate::errors::{StablecoinError, StablecoinResult};

/// x + y
pub fn add(x: U256, y: U256) -> StablecoinResult<U256> {
    x.checked_add(y).ok_or(StablecoinError::Overflow)
}

/// x - y
pub fn sub(x: U256, y: U256) -> StablecoinResult<U256> {
    x.checked_sub(y).ok_or(StablecoinError::Underflow)
}

/// x * y
pub fn mul(x: U256, y: U256) -> StablecoinResult<U256> {
    x.checked_mul(y).ok_or(StablecoinError::Overflow)
}

/// x / y
pub fn div(x: U256, y: U256) -> StablecoinResult<U256> {
    x.checked_div(y).ok_or(StablecoinError::DivisionByZero)
}

/// Reinterpret an unsigned value as signed, failing above `I256::MAX`
pub fn to_signed(x: U256) -> StablecoinResult<I256> {
    I256::try_from(x).map_err(|_| StablecoinError::Overflow)
}

/// x + y for a signed delta
pub fn add_signed(x: U256, y: I256) -> StablecoinResult<U256> {
    if y.is_negative() {
        x.checked_sub(y.unsigned_abs()).ok_or(StablecoinError::Underflow)
    } else {
        x.checked_add(y.unsigned_abs()).ok_or(StablecoinError::Overflow)
    }
}

/// x - y for a signed delta
pub fn sub_signed(x: U256, y: I256) -> StablecoinResult<U256> {
    if y.is_negative() {
        x.checked_add(y.unsigned_abs()).ok_or(StablecoinError::Overflow)
    } else {
        x.checked_sub(y.unsigned_abs()).ok_or(StablecoinError::Underflow)
    }
}

/// x * y for a signed factor
pub fn mul_signed(x: U256, y: I256) -> StablecoinResult<I256> {
    to_signed(x)?.checked_mul(y).ok_or(StablecoinError::Overflow)
}

/// x - y as a signed value
pub fn diff(x: U256, y: U256) -> StablecoinResult<I256> {
    to_signed(x)?
        .checked_sub(to_signed(y)?)
        .ok_or(StablecoinError::Overflow)
}

/// wad * wad -> wad (floor)
pub fn wmul(x: U256, y: U256) -> StablecoinResult<U256> {
    Ok(mul(x, y)? / WAD)
}

/// wad / wad -> wad (floor)
pub fn wdiv(x: U256, y: U256) -> StablecoinResult<U256> {
    div(mul(x, WAD)?, y)
}

/// ray * ray -> ray (floor)
///
/// Any scale times a ray yields the same scale, so this is also how a wad
/// price is discounted by a ray factor.
pub fn rmul(x: U256, y: U256) -> StablecoinResult<U256> {
    Ok(mul(x, y)? / RAY)
}

/// x / y in ray (floor)
pub fn rdiv(x: U256, y: U256) -> StablecoinResult<U256> {
    div(mul(x, RAY)?, y)
}

/// x^n in fixed point with base `b`, rounding half up at every step
///
/// - `rpow(0, 0, b) == b`
/// - `rpow(0, n, b) == 0` for `n > 0`
/// - any intermediate overflow is an error
pub fn rpow(x: U256, n: u64, b: U256) -> StablecoinResult<U256> {
    if b.is_zero() {
        return Err(StablecoinError::DivisionByZero);
    }
    if x.is_zero() {
        return Ok(if n == 0 { b } else { U256::ZERO });
    }

    let half = b / U256::from(2u64);
    let mut x = x;
    let mut z = if n % 2 == 0 { b } else { x };
    let mut n = n / 2;

    while n > 0 {
        let xx = mul(x, x)?;
        let xx_round = add(xx, half)?;
        x = xx_round / b;

        if n % 2 == 1 {
            let zx = mul(z, x)?;
            let zx_round = add(zx, half)?;
            z = zx_round / b;
        }
        n /= 2;
    }

    Ok(z)
}

/// wad -> ray
pub fn wad_to_ray(x: U256) -> StablecoinResult<U256> {
    mul(x, WAD_TO_RAY)
}

/// wad -> rad
pub fn wad_to_rad(x: U256) -> StablecoinResult<U256> {
    mul(x, RAY)
}

/// rad -> wad (floor)
pub fn rad_to_wad(x: U256) -> U256 {
    x / RAY
}

/// amount * bps / 10_000 (floor)
pub fn bps_of(amount: U256, bps: u64) -> StablecoinResult<U256> {
    Ok(mul(amount, U256::from(bps))? / U256::from(BPS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::precision::RAD;

    fn ray_percent(pct: u64) -> U256 {
        RAY * U256::from(pct) / U256::from(100u64)
    }

    #[test]
    fn test_rpow_zero_base() {
        assert_eq!(rpow(U256::ZERO, 0, RAY).unwrap(), RAY);
        assert_eq!(rpow(U256::ZERO, 5, RAY).unwrap(), U256::ZERO);
    }

    #[test]
    fn test_rpow_identity_and_exact_squares() {
        assert_eq!(rpow(RAY, 1_000_000, RAY).unwrap(), RAY);
        assert_eq!(rpow(ray_percent(99), 1, RAY).unwrap(), ray_percent(99));
        // 0.99^2 = 0.9801, exact in ray
        let expected: U256 = "980100000000000000000000000".parse().unwrap();
        assert_eq!(rpow(ray_percent(99), 2, RAY).unwrap(), expected);
    }

    #[test]
    fn test_rpow_compounds_stability_fee() {
        // ~2% APY per-second rate compounded for one year
        let rate: U256 = "1000000000627937192491029810".parse().unwrap();
        let expected: U256 = "1019999999999999999972831879".parse().unwrap();
        assert_eq!(rpow(rate, 31_536_000, RAY).unwrap(), expected);
    }

    #[test]
    fn test_rpow_rounds_half_up() {
        // (1 + 1e-9)^2 = 1 + 2e-9 + 1e-18, representable in ray
        let x = RAY + U256::from(1_000_000_000_000_000_000u64);
        let expected: U256 = "1000000002000000001000000000".parse().unwrap();
        assert_eq!(rpow(x, 2, RAY).unwrap(), expected);
    }

    #[test]
    fn test_rpow_overflow() {
        let huge = U256::MAX / U256::from(2u64);
        assert_eq!(rpow(huge, 2, RAY), Err(StablecoinError::Overflow));
    }

    #[test]
    fn test_rmul_rdiv() {
        let ten_ray = RAY * U256::from(10u64);
        assert_eq!(rmul(ten_ray, ray_percent(50)).unwrap(), RAY * U256::from(5u64));
        assert_eq!(rdiv(RAY, ray_percent(50)).unwrap(), RAY * U256::from(2u64));
        assert_eq!(rdiv(RAY, U256::ZERO), Err(StablecoinError::DivisionByZero));
    }

    #[test]
    fn test_wmul_wdiv() {
        let two = WAD * U256::from(2u64);
        assert_eq!(wmul(two, two).unwrap(), WAD * U256::from(4u64));
        assert_eq!(wdiv(WAD, two).unwrap(), WAD / U256::from(2u64));
    }

    #[test]
    fn test_signed_helpers() {
        let five = to_signed(U256::from(5u64)).unwrap();
        let minus_five = -five;

        assert_eq!(add_signed(U256::from(10u64), minus_five).unwrap(), U256::from(5u64));
        assert_eq!(add_signed(U256::from(10u64), five).unwrap(), U256::from(15u64));
        assert_eq!(sub_signed(U256::from(10u64), minus_five).unwrap(), U256::from(15u64));
        assert_eq!(add_signed(U256::from(1u64), minus_five), Err(StablecoinError::Underflow));

        assert_eq!(mul_signed(U256::from(3u64), minus_five).unwrap(), -to_signed(U256::from(15u64)).unwrap());
        assert_eq!(diff(U256::from(3u64), U256::from(5u64)).unwrap(), -to_signed(U256::from(2u64)).unwrap());
        assert_eq!(to_signed(U256::MAX), Err(StablecoinError::Overflow));
    }

    #[test]
    fn test_scale_conversions() {
        assert_eq!(wad_to_ray(WAD).unwrap(), RAY);
        assert_eq!(wad_to_rad(WAD).unwrap(), RAD);
        assert_eq!(rad_to_wad(RAD + U256::from(1u64)), WAD);
        assert_eq!(bps_of(WAD * U256::from(100u64), 250).unwrap(), WAD * U256::from(2_500u64) / U256::from(1000u64));
    }
}
