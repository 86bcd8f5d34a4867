//! Item adjustment arithmetic.

use rust_decimal::Decimal;

use super::error::VersionError;
use super::types::AdjustmentType;

/// Lowest accepted percentage adjustment. At -100% the amount is already zero.
pub const PERCENTAGE_FLOOR: Decimal = Decimal::from_parts(100, 0, 0, true, 0);

/// Stateless calculator for adjusted amounts.
pub struct AdjustmentCalculator;

impl AdjustmentCalculator {
    /// Compute the adjusted amount for an item.
    ///
    /// - percentage: `original * (1 + value / 100)`
    /// - absolute: `original + value`
    ///
    /// The result is clamped at zero.
    ///
    /// # Errors
    ///
    /// Returns `VersionError::PercentageBelowFloor` for percentage values
    /// below -100, and `VersionError::AmountOverflow` when the result does
    /// not fit in a decimal.
    pub fn compute_adjusted_amount(
        original: Decimal,
        adjustment_type: AdjustmentType,
        value: Decimal,
    ) -> Result<Decimal, VersionError> {
        Self::validate(adjustment_type, value)?;

        let adjusted = match adjustment_type {
            AdjustmentType::Percentage => value
                .checked_div(Decimal::ONE_HUNDRED)
                .and_then(|rate| Decimal::ONE.checked_add(rate))
                .and_then(|factor| original.checked_mul(factor)),
            AdjustmentType::Absolute => original.checked_add(value),
        }
        .ok_or(VersionError::AmountOverflow("adjusted amount"))?;

        Ok(adjusted.max(Decimal::ZERO))
    }

    /// Validate an adjustment value against its type.
    ///
    /// Absolute values have no lower bound; clamping handles negative results.
    ///
    /// # Errors
    ///
    /// Returns `VersionError::PercentageBelowFloor` for percentage values
    /// below -100.
    pub fn validate(adjustment_type: AdjustmentType, value: Decimal) -> Result<(), VersionError> {
        if adjustment_type == AdjustmentType::Percentage && value < PERCENTAGE_FLOOR {
            return Err(VersionError::PercentageBelowFloor { value });
        }
        Ok(())
    }

    /// Convert an adjustment value between representations.
    ///
    /// - absolute → percentage: `value / original * 100`, or 0 when `original <= 0`
    /// - percentage → absolute: `original * value / 100`
    ///
    /// # Errors
    ///
    /// Returns `VersionError::AmountOverflow` when the converted value does
    /// not fit in a decimal.
    pub fn convert_adjustment_type(
        original: Decimal,
        from: AdjustmentType,
        to: AdjustmentType,
        value: Decimal,
    ) -> Result<Decimal, VersionError> {
        let converted = match (from, to) {
            (AdjustmentType::Absolute, AdjustmentType::Percentage) => {
                if original > Decimal::ZERO {
                    value
                        .checked_div(original)
                        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
                } else {
                    Some(Decimal::ZERO)
                }
            }
            (AdjustmentType::Percentage, AdjustmentType::Absolute) => value
                .checked_div(Decimal::ONE_HUNDRED)
                .and_then(|rate| original.checked_mul(rate)),
            _ => Some(value),
        };

        converted.ok_or(VersionError::AmountOverflow("adjustment value"))
    }

    /// Percentage value equivalent to a multiplicative factor.
    ///
    /// A factor of 0.9 is -10%, a factor of 1.1 is +10%.
    ///
    /// # Errors
    ///
    /// Returns `VersionError::AmountOverflow` for factors whose percentage
    /// does not fit in a decimal.
    pub fn factor_to_percentage(factor: Decimal) -> Result<Decimal, VersionError> {
        factor
            .checked_sub(Decimal::ONE)
            .and_then(|delta| delta.checked_mul(Decimal::ONE_HUNDRED))
            .ok_or(VersionError::AmountOverflow("adjustment factor"))
    }
}
