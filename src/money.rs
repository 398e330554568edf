//! Helpers for validating monetary amounts and storing them in SQLite.
//!
//! Amounts are [Decimal]s. SQLite has no decimal type, so amounts are stored as
//! TEXT in their canonical string form and parsed back when a row is mapped.
//!
//! Every amount that is stored or used as a limit is at most [MAX_AMOUNT], and
//! arithmetic over amounts goes through the checked helpers here so that
//! overflow is reported as an error instead of a panic.

use std::str::FromStr;

use rusqlite::{Row, types::Type};
use rust_decimal::Decimal;

use crate::Error;

/// The largest amount accepted anywhere: one quadrillion.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0xA4C6_8000, 0x0003_8D7E, 0, false, 0);

/// Reject negative amounts and amounts above [MAX_AMOUNT].
///
/// `field` names the argument in the error message.
///
/// # Errors
/// Returns [Error::InvalidArgument] if `amount` is less than zero or too large.
pub fn require_non_negative(amount: Decimal, field: &str) -> Result<Decimal, Error> {
    if amount < Decimal::ZERO {
        return Err(Error::InvalidArgument(format!(
            "{field} must not be negative, got {amount}"
        )));
    }

    require_at_most_max(amount, field)
}

/// Reject zero, negative amounts and amounts above [MAX_AMOUNT].
///
/// # Errors
/// Returns [Error::InvalidArgument] if `amount` is not greater than zero or too large.
pub fn require_positive(amount: Decimal, field: &str) -> Result<Decimal, Error> {
    if amount <= Decimal::ZERO {
        return Err(Error::InvalidArgument(format!(
            "{field} must be greater than zero, got {amount}"
        )));
    }

    require_at_most_max(amount, field)
}

fn require_at_most_max(amount: Decimal, field: &str) -> Result<Decimal, Error> {
    if amount > MAX_AMOUNT {
        return Err(Error::InvalidArgument(format!(
            "{field} must not be more than {MAX_AMOUNT}, got {amount}"
        )));
    }

    Ok(amount)
}

/// `a + b`.
///
/// # Errors
/// Returns [Error::InvalidArgument] if the result does not fit in a [Decimal].
pub fn checked_add(a: Decimal, b: Decimal) -> Result<Decimal, Error> {
    a.checked_add(b).ok_or_else(overflow_error)
}

/// `a - b`.
///
/// # Errors
/// Returns [Error::InvalidArgument] if the result does not fit in a [Decimal].
pub fn checked_sub(a: Decimal, b: Decimal) -> Result<Decimal, Error> {
    a.checked_sub(b).ok_or_else(overflow_error)
}

/// The sum of `amounts`, zero if there are none.
///
/// # Errors
/// Returns [Error::InvalidArgument] if the total does not fit in a [Decimal].
pub fn checked_sum(amounts: impl IntoIterator<Item = Decimal>) -> Result<Decimal, Error> {
    amounts
        .into_iter()
        .try_fold(Decimal::ZERO, |total, amount| checked_add(total, amount))
}

fn overflow_error() -> Error {
    Error::InvalidArgument("the amounts are too large to calculate with".to_owned())
}

/// Reject names that are empty or only whitespace, returning the trimmed name.
///
/// # Errors
/// Returns [Error::InvalidArgument] if `name` is blank.
pub fn require_name(name: &str, field: &str) -> Result<String, Error> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(Error::InvalidArgument(format!("{field} cannot be empty")));
    }

    Ok(trimmed.to_owned())
}

/// Read a decimal amount stored as TEXT from column `index` of `row`.
pub fn get_decimal(row: &Row, index: usize) -> Result<Decimal, rusqlite::Error> {
    let raw: String = row.get(index)?;

    Decimal::from_str(&raw)
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(error)))
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use super::{
        MAX_AMOUNT, checked_add, checked_sub, checked_sum, get_decimal, require_name,
        require_non_negative, require_positive,
    };
    use crate::Error;

    #[test]
    fn zero_is_non_negative() {
        assert_eq!(require_non_negative(dec!(0), "limit"), Ok(Decimal::ZERO));
    }

    #[test]
    fn negative_amount_is_rejected() {
        assert!(matches!(
            require_non_negative(dec!(-0.01), "limit"),
            Err(Error::InvalidArgument(message)) if message.contains("limit")
        ));
    }

    #[test]
    fn zero_is_not_positive() {
        assert!(matches!(
            require_positive(dec!(0), "amount"),
            Err(Error::InvalidArgument(_))
        ));
        assert_eq!(require_positive(dec!(0.01), "amount"), Ok(dec!(0.01)));
    }

    #[test]
    fn max_amount_is_one_quadrillion() {
        assert_eq!(MAX_AMOUNT, dec!(1000000000000000));
    }

    #[test]
    fn amounts_above_the_maximum_are_rejected() {
        assert_eq!(require_non_negative(MAX_AMOUNT, "limit"), Ok(MAX_AMOUNT));
        assert!(matches!(
            require_non_negative(MAX_AMOUNT + dec!(0.01), "limit"),
            Err(Error::InvalidArgument(message)) if message.contains("limit")
        ));
        assert!(matches!(
            require_positive(Decimal::MAX, "amount"),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn overflowing_arithmetic_is_an_error() {
        assert!(matches!(
            checked_add(Decimal::MAX, dec!(1)),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            checked_sub(Decimal::MIN, dec!(1)),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            checked_sum([Decimal::MAX, Decimal::MAX]),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn checked_sum_adds_up() {
        assert_eq!(checked_sum([dec!(1.5), dec!(2.25)]), Ok(dec!(3.75)));
        assert_eq!(checked_sum(Vec::<Decimal>::new()), Ok(Decimal::ZERO));
    }

    #[test]
    fn blank_names_are_rejected() {
        assert!(matches!(
            require_name("   ", "category"),
            Err(Error::InvalidArgument(_))
        ));
        assert_eq!(require_name(" Food ", "category"), Ok("Food".to_owned()));
    }

    #[test]
    fn decimal_text_round_trips_through_sqlite() {
        let connection = Connection::open_in_memory().unwrap();

        let amount = connection
            .query_row("SELECT ?1", [dec!(1234.56).to_string()], |row| {
                get_decimal(row, 0)
            })
            .unwrap();

        assert_eq!(amount, dec!(1234.56));
    }

    #[test]
    fn garbage_text_is_a_conversion_error() {
        let connection = Connection::open_in_memory().unwrap();

        let result = connection.query_row("SELECT 'lots'", [], |row| get_decimal(row, 0));

        assert!(matches!(
            result,
            Err(rusqlite::Error::FromSqlConversionFailure(0, _, _))
        ));
    }
}
