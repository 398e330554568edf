//! Query parameters for restricting listings and reports to a date range.

use std::ops::RangeInclusive;

use serde::Deserialize;
use time::Date;

use crate::Error;

/// The optional `from` and `to` query parameters, both inclusive.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DateRangeQuery {
    /// The earliest date to include.
    pub from: Option<Date>,
    /// The latest date to include.
    pub to: Option<Date>,
}

impl DateRangeQuery {
    /// Convert the query into a date range.
    ///
    /// Returns `None` when neither bound is given. A missing bound is left
    /// open by using the earliest or latest supported date.
    ///
    /// # Errors
    /// Returns [Error::InvalidArgument] if `from` is after `to`.
    pub fn into_range(self) -> Result<Option<RangeInclusive<Date>>, Error> {
        match (self.from, self.to) {
            (None, None) => Ok(None),
            (Some(from), Some(to)) if from > to => Err(Error::InvalidArgument(format!(
                "the start date {from} is after the end date {to}"
            ))),
            (from, to) => Ok(Some(
                from.unwrap_or(Date::MIN)..=to.unwrap_or(Date::MAX),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use time::{Date, macros::date};

    use super::DateRangeQuery;
    use crate::Error;

    #[test]
    fn no_bounds_is_no_range() {
        assert_eq!(DateRangeQuery::default().into_range(), Ok(None));
    }

    #[test]
    fn missing_bound_is_open() {
        let query = DateRangeQuery {
            from: Some(date!(2024 - 02 - 01)),
            to: None,
        };

        assert_eq!(
            query.into_range(),
            Ok(Some(date!(2024 - 02 - 01)..=Date::MAX))
        );
    }

    #[test]
    fn reversed_bounds_are_rejected() {
        let query = DateRangeQuery {
            from: Some(date!(2024 - 03 - 01)),
            to: Some(date!(2024 - 02 - 01)),
        };

        assert!(matches!(query.into_range(), Err(Error::InvalidArgument(_))));
    }
}
