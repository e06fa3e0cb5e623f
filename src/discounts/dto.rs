use serde::Deserialize;

use crate::{
    error::{AppError, AppResult},
    store::{effective_limit, DiscountFilter, DiscountInput},
};

#[derive(Debug, Default, Deserialize)]
pub struct DiscountQuery {
    pub active: Option<bool>,
    pub limit: Option<i64>,
}

impl From<DiscountQuery> for DiscountFilter {
    fn from(q: DiscountQuery) -> Self {
        DiscountFilter {
            active: q.active,
            limit: effective_limit(q.limit),
        }
    }
}

pub fn validate(input: &DiscountInput) -> AppResult<()> {
    if !(0..=100).contains(&input.percentage) {
        return Err(AppError::validation("Percentage must be between 0 and 100"));
    }
    if input.start_date > input.end_date {
        return Err(AppError::validation("start_date must not be after end_date"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn input(percentage: i32) -> DiscountInput {
        DiscountInput {
            percentage,
            start_date: datetime!(2026-01-01 00:00 UTC),
            end_date: datetime!(2026-02-01 00:00 UTC),
            active: true,
        }
    }

    #[test]
    fn percentage_bounds_are_inclusive() {
        assert!(validate(&input(0)).is_ok());
        assert!(validate(&input(100)).is_ok());
        assert!(validate(&input(-1)).is_err());
        assert!(validate(&input(101)).is_err());
    }

    #[test]
    fn rejects_inverted_window() {
        let mut d = input(10);
        std::mem::swap(&mut d.start_date, &mut d.end_date);
        assert!(validate(&d).is_err());
    }

    #[test]
    fn active_defaults_to_true_when_omitted() {
        let d: DiscountInput = serde_json::from_str(
            r#"{"percentage": 15, "start_date": "2026-01-01T00:00:00Z", "end_date": "2026-01-31T00:00:00Z"}"#,
        )
        .unwrap();
        assert!(d.active);
    }
}
