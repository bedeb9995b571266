//! Result type alias
//!
//! Convenience alias that uses [`AnonError`] as the error type.

use super::errors::AnonError;

/// Result type alias for anonymization operations
///
/// # Examples
///
/// ```
/// use clinanon::domain::result::Result;
/// use clinanon::domain::errors::AnonError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(AnonError::EmptyInput)
/// }
/// ```
pub type Result<T> = std::result::Result<T, AnonError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_with_question_mark() -> Result<()> {
        fn inner() -> Result<i32> {
            Ok(42)
        }

        let value = inner()?;
        assert_eq!(value, 42);
        Ok(())
    }

    #[test]
    fn test_result_err() {
        let result: Result<i32> = Err(AnonError::EmptyInput);
        assert!(result.is_err());
    }
}
