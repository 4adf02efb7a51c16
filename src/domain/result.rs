//! Result type alias for the importer

use super::errors::ImporterError;

/// Result type alias for importer operations
///
/// # Examples
///
/// ```
/// use sfm_importer::domain::result::Result;
/// use sfm_importer::domain::errors::ImporterError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(ImporterError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, ImporterError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::ImporterError;

    #[test]
    fn test_result_err() {
        let result: Result<i32> = Err(ImporterError::Validation("test error".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn test_result_with_question_mark() -> Result<()> {
        fn inner() -> Result<i32> {
            Ok(42)
        }

        let value = inner()?;
        assert_eq!(value, 42);
        Ok(())
    }
}
