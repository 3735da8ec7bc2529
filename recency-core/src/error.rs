use thiserror::Error;

/// Errors raised by cache construction.
///
/// `get`/`set` never fail; internal CAS races are retried and never surface.
///
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    #[error("capacity must be a positive number but was {0}")]
    InvalidCapacity(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_capacity_message() {
        let err = CacheError::InvalidCapacity(0);
        assert_eq!(
            err.to_string(),
            "capacity must be a positive number but was 0"
        );
    }
}
