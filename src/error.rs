//! Errors reported by [`crate::DynArray`].

use core::fmt;

use crate::allocator::AllocError;

/// Errors that can occur while building or resizing an array.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArrayError {
    /// The allocator could not provide a new buffer.
    Alloc(AllocError),
    /// The requested capacity does not fit in a `Layout`.
    CapacityOverflow,
    /// Growth factors below 2 could never enlarge the buffer.
    InvalidGrowthFactor(usize),
}

impl fmt::Display for ArrayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Alloc(e) => write!(f, "buffer allocation failed: {e}"),
            Self::CapacityOverflow => f.write_str("capacity overflow"),
            Self::InvalidGrowthFactor(factor) => {
                write!(f, "invalid growth factor {factor}, must be at least 2")
            }
        }
    }
}

impl From<AllocError> for ArrayError {
    fn from(e: AllocError) -> Self {
        Self::Alloc(e)
    }
}

/// A push that failed, handing the value back to the caller.
///
/// For raw handles such as [`crate::Block`] this is the only way to get the
/// handle back and release it.
#[derive(Clone, PartialEq, Eq)]
pub struct PushError<T> {
    value: T,
    error: ArrayError,
}

impl<T> PushError<T> {
    pub(crate) fn new(value: T, error: ArrayError) -> Self {
        Self { value, error }
    }

    pub fn error(&self) -> ArrayError {
        self.error
    }

    /// The value that was not pushed.
    pub fn into_value(self) -> T {
        self.value
    }

    pub fn into_parts(self) -> (T, ArrayError) {
        (self.value, self.error)
    }
}

// no `T: Debug` bound, so `unwrap` works for any element type
impl<T> fmt::Debug for PushError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PushError").field("error", &self.error).finish_non_exhaustive()
    }
}

impl<T> fmt::Display for PushError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "push failed: {}", self.error)
    }
}

impl<T> From<PushError<T>> for ArrayError {
    fn from(e: PushError<T>) -> Self {
        e.error
    }
}

#[cfg(feature = "std")]
impl<T> std::error::Error for PushError<T> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ArrayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Alloc(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(
            ArrayError::Alloc(AllocError).to_string(),
            "buffer allocation failed: memory allocation failed"
        );
        assert_eq!(ArrayError::CapacityOverflow.to_string(), "capacity overflow");
        assert_eq!(
            ArrayError::InvalidGrowthFactor(1).to_string(),
            "invalid growth factor 1, must be at least 2"
        );
    }

    #[test]
    fn push_errors_give_the_value_back() {
        let e = PushError::new(String::from("kept"), ArrayError::CapacityOverflow);
        assert_eq!(e.to_string(), "push failed: capacity overflow");
        assert_eq!(e.error(), ArrayError::CapacityOverflow);
        let (value, error) = e.clone().into_parts();
        assert_eq!(value, "kept");
        assert_eq!(ArrayError::from(e), error);
    }

    #[test]
    fn alloc_errors_convert() {
        let e: ArrayError = AllocError.into();
        assert_eq!(e, ArrayError::Alloc(AllocError));
    }
}
