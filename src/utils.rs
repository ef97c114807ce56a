//! # Utility Functions Module
//!
//! Helpers for assembling command lines for the external optimizers.

/// Converts any iterable of string-like items to `Vec<String>`.
///
/// Command lines for the optimizers mix literals, configured flags and file
/// paths; this keeps the `.to_string()` noise out of the binders.
///
/// # Example
/// ```rust
/// use upload_optimizer::utils::to_string_vec;
///
/// let args = to_string_vec(["-b", "-O5", "/tmp/upload.gif"]);
/// assert_eq!(args.len(), 3);
/// ```
pub fn to_string_vec<T, I>(items: I) -> Vec<String>
where
    T: ToString,
    I: IntoIterator<Item = T>,
{
    items.into_iter().map(|item| item.to_string()).collect()
}

/// Builds a tool argument vector from string literals.
///
/// # Example
/// ```rust
/// use upload_optimizer::args;
///
/// let args = args!["-z", "-4", "-q"];
/// assert_eq!(args, vec!["-z", "-4", "-q"]);
/// ```
#[macro_export]
macro_rules! args {
    [$($item:expr),* $(,)?] => {
        $crate::utils::to_string_vec([$($item),*])
    };
}

/// Joins configured flags with trailing positional arguments.
pub fn with_trailing<S: AsRef<str>>(options: &[String], trailing: &[S]) -> Vec<String> {
    options
        .iter()
        .cloned()
        .chain(trailing.iter().map(|s| s.as_ref().to_string()))
        .collect()
}
