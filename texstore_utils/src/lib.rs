use std::fmt::Debug;

#[doc(hidden)]
pub use tracing;

/// A fixed-order enumeration whose variants map 1:1 onto the indices `0..COUNT`.
///
/// Usually derived with `texstore_macros::OrderedIndex`.
pub trait OrderedIndex: Debug + Copy + Sized + 'static {
    const COUNT: usize;
    const ALL: &'static [Self];

    fn index(&self) -> usize;
    fn by_index(index: usize) -> Option<Self>;
    fn name() -> &'static str;
}

/// Panics in debug builds, logs an error in release builds.
///
/// Used for states that indicate a desync between bookkeeping and the context,
/// which shouldn't take down a release build.
#[macro_export]
macro_rules! debug_panic {
    ($($arg:tt)*) => {{
        #[cfg(debug_assertions)]
        {
            panic!($($arg)*);
        }
        #[cfg(not(debug_assertions))]
        {
            $crate::tracing::error!($($arg)*);
        }
    }};
}
