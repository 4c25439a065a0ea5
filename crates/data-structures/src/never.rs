/// Hack to access the never type on stable.
#[doc(hidden)]
#[allow(unnameable_types)]
pub trait GetReturnType {
    type ReturnType;
}

#[doc(hidden)]
impl<T> GetReturnType for fn() -> T {
    type ReturnType = T;
}

/// The [`!` (never)](primitive@never) type.
///
/// Used as the break value of traversals that always run to completion.
pub type Never = <fn() -> ! as GetReturnType>::ReturnType;
