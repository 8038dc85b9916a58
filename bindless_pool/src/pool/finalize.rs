/// Finalize trait - teardown hook for pooled values

/// Teardown hook run when the last reference to a pooled value goes away
///
/// The pool calls `finalize()` exactly once, when the reference count of the
/// slot reaches zero and before the slot can be handed out again. The value
/// is dropped right after. Types with nothing to tear down opt in with an
/// empty impl; the default body compiles to nothing.
///
/// # Why the empty impl is required
///
/// The hook is optional, but stable Rust has no specialization: a blanket
/// `impl<T> Finalize for T` would forbid any type from overriding it. So
/// every pooled type states `impl Finalize for MyType {}` itself. Primitive
/// types, `String`, `Vec<T>`, `Option<T>` and arrays already have one.
///
/// ```compile_fail
/// use bindless_pool::bpool::ResourcePool;
///
/// #[derive(Default)]
/// struct Plain;
///
/// // `Plain` lacks `impl Finalize for Plain {}`
/// let _pool = ResourcePool::<Plain>::new(4, "plain");
/// ```
///
/// # Example
///
/// ```
/// use bindless_pool::bpool::Finalize;
///
/// #[derive(Default)]
/// struct Staging {
///     mapped: bool,
/// }
///
/// impl Finalize for Staging {
///     fn finalize(&mut self) {
///         self.mapped = false;
///     }
/// }
/// ```
pub trait Finalize {
    /// Release whatever the value holds outside of its own memory
    fn finalize(&mut self) {}
}

/// Everything a pool needs from its element type
///
/// Implemented automatically for any `Default + Finalize + Send + Sync + 'static` type.
pub trait Poolable: Default + Finalize + Send + Sync + 'static {}

impl<T: Default + Finalize + Send + Sync + 'static> Poolable for T {}

macro_rules! impl_noop_finalize {
    ($($ty:ty),* $(,)?) => {
        $(impl Finalize for $ty {})*
    };
}

impl_noop_finalize!(
    (), bool, char,
    u8, u16, u32, u64, u128, usize,
    i8, i16, i32, i64, i128, isize,
    f32, f64,
    String,
);

impl<T> Finalize for Vec<T> {}
impl<T> Finalize for Option<T> {}
impl<T, const N: usize> Finalize for [T; N] {}
