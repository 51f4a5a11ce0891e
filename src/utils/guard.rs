/// A scope guard that runs a cleanup closure when dropped.
///
/// Cleanup runs on every way out of a scope: normal return, early `?`
/// return, and panic unwinding. The launcher uses it to release the
/// foreground slot and reap a child that an error path left behind.
///
/// # Examples
///
/// ```
/// use rusty_exec::utils::guard::Defer;
///
/// let mut cleaned = false;
/// {
///     let _guard = Defer::with(|| cleaned = true);
/// }
/// assert!(cleaned);
/// ```
pub struct Defer<F: FnOnce()> {
    on_exit: Option<F>,
}

impl<F: FnOnce()> Defer<F> {
    /// Create a guard that calls `f` when dropped.
    pub fn with(f: F) -> Self {
        Self { on_exit: Some(f) }
    }
}

impl<F: FnOnce()> Drop for Defer<F> {
    fn drop(&mut self) {
        if let Some(f) = self.on_exit.take() {
            f()
        }
    }
}
