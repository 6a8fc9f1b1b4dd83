//! Logging initialization per target
//!
//! Everything in the crate logs through the `log` facade. Native binaries
//! route to `env_logger`; the wasm32 build routes to the browser console.

/// Initialize logging for the current target. Safe to call more than once.
pub fn init() {
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = env_logger::Builder::from_default_env().try_init();
    }

    #[cfg(target_arch = "wasm32")]
    {
        console_error_panic_hook::set_once();
        let _ = console_log::init_with_level(log::Level::Info);
    }
}
