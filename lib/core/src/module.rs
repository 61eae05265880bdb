use axum::Router;

/// A service module that contributes HTTP routes.
///
/// Each business module (auth, office) implements this trait to register
/// its API endpoints. The binary entry point collects all modules and
/// merges their routes into a single Router.
pub trait Module: Send + Sync {
    /// Module name, used for logging.
    fn name(&self) -> &str;

    /// Return the module's routes. Paths are absolute (e.g. `/auth/login`).
    fn routes(&self) -> Router;
}
