// Resume editor core.
// Pure reducers over an immutable Document; the session is the only writer and
// both views are projected from its current snapshot.

pub mod document;
pub mod drag;
pub mod handlers;
pub mod ordering;
pub mod reducer;
pub mod session;
pub mod templates;
pub mod views;
