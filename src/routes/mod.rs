/// Router Module Index
///
/// The HTTP shell's API surface. Page requests are not routed here: they fall through
/// to the guarded page shell (`handlers::serve_page`), where the Route Table decides
/// who may see what.

/// Unauthenticated service endpoints (health, route catalogue).
pub mod public;

/// Navigation decisions for the client-side router.
pub mod navigation;
