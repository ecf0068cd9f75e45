/*!
 * Authentication context extractor
 *
 * Responsibility:
 * - hand the verified claims (AuthCtx) to handlers
 * - axum-specific code lives in extractor, the type itself in types
 *
 * Public API:
 * - AuthCtx
 * - AuthCtxExtractor
 */

mod extractor;
mod types;

pub use extractor::AuthCtxExtractor;
pub use types::AuthCtx;
