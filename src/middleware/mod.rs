/*
 * Responsibility
 * - public interface of the middleware layer
 */
pub mod bearer_auth;
pub mod http;
