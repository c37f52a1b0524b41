/// Path-template compilation and matching.
pub mod template;
