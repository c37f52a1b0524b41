/// Filesystem catalog whose endpoints are path templates.
pub mod directory;
/// Catalog holding prebuilt entries, loadable from a JSON manifest.
pub mod in_memory;
