//! Domain layer: the plain data describing entries in the virtual tree,
//! independent of how they were produced (host filesystem, archive, overlay).

pub mod stat;

pub use stat::Stat;
