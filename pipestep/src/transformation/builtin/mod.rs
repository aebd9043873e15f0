//! Builtin transformations

mod identity;
mod union_tables;

pub use identity::IdentityTransformation;
pub use union_tables::UnionTablesTransformation;
