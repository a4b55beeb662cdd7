//! Function template catalogues.

mod builtin;

pub use builtin::BuiltinTemplateStore;
