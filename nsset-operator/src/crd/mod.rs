pub mod namespace_set;
