/// Scene graph compiler.
pub mod graph;
