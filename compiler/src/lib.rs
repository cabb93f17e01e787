// sgc — Signal Graph Compiler
//
// Library root. An expression graph over audio-rate signals (constants,
// arithmetic, function calls, counted loops, one-sample delays) is lowered
// in a single pass to a C++ per-sample processing routine.

pub mod codegen;
pub mod dot;
pub mod graph;
pub mod layout;
pub mod names;
