//! Pipeline tests over in-process service doubles.

mod pipeline;
