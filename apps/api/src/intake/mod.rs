// Resume intake: upload gate, primary + fallback extraction, static merge.
// The pipeline never fails because a single extractor failed — only the gate
// and an all-sources-empty run are terminal.

pub mod extractor;
pub mod fallback;
pub mod fields;
pub mod handlers;
pub mod merge;
pub mod pipeline;
pub mod validation;
