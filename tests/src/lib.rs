//! Cross-crate tests: full pipeline runs and range providers over HTTP.

mod pipeline;
mod providers;
