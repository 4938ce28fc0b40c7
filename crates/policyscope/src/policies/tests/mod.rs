mod analyzer;
mod common;
mod status;
