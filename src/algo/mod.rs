pub mod advisory;
pub mod cache;
pub mod dedup;
pub mod highlight;
pub mod keywords;
pub mod matcher;
pub mod overlap;
pub mod scoring;
pub mod search;
pub mod tokenizer;
