// Storage: the on-disk line format for universal records

pub mod jsonl;

pub use jsonl::{decode_line, encode_line, file_name, MAX_BATCH_NUMBER};
