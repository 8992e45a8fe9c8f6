pub mod jsonl_output_adapter;
pub mod raw_input_adapter;
pub mod rejection_report_adapter;
