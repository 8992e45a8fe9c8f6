pub mod ports;
pub mod process_use_case;
pub mod check_use_case;
