pub mod bias;
pub mod compare;
pub mod order;
pub mod run_detail;
pub mod runs;
pub mod settings;
pub mod significance;
