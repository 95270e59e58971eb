pub mod blur_engine;
pub mod elapsed_ticker;
pub mod run_logger;
