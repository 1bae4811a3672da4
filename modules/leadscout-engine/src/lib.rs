pub mod classifier;
pub mod discovery;
pub mod geography;
pub mod providers;
pub mod queries;
pub mod run_log;
pub mod score_run;
pub mod scoring;
pub mod selection;
pub mod signals;
