//! HTTP handlers for plotbench

pub mod health;
pub mod home;
pub mod pages;
pub mod plots;
pub mod results;

pub use health::health_routes;
pub use home::{home_page, home_submit};
pub use plots::{plot1, plot2};
pub use results::{data_page, data_submit, results_page, results_submit};
