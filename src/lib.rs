pub mod api;
pub mod app;
pub mod board;
pub mod config;
pub mod errors;
pub mod models;
pub mod ui;
pub mod view;

pub use api::{ActivityApi, HttpActivityApi};
pub use app::{dispatch, run, BoardEvent};
pub use board::ActivityBoard;
pub use config::BoardConfig;
pub use errors::ClientError;
pub use view::{BoardView, Page};
