pub mod assets;
pub mod defi;
pub mod setup;
pub mod summary;
pub mod transactions;
pub mod transfer;
pub mod ui;
