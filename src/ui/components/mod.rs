pub mod app;
pub mod controls;
pub mod mini_player;
pub mod player;
pub mod progress;
pub mod spinner;
