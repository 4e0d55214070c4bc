pub mod catalog;
pub mod chunks;
pub mod circle;
pub mod constants;
pub mod entity;
pub mod nav;
pub mod physics;
pub mod revive;
pub mod world;
