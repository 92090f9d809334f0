pub mod coordinate;
pub mod location;
pub mod session;
pub mod status;
pub mod update;
pub mod view;
