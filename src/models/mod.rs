pub mod reservation;
pub mod window;
