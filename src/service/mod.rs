pub mod appspace_service;
pub mod booking_flow;
pub mod checkin_service;
pub mod conflict;
pub mod lock_service;
pub mod reservation_service;
pub mod token_service;
