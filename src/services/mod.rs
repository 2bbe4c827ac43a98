pub mod booking;
pub mod ticket;

pub use booking::BookingService;
pub use ticket::TicketService;
