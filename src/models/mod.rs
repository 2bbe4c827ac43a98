pub mod booking;
pub mod category;
pub mod ticket;

pub use booking::{BookedTicket, Booking};
pub use category::Category;
pub use ticket::Ticket;
