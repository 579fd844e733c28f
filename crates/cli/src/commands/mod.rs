pub mod ask;
pub mod batch;
pub mod chat;
pub mod doctor;
pub mod kb;
pub mod onboard;
