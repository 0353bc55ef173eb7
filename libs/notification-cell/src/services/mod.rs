pub mod notify;

pub use notify::NotificationService;
