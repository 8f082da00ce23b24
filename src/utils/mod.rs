pub mod archive;
pub mod command;
pub mod ftp;
pub mod mail;

// Trait-based abstractions for testability
pub mod archive_ops;
pub mod executor;
pub mod transfer_ops;

// Re-export commonly used types and traits (used by test crate)
pub use archive_ops::{ArchiveProducer, RealArchiver};
pub use executor::{CommandExecutor, RealExecutor};
pub use ftp::FtpClient;
pub use mail::{MailRelay, SmtpRelay};
pub use transfer_ops::{RemoteEntry, Session, TransferClient};
