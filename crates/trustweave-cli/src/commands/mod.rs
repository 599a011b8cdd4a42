pub mod events;
pub mod init;
pub mod proof;
pub mod register;
pub mod relate;
pub mod reputation;
pub mod status;
