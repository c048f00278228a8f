pub mod email_sender;
