//! The message model produced by rendering a prompt.
//!
//! Every value a prompt function returns is folded into this shape: a role
//! tag (user or assistant) plus one typed content payload. The model matches
//! the content types a conversational client expects, so rendered messages
//! can be handed to a transport without further conversion.
pub mod content;
pub mod message;
pub mod role;
