/*
[INPUT]:  Kraken public WebSocket schema and serde requirements
[OUTPUT]: Typed Rust structs/enums with serialization support
[POS]:    Data layer - type definitions for feed communication
[UPDATE]: When feed schema changes or new types added
*/

pub mod channel;
pub mod enums;
pub mod models;
pub mod requests;
pub mod responses;

pub use channel::*;
pub use enums::*;
pub use models::*;
pub use requests::*;
pub use responses::*;
