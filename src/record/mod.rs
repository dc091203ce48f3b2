// AmberDB Record Module
//
// Fixed-size record slots laid out according to a table schema.

pub mod error;
pub mod layout;
pub mod record_page;
pub mod rid;
pub mod schema;

pub use error::RecordError;
pub use layout::Layout;
pub use record_page::RecordPage;
pub use rid::Rid;
pub use schema::{FieldType, Schema};
