mod classify;
mod dialog;
mod fetch;
mod root;
mod schema;

pub use classify::ClassifyCommand;
pub use dialog::{DialogCommand, DialogSummary};
pub use fetch::FetchCommand;
pub use root::{Cli, Commands};
pub use schema::{SchemaCommand, SchemaFormat, SchemaSubcommand, SchemaTarget};
