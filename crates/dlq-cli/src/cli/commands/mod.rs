//! CLI command handlers. Each command is in its own file.

mod add;
mod apply;
mod bulk;
mod completions;
mod info;
mod item;
mod run;
mod status;

pub use add::{run_add, AddArgs};
pub use bulk::{run_bulk, run_set_concurrency, BulkOp};
pub use completions::run_completions;
pub use info::run_info;
pub use item::{run_item_control, ItemOp};
pub use run::run_scheduler;
pub use status::run_status;
