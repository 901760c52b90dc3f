pub mod get;
pub mod list;
pub mod set;
pub mod unset;

pub use get::get_command;
pub use list::list_command;
pub use set::set_command;
pub use unset::unset_command;
