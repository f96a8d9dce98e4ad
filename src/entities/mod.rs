pub mod job_execution;
pub mod menu_in_role;
pub mod menu_item;
pub mod role;

pub use job_execution::Entity as JobExecution;
pub use menu_in_role::Entity as MenuInRole;
pub use menu_item::Entity as MenuItem;
pub use role::Entity as Role;
