pub mod index;
pub mod tree;
pub mod types;

pub use index::{validate_menu_forest, MenuIndex, NamedRoles};
pub use tree::{active_item, flatten};
pub use types::{Breadcrumb, MenuItem, MenuLink, MenuNode, Navigation, Overrides, Role, Snapshot};
