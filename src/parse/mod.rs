mod lazy_selector;
mod menu_item;
mod post_list;
mod weekly_table;

pub use menu_item::is_menu_item;
pub use post_list::find_post_url;
pub use weekly_table::WeeklyTable;
