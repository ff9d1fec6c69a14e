pub mod entry_list;
pub mod theme;
pub mod timeline;
pub mod toolbar;
