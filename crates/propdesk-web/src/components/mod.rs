//! Reusable UI components

pub mod action_menu;
pub mod flash_banner;
pub mod layout;
pub mod listing_table;
pub mod loading;
pub mod modals;
pub mod pagination;
pub mod status_badge;
