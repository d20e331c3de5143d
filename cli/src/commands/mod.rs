mod favorites;
mod helpers;
mod kitchen;

pub(crate) use favorites::{cmd_favorites_add, cmd_favorites_list, cmd_favorites_remove};
pub(crate) use kitchen::{cmd_ask, cmd_recipe, cmd_scan, cmd_search};
