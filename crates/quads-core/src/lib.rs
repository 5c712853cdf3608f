#![deny(warnings)]
pub mod game;
pub mod model;
pub mod pack;

pub struct AppInfo;

impl AppInfo {
    pub const fn name() -> &'static str {
        "quads"
    }

    pub const fn codename() -> &'static str {
        "Ring Table"
    }

    pub const fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }
}
