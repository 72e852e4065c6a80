pub mod status_bar;
pub mod controls;
pub mod canvas;

pub use status_bar::render_status_bar;
pub use controls::render_controls;
pub use canvas::render_canvas;
