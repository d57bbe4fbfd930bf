pub mod api;
pub mod html;
