pub mod jinja_renderer;
